//! Software reference backend.
//!
//! Executes the compositing stages per pixel on the CPU. Textures are
//! stored as `[f32; 4]` arrays regardless of format; single-channel
//! formats use the first component. The backend exists for tests and
//! for validating stage semantics without a GPU device.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::pass::{FullScreenPass, PassList, PixelStage};
use super::types::{TextureDescriptor, TextureHandle};
use crate::error::CaptureError;

/// One texel, RGBA order.
pub type Pixel = [f32; 4];

struct TextureData {
    desc: TextureDescriptor,
    pixels: Vec<Pixel>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    textures: HashMap<u64, TextureData>,
    flushes: usize,
}

/// CPU implementation of [`super::GpuBackend`].
#[derive(Default)]
pub struct CpuBackend {
    inner: Mutex<Inner>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a texture's contents. Pixel count must match the
    /// texture's dimensions.
    pub fn write_pixels(
        &self,
        handle: TextureHandle,
        pixels: Vec<Pixel>,
    ) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        let data = inner
            .textures
            .get_mut(&handle.0)
            .ok_or(CaptureError::MissingTarget("texture"))?;
        if pixels.len() != data.desc.texel_count() {
            return Err(CaptureError::InvalidParameter(format!(
                "pixel count {} does not match {}x{}",
                pixels.len(),
                data.desc.width,
                data.desc.height
            )));
        }
        data.pixels = pixels;
        Ok(())
    }

    /// Fill a texture with a single value.
    pub fn fill(&self, handle: TextureHandle, value: Pixel) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        let data = inner
            .textures
            .get_mut(&handle.0)
            .ok_or(CaptureError::MissingTarget("texture"))?;
        data.pixels.fill(value);
        Ok(())
    }

    /// Copy a texture's contents out.
    pub fn read_pixels(&self, handle: TextureHandle) -> Result<Vec<Pixel>, CaptureError> {
        let inner = self.inner.lock();
        inner
            .textures
            .get(&handle.0)
            .map(|data| data.pixels.clone())
            .ok_or(CaptureError::MissingTarget("texture"))
    }

    /// Texture contents as raw bytes, little-endian f32 components.
    pub fn read_bytes(&self, handle: TextureHandle) -> Result<Vec<u8>, CaptureError> {
        let pixels = self.read_pixels(handle)?;
        Ok(bytemuck::cast_slice(&pixels).to_vec())
    }

    /// Number of `flush` calls so far.
    pub fn flush_count(&self) -> usize {
        self.inner.lock().flushes
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        self.inner.lock().textures.len()
    }

    fn run_pass(inner: &mut Inner, pass: &FullScreenPass) -> Result<(), CaptureError> {
        if !pass.is_complete() {
            return Err(CaptureError::InvalidParameter(format!(
                "pass arity mismatch for {:?}",
                pass.stage
            )));
        }

        let mut inputs = Vec::with_capacity(pass.inputs.len());
        let mut texel_count = None;
        for handle in &pass.inputs {
            let data = inner
                .textures
                .get(&handle.0)
                .ok_or(CaptureError::MissingTarget("pass input"))?;
            if *texel_count.get_or_insert(data.pixels.len()) != data.pixels.len() {
                return Err(CaptureError::InvalidParameter(
                    "pass inputs have mismatched dimensions".into(),
                ));
            }
            inputs.push(data.pixels.clone());
        }
        let texel_count = texel_count.unwrap_or(0);

        let mut outputs: Vec<Vec<Pixel>> = (0..pass.outputs.len())
            .map(|_| vec![[0.0; 4]; texel_count])
            .collect();

        for i in 0..texel_count {
            match pass.stage {
                PixelStage::InvertAlpha => {
                    let src = inputs[0][i];
                    outputs[0][i] = [src[0], src[1], src[2], 1.0 - src[3]];
                }
                PixelStage::CombineAlpha => {
                    let color = inputs[0][i];
                    let mask = inputs[1][i];
                    outputs[0][i] = [color[0], color[1], color[2], 1.0 - mask[3]];
                }
                PixelStage::ForegroundSegmentation => {
                    let scene = inputs[0][i];
                    let occluded_depth = inputs[1][i][0];
                    // Exact comparison: both depths come from captures
                    // of the same geometry in the same tick.
                    outputs[0][i] = if scene[3] == occluded_depth {
                        [scene[0], scene[1], scene[2], 1.0]
                    } else {
                        [0.0, 0.0, 0.0, 0.0]
                    };
                    outputs[1][i] = [scene[0], scene[1], scene[2], 1.0];
                }
                PixelStage::ForegroundSegmentationPostProcessed => {
                    let color = inputs[0][i];
                    let depth = inputs[1][i][0];
                    let occluded_depth = inputs[2][i][0];
                    outputs[0][i] = if depth == occluded_depth {
                        [color[0], color[1], color[2], 1.0]
                    } else {
                        [0.0, 0.0, 0.0, 0.0]
                    };
                    outputs[1][i] = [color[0], color[1], color[2], 1.0];
                }
            }
        }

        for (handle, pixels) in pass.outputs.iter().zip(outputs) {
            let data = inner
                .textures
                .get_mut(&handle.0)
                .ok_or(CaptureError::MissingTarget("pass output"))?;
            if data.pixels.len() != pixels.len() {
                return Err(CaptureError::InvalidParameter(
                    "pass output has mismatched dimensions".into(),
                ));
            }
            data.pixels = pixels;
        }
        Ok(())
    }
}

impl super::GpuBackend for CpuBackend {
    fn create_texture(&self, desc: &TextureDescriptor) -> Result<TextureHandle, CaptureError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(CaptureError::ResourceCreation(format!(
                "zero-sized texture {}x{}",
                desc.width, desc.height
            )));
        }
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        log::trace!(
            "create texture {} ({}x{}, {:?})",
            id,
            desc.width,
            desc.height,
            desc.format
        );
        inner.textures.insert(
            id,
            TextureData {
                desc: desc.clone(),
                pixels: vec![[0.0; 4]; desc.texel_count()],
            },
        );
        Ok(TextureHandle(id))
    }

    fn destroy_texture(&self, handle: TextureHandle) {
        self.inner.lock().textures.remove(&handle.0);
    }

    fn texture_descriptor(&self, handle: TextureHandle) -> Option<TextureDescriptor> {
        self.inner
            .lock()
            .textures
            .get(&handle.0)
            .map(|data| data.desc.clone())
    }

    fn native_handle(&self, handle: TextureHandle) -> Option<u64> {
        self.inner
            .lock()
            .textures
            .contains_key(&handle.0)
            .then_some(handle.0)
    }

    fn execute(&self, passes: &PassList) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        for pass in passes.iter() {
            Self::run_pass(&mut inner, pass)?;
        }
        Ok(())
    }

    fn flush(&self) {
        self.inner.lock().flushes += 1;
    }
}
