//! Render targets for the capture pipeline.
//!
//! A [`RenderTarget`] couples a backend texture with the descriptor it
//! was created from. Descriptor helpers cover the roles the capture
//! strategies allocate: compositor outputs, depth-only captures, HDR
//! scene color and post-processed scene color.

use super::types::{TextureDescriptor, TextureFormat, TextureHandle, TextureUsage};
use super::GpuBackend;
use crate::error::CaptureError;

/// A texture plus its creation descriptor.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    handle: TextureHandle,
    desc: TextureDescriptor,
}

impl RenderTarget {
    /// Allocate a target on the backend.
    pub fn create(gpu: &dyn GpuBackend, desc: TextureDescriptor) -> Result<Self, CaptureError> {
        let handle = gpu.create_texture(&desc)?;
        Ok(Self { handle, desc })
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn format(&self) -> TextureFormat {
        self.desc.format
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    /// Free the backing texture.
    pub fn release(self, gpu: &dyn GpuBackend) {
        gpu.destroy_texture(self.handle);
    }
}

/// Named group of render targets sized to one frame.
///
/// Strategies allocate their whole working set through one of these.
/// The set is valid for a single output dimension; when the compositor
/// changes dimensions the set is released and rebuilt from scratch.
#[derive(Debug, Default)]
pub struct RenderTargetSet {
    width: u32,
    height: u32,
    targets: Vec<(&'static str, RenderTarget)>,
}

impl RenderTargetSet {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            targets: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the set matches the frame dimensions.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    /// Allocate a target under `name`. Names must be unique per set.
    pub fn insert(
        &mut self,
        gpu: &dyn GpuBackend,
        name: &'static str,
        desc: TextureDescriptor,
    ) -> Result<(), CaptureError> {
        if self.targets.iter().any(|(n, _)| *n == name) {
            return Err(CaptureError::InvalidParameter(format!(
                "duplicate render target name {name:?}"
            )));
        }
        let target = RenderTarget::create(gpu, desc)?;
        self.targets.push((name, target));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RenderTarget> {
        self.targets
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| t)
    }

    /// Handle lookup that reports the missing name on failure.
    pub fn handle(&self, name: &'static str) -> Result<TextureHandle, CaptureError> {
        self.get(name)
            .map(RenderTarget::handle)
            .ok_or(CaptureError::MissingTarget(name))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Free every target in the set.
    pub fn release(&mut self, gpu: &dyn GpuBackend) {
        for (name, target) in self.targets.drain(..) {
            log::trace!("release render target {name}");
            gpu.destroy_texture(target.handle());
        }
    }
}

/// Descriptor for a texture handed to the compositor.
pub fn output_descriptor(label: &str, width: u32, height: u32) -> TextureDescriptor {
    TextureDescriptor::new(width, height)
        .with_label(label)
        .with_format(TextureFormat::Rgba8UnormSrgb)
        .with_usage(TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED | TextureUsage::SHARED)
}

/// Descriptor for a depth-only scene capture.
pub fn depth_descriptor(label: &str, width: u32, height: u32) -> TextureDescriptor {
    TextureDescriptor::new(width, height)
        .with_label(label)
        .with_format(TextureFormat::R16Float)
        .with_usage(TextureUsage::CAPTURE_TARGET | TextureUsage::SAMPLED)
}

/// Descriptor for an HDR scene color capture.
pub fn scene_color_descriptor(label: &str, width: u32, height: u32) -> TextureDescriptor {
    TextureDescriptor::new(width, height)
        .with_label(label)
        .with_format(TextureFormat::Rgba16Float)
        .with_usage(TextureUsage::CAPTURE_TARGET | TextureUsage::SAMPLED)
}

/// Descriptor for a post-processed scene color capture.
pub fn post_process_descriptor(label: &str, width: u32, height: u32) -> TextureDescriptor {
    TextureDescriptor::new(width, height)
        .with_label(label)
        .with_format(TextureFormat::Rgba8UnormSrgb)
        .with_usage(TextureUsage::CAPTURE_TARGET | TextureUsage::SAMPLED)
}
