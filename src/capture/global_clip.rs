//! Global clip plane strategies.
//!
//! Both methods hand the renderer an analytic clip plane derived from
//! the clip plane transform: the foreground capture simply does not
//! render anything behind the plane. No depth comparison is involved;
//! the cost is a second full scene render instead of a depth-only one.

use super::{CaptureHost, CaptureRig, CaptureStrategy};
use crate::error::CaptureError;
use crate::gpu::targets::{output_descriptor, post_process_descriptor, scene_color_descriptor};
use crate::gpu::{FullScreenPass, GpuBackend, PassList, PixelStage};
use crate::scene::CaptureSource;
use crate::settings::CaptureMethod;

const BACKGROUND_SCENE: &str = "background scene color";
const FOREGROUND_SCENE: &str = "foreground scene color";
const OPACITY_MASK: &str = "foreground inverse opacity";
const FOREGROUND_OUTPUT: &str = "foreground output";

/// Analytic clipping on HDR scene color.
///
/// The foreground capture carries inverse opacity in alpha; one
/// InvertAlpha pass turns it into the compositor's convention. The
/// background capture is submitted as rendered.
pub struct GlobalClipNoPostProcess {
    rig: CaptureRig,
}

impl GlobalClipNoPostProcess {
    pub fn new() -> Self {
        Self {
            rig: CaptureRig::new(),
        }
    }
}

impl Default for GlobalClipNoPostProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureStrategy for GlobalClipNoPostProcess {
    fn method(&self) -> CaptureMethod {
        CaptureMethod::GlobalClipNoPostProcess
    }

    fn rig(&self) -> &CaptureRig {
        &self.rig
    }

    fn rig_mut(&mut self) -> &mut CaptureRig {
        &mut self.rig
    }

    fn create_targets(
        &mut self,
        gpu: &dyn GpuBackend,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError> {
        self.rig
            .add_target(gpu, BACKGROUND_SCENE, scene_color_descriptor(BACKGROUND_SCENE, width, height))?;
        self.rig
            .add_target(gpu, FOREGROUND_SCENE, scene_color_descriptor(FOREGROUND_SCENE, width, height))?;
        self.rig
            .add_target(gpu, FOREGROUND_OUTPUT, output_descriptor(FOREGROUND_OUTPUT, width, height))
    }

    fn render(&mut self, host: &mut CaptureHost<'_>) -> Result<(), CaptureError> {
        let background = self.rig.request(
            CaptureSource::SceneColorHdrNoAlpha,
            BACKGROUND_SCENE,
            host.settings,
            host.context,
        )?;
        host.scene.capture(&background)?;

        let mut foreground = self.rig.request(
            CaptureSource::SceneColorHdr,
            FOREGROUND_SCENE,
            host.settings,
            host.context,
        )?;
        foreground.global_clip_plane = Some(self.rig.clip_plane().analytic());
        host.scene.capture(&foreground)?;

        let mut passes = PassList::new();
        passes.push(
            FullScreenPass::new(PixelStage::InvertAlpha)
                .with_input(self.rig.target(FOREGROUND_SCENE)?)
                .with_output(self.rig.target(FOREGROUND_OUTPUT)?),
        );
        host.gpu.execute(&passes)?;

        self.rig.submit_outputs(
            host.gpu,
            host.bridge,
            host.settings,
            FOREGROUND_OUTPUT,
            BACKGROUND_SCENE,
        )
    }
}

/// Analytic clipping on post-processed color.
///
/// Tonemapped output has no usable alpha, so opacity comes from a third
/// capture of HDR scene color with the clip plane on; CombineAlpha
/// merges it into the foreground color.
pub struct GlobalClipPostProcess {
    rig: CaptureRig,
}

impl GlobalClipPostProcess {
    pub fn new() -> Self {
        Self {
            rig: CaptureRig::new(),
        }
    }
}

impl Default for GlobalClipPostProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureStrategy for GlobalClipPostProcess {
    fn method(&self) -> CaptureMethod {
        CaptureMethod::GlobalClipPostProcess
    }

    fn rig(&self) -> &CaptureRig {
        &self.rig
    }

    fn rig_mut(&mut self) -> &mut CaptureRig {
        &mut self.rig
    }

    fn create_targets(
        &mut self,
        gpu: &dyn GpuBackend,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError> {
        self.rig
            .add_target(gpu, BACKGROUND_SCENE, post_process_descriptor(BACKGROUND_SCENE, width, height))?;
        self.rig
            .add_target(gpu, FOREGROUND_SCENE, post_process_descriptor(FOREGROUND_SCENE, width, height))?;
        self.rig
            .add_target(gpu, OPACITY_MASK, scene_color_descriptor(OPACITY_MASK, width, height))?;
        self.rig
            .add_target(gpu, FOREGROUND_OUTPUT, output_descriptor(FOREGROUND_OUTPUT, width, height))
    }

    fn render(&mut self, host: &mut CaptureHost<'_>) -> Result<(), CaptureError> {
        let background = self.rig.request(
            CaptureSource::FinalColorLdr,
            BACKGROUND_SCENE,
            host.settings,
            host.context,
        )?;
        host.scene.capture(&background)?;

        let clip = self.rig.clip_plane().analytic();

        let mut foreground = self.rig.request(
            CaptureSource::FinalColorLdr,
            FOREGROUND_SCENE,
            host.settings,
            host.context,
        )?;
        foreground.global_clip_plane = Some(clip);
        host.scene.capture(&foreground)?;

        let mut mask = self.rig.request(
            CaptureSource::SceneColorHdr,
            OPACITY_MASK,
            host.settings,
            host.context,
        )?;
        mask.global_clip_plane = Some(clip);
        host.scene.capture(&mask)?;

        let mut passes = PassList::new();
        passes.push(
            FullScreenPass::new(PixelStage::CombineAlpha)
                .with_input(self.rig.target(FOREGROUND_SCENE)?)
                .with_input(self.rig.target(OPACITY_MASK)?)
                .with_output(self.rig.target(FOREGROUND_OUTPUT)?),
        );
        host.gpu.execute(&passes)?;

        self.rig.submit_outputs(
            host.gpu,
            host.bridge,
            host.settings,
            FOREGROUND_OUTPUT,
            BACKGROUND_SCENE,
        )
    }
}
