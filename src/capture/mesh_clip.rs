//! Mesh clip plane strategies.
//!
//! Both methods place the clip plane quad in the world as a depth
//! occluder and split foreground from background by comparing depths:
//! a pixel whose depth survives the occluder pass lies in front of the
//! plane and belongs to the foreground. The comparison is exact; both
//! depth captures happen in the same tick from the same camera.

use super::{CaptureHost, CaptureRig, CaptureStrategy};
use crate::error::CaptureError;
use crate::gpu::targets::{depth_descriptor, output_descriptor, post_process_descriptor,
    scene_color_descriptor};
use crate::gpu::{FullScreenPass, GpuBackend, PassList, PixelStage};
use crate::scene::CaptureSource;
use crate::settings::CaptureMethod;

const BACKGROUND_SCENE: &str = "background scene color depth";
const SCENE_COLOR: &str = "post processed scene color";
const BACKGROUND_DEPTH: &str = "background depth";
const FOREGROUND_DEPTH: &str = "foreground depth";
const FOREGROUND_OUTPUT: &str = "foreground output";
const BACKGROUND_OUTPUT: &str = "background output";

/// Depth segmentation on the raw scene color.
///
/// Two captures per frame: linear scene color with depth in alpha, and
/// depth again with the plane quads visible. One segmentation pass
/// produces both outputs.
pub struct MeshClipNoPostProcess {
    rig: CaptureRig,
}

impl MeshClipNoPostProcess {
    pub fn new() -> Self {
        Self {
            rig: CaptureRig::new(),
        }
    }
}

impl Default for MeshClipNoPostProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureStrategy for MeshClipNoPostProcess {
    fn method(&self) -> CaptureMethod {
        CaptureMethod::MeshClipNoPostProcess
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
            .add_target(gpu, FOREGROUND_DEPTH, depth_descriptor(FOREGROUND_DEPTH, width, height))?;
        self.rig
            .add_target(gpu, FOREGROUND_OUTPUT, output_descriptor(FOREGROUND_OUTPUT, width, height))?;
        self.rig
            .add_target(gpu, BACKGROUND_OUTPUT, output_descriptor(BACKGROUND_OUTPUT, width, height))
    }

    fn render(&mut self, host: &mut CaptureHost<'_>) -> Result<(), CaptureError> {
        // Background first, always without the clip plane.
        let background = self.rig.request(
            CaptureSource::SceneColorSceneDepth,
            BACKGROUND_SCENE,
            host.settings,
            host.context,
        )?;
        host.scene.capture(&background)?;

        let foreground = self.rig.request(
            CaptureSource::SceneDepth,
            FOREGROUND_DEPTH,
            host.settings,
            host.context,
        )?;
        self.rig.capture_with_occluders(host.scene, &foreground)?;

        let mut passes = PassList::new();
        passes.push(
            FullScreenPass::new(PixelStage::ForegroundSegmentation)
                .with_input(self.rig.target(BACKGROUND_SCENE)?)
                .with_input(self.rig.target(FOREGROUND_DEPTH)?)
                .with_output(self.rig.target(FOREGROUND_OUTPUT)?)
                .with_output(self.rig.target(BACKGROUND_OUTPUT)?),
        );
        host.gpu.execute(&passes)?;

        self.rig.submit_outputs(
            host.gpu,
            host.bridge,
            host.settings,
            FOREGROUND_OUTPUT,
            BACKGROUND_OUTPUT,
        )
    }
}

/// Depth segmentation on the post-processed scene color.
///
/// Three captures per frame: tonemapped color, scene depth, and scene
/// depth with the plane quads visible. Depth lives in its own targets
/// because the tonemapped color has no usable alpha channel.
pub struct MeshClipPostProcess {
    rig: CaptureRig,
}

impl MeshClipPostProcess {
    pub fn new() -> Self {
        Self {
            rig: CaptureRig::new(),
        }
    }
}

impl Default for MeshClipPostProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureStrategy for MeshClipPostProcess {
    fn method(&self) -> CaptureMethod {
        CaptureMethod::MeshClipPostProcess
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
            .add_target(gpu, SCENE_COLOR, post_process_descriptor(SCENE_COLOR, width, height))?;
        self.rig
            .add_target(gpu, BACKGROUND_DEPTH, depth_descriptor(BACKGROUND_DEPTH, width, height))?;
        self.rig
            .add_target(gpu, FOREGROUND_DEPTH, depth_descriptor(FOREGROUND_DEPTH, width, height))?;
        self.rig
            .add_target(gpu, FOREGROUND_OUTPUT, output_descriptor(FOREGROUND_OUTPUT, width, height))?;
        self.rig
            .add_target(gpu, BACKGROUND_OUTPUT, output_descriptor(BACKGROUND_OUTPUT, width, height))
    }

    fn render(&mut self, host: &mut CaptureHost<'_>) -> Result<(), CaptureError> {
        let color = self.rig.request(
            CaptureSource::FinalColorLdr,
            SCENE_COLOR,
            host.settings,
            host.context,
        )?;
        host.scene.capture(&color)?;

        let background_depth = self.rig.request(
            CaptureSource::SceneDepth,
            BACKGROUND_DEPTH,
            host.settings,
            host.context,
        )?;
        host.scene.capture(&background_depth)?;

        let foreground_depth = self.rig.request(
            CaptureSource::SceneDepth,
            FOREGROUND_DEPTH,
            host.settings,
            host.context,
        )?;
        self.rig
            .capture_with_occluders(host.scene, &foreground_depth)?;

        let mut passes = PassList::new();
        passes.push(
            FullScreenPass::new(PixelStage::ForegroundSegmentationPostProcessed)
                .with_input(self.rig.target(SCENE_COLOR)?)
                .with_input(self.rig.target(BACKGROUND_DEPTH)?)
                .with_input(self.rig.target(FOREGROUND_DEPTH)?)
                .with_output(self.rig.target(FOREGROUND_OUTPUT)?)
                .with_output(self.rig.target(BACKGROUND_OUTPUT)?),
        );
        host.gpu.execute(&passes)?;

        self.rig.submit_outputs(
            host.gpu,
            host.bridge,
            host.settings,
            FOREGROUND_OUTPUT,
            BACKGROUND_OUTPUT,
        )
    }
}
