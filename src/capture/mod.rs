//! Capture strategies.
//!
//! A strategy renders one compositor frame: it takes the scene
//! captures its method needs, runs its compositing passes and submits
//! the foreground and background outputs over the bridge. The four
//! methods are independent implementations of [`CaptureStrategy`]
//! sharing a [`CaptureRig`] for frame state, targets and submission.

pub mod global_clip;
pub mod mesh_clip;
pub mod rig;

pub use global_clip::{GlobalClipNoPostProcess, GlobalClipPostProcess};
pub use mesh_clip::{MeshClipNoPostProcess, MeshClipPostProcess};
pub use rig::CaptureRig;

use glam::{Mat4, Quat, Vec3};

use crate::bridge::Bridge;
use crate::context::CaptureContext;
use crate::error::CaptureError;
use crate::gpu::GpuBackend;
use crate::scene::SceneCapture;
use crate::settings::{CaptureMethod, CaptureSettings};

/// Everything a strategy needs for one tick, borrowed from the caller.
pub struct CaptureHost<'a> {
    pub gpu: &'a dyn GpuBackend,
    pub scene: &'a mut dyn SceneCapture,
    pub bridge: &'a mut dyn Bridge,
    pub context: &'a CaptureContext,
    pub settings: &'a CaptureSettings,
}

/// One capture method.
///
/// Implementations provide target allocation and the per-frame render;
/// activation, frame polling, dimension tracking and camera queries are
/// provided on top of the strategy's [`CaptureRig`].
pub trait CaptureStrategy {
    fn method(&self) -> CaptureMethod;

    fn rig(&self) -> &CaptureRig;

    fn rig_mut(&mut self) -> &mut CaptureRig;

    /// Allocate the strategy's render targets for the given output
    /// dimensions. The rig's target set is already empty and sized.
    fn create_targets(
        &mut self,
        gpu: &dyn GpuBackend,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError>;

    /// Render and submit the frame held by the rig.
    fn render(&mut self, host: &mut CaptureHost<'_>) -> Result<(), CaptureError>;

    /// Bring the strategy up. Activation needs a compositor frame to
    /// start from; without one the strategy stays inactive.
    fn activate(&mut self, host: &mut CaptureHost<'_>) -> Result<(), CaptureError> {
        if host.bridge.input_frame().is_none() {
            log::warn!(
                "activation aborted for {:?}, compositor has no frame",
                self.method()
            );
            return Err(CaptureError::FrameUnavailable);
        }
        log::info!("activating capture strategy {:?}", self.method());
        self.rig_mut().activate(host.settings);
        Ok(())
    }

    fn deactivate(&mut self, gpu: &dyn GpuBackend) {
        log::info!("deactivating capture strategy {:?}", self.method());
        self.rig_mut().deactivate(gpu);
    }

    fn release_targets(&mut self, gpu: &dyn GpuBackend) {
        self.rig_mut().release_targets(gpu);
    }

    /// Run one tick of capture. Returns `false` when the strategy is
    /// inactive or the compositor had no frame ready; the tick is
    /// skipped without touching targets.
    ///
    /// A dimension change (and the first frame) rebuilds the whole
    /// target set before rendering.
    fn capture(&mut self, host: &mut CaptureHost<'_>) -> Result<bool, CaptureError> {
        if !self.rig().is_active() {
            return Ok(false);
        }
        let Some(frame) = host.bridge.input_frame() else {
            log::trace!("no compositor frame this tick");
            return Ok(false);
        };

        let (width, height) = (frame.pose.width, frame.pose.height);
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidParameter(format!(
                "compositor frame with zero dimension {width}x{height}"
            )));
        }
        if !self.rig().has_targets_for(width, height) {
            log::debug!(
                "(re)creating capture targets at {width}x{height} for {:?}",
                self.method()
            );
            self.release_targets(host.gpu);
            self.rig_mut().begin_target_set(width, height);
            self.create_targets(host.gpu, width, height)?;
        }
        self.rig_mut().adopt_frame(frame);
        self.render(host)?;
        Ok(true)
    }

    // Camera queries, answered from the last adopted frame.

    fn camera_location(&self) -> Vec3 {
        self.rig().camera_location()
    }

    fn camera_rotation(&self) -> Quat {
        self.rig().camera_rotation()
    }

    fn clip_plane_transform(&self) -> Mat4 {
        self.rig().clip_plane_transform()
    }

    fn clip_plane_location(&self) -> Vec3 {
        self.rig().clip_plane_location()
    }

    fn clip_plane_forward(&self) -> Vec3 {
        self.rig().clip_plane_forward()
    }
}

/// Instantiate the strategy for a capture method.
pub fn create_strategy(method: CaptureMethod) -> Box<dyn CaptureStrategy> {
    match method {
        CaptureMethod::MeshClipNoPostProcess => Box::new(MeshClipNoPostProcess::new()),
        CaptureMethod::MeshClipPostProcess => Box::new(MeshClipPostProcess::new()),
        CaptureMethod::GlobalClipNoPostProcess => Box::new(GlobalClipNoPostProcess::new()),
        CaptureMethod::GlobalClipPostProcess => Box::new(GlobalClipPostProcess::new()),
    }
}
