//! Shared capture state and plumbing.
//!
//! Every strategy owns a [`CaptureRig`]: the held input frame, the
//! render target set, the clip plane meshes and the submission path to
//! the bridge. Strategies differ only in which captures they take and
//! which passes they run; everything else lives here.

use glam::{Mat4, Quat, Vec3};

use crate::bridge::{Bridge, TextureSemantic, TextureSubmission};
use crate::clip_plane::{ClipPlaneMesh, PlaneSource};
use crate::context::CaptureContext;
use crate::convert;
use crate::error::CaptureError;
use crate::frame::InputFrame;
use crate::gpu::{GpuBackend, RenderTargetSet, TextureDescriptor};
use crate::scene::{CameraParams, CaptureRequest, CaptureSource, SceneCapture};
use crate::settings::CaptureSettings;

/// State shared by all capture strategies.
pub struct CaptureRig {
    active: bool,
    frame: Option<InputFrame>,
    targets: RenderTargetSet,
    clip_plane: ClipPlaneMesh,
    ground_plane: ClipPlaneMesh,
    use_ground_plane: bool,
    /// Tracking-origin transform. Frame poses and plane placements are
    /// tracking-local; this roots them in the world.
    origin: Mat4,
}

impl Default for CaptureRig {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureRig {
    pub fn new() -> Self {
        Self {
            active: false,
            frame: None,
            targets: RenderTargetSet::default(),
            clip_plane: ClipPlaneMesh::new(PlaneSource::CameraClipPlane),
            ground_plane: ClipPlaneMesh::new(PlaneSource::GroundClipPlane),
            use_ground_plane: false,
            origin: Mat4::IDENTITY,
        }
    }

    pub fn set_origin(&mut self, origin: Mat4) {
        self.origin = origin;
    }

    pub fn origin(&self) -> Mat4 {
        self.origin
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self, settings: &CaptureSettings) {
        self.active = true;
        self.clip_plane.set_debug_visible(settings.debug_clip_planes);
        self.ground_plane.set_debug_visible(settings.debug_clip_planes);
    }

    pub fn deactivate(&mut self, gpu: &dyn GpuBackend) {
        self.targets.release(gpu);
        self.frame = None;
        self.use_ground_plane = false;
        self.active = false;
        self.clip_plane.set_capture_visible(false);
        self.ground_plane.set_capture_visible(false);
        self.clip_plane.set_debug_visible(false);
        self.ground_plane.set_debug_visible(false);
    }

    /// Last adopted input frame, if any.
    pub fn frame(&self) -> Option<&InputFrame> {
        self.frame.as_ref()
    }

    /// Take this tick's frame: update plane placements and the ground
    /// plane gate, and remember the frame for camera queries. A field
    /// whose priority marks it game-controlled keeps its previous
    /// value.
    pub fn adopt_frame(&mut self, mut frame: InputFrame) {
        if frame.compositor_controls_clip_plane() {
            self.clip_plane.update_from_frame(&frame, self.origin);
        }
        if frame.compositor_controls_ground_plane() {
            self.ground_plane.update_from_frame(&frame, self.origin);
        }
        self.use_ground_plane = frame.wants_ground_clip_plane();
        if !frame.compositor_controls_pose() {
            if let Some(previous) = self.frame {
                frame.pose = previous.pose;
            }
        }
        self.frame = Some(frame);
    }

    pub fn clip_plane(&self) -> &ClipPlaneMesh {
        &self.clip_plane
    }

    pub fn ground_plane(&self) -> &ClipPlaneMesh {
        &self.ground_plane
    }

    pub fn uses_ground_plane(&self) -> bool {
        self.use_ground_plane
    }

    // Target set management.

    pub fn has_targets_for(&self, width: u32, height: u32) -> bool {
        !self.targets.is_empty() && self.targets.matches(width, height)
    }

    pub fn begin_target_set(&mut self, width: u32, height: u32) {
        self.targets = RenderTargetSet::new(width, height);
    }

    pub fn add_target(
        &mut self,
        gpu: &dyn GpuBackend,
        name: &'static str,
        desc: TextureDescriptor,
    ) -> Result<(), CaptureError> {
        self.targets.insert(gpu, name, desc)
    }

    pub fn release_targets(&mut self, gpu: &dyn GpuBackend) {
        self.targets.release(gpu);
    }

    pub fn target(&self, name: &'static str) -> Result<crate::gpu::TextureHandle, CaptureError> {
        self.targets.handle(name)
    }

    // Camera queries, in world space. Zero/identity fallbacks when no
    // frame is held.

    pub fn camera_location(&self) -> Vec3 {
        let local = self
            .frame
            .as_ref()
            .map(InputFrame::camera_position)
            .unwrap_or(Vec3::ZERO);
        self.origin.transform_point3(local)
    }

    pub fn camera_rotation(&self) -> Quat {
        let local = self
            .frame
            .as_ref()
            .map(InputFrame::camera_rotation)
            .unwrap_or(Quat::IDENTITY);
        Quat::from_mat4(&self.origin) * local
    }

    pub fn clip_plane_transform(&self) -> Mat4 {
        self.clip_plane.transform()
    }

    pub fn clip_plane_location(&self) -> Vec3 {
        self.clip_plane.transform().transform_point3(Vec3::ZERO)
    }

    pub fn clip_plane_forward(&self) -> Vec3 {
        self.clip_plane
            .transform()
            .transform_vector3(Vec3::X)
            .normalize_or_zero()
    }

    /// Camera for this tick's captures: the compositor pose rooted at
    /// the tracking origin, unless a debug camera override is
    /// configured. The debug camera is already in world space.
    pub fn camera_params(&self, settings: &CaptureSettings) -> CameraParams {
        let (width, height) = self.frame_dimensions();
        if let Some(debug) = settings.debug_camera {
            return CameraParams {
                position: debug.position,
                rotation: debug.rotation,
                vertical_fov: convert::vertical_fov_from_horizontal_dims(
                    debug.horizontal_fov,
                    width as f32,
                    height as f32,
                ),
                ..CameraParams::default()
            };
        }
        match &self.frame {
            Some(frame) => CameraParams {
                position: self.origin.transform_point3(frame.camera_position()),
                rotation: Quat::from_mat4(&self.origin) * frame.camera_rotation(),
                vertical_fov: frame.pose.vertical_fov,
                near_clip: frame.pose.near_clip,
                far_clip: frame.pose.far_clip,
                projection_override: None,
            },
            None => CameraParams::default(),
        }
    }

    pub fn frame_dimensions(&self) -> (u32, u32) {
        self.frame
            .as_ref()
            .map(|f| (f.pose.width, f.pose.height))
            .unwrap_or((1920, 1080))
    }

    /// Build a capture request for this tick, with the exclude list
    /// applied.
    pub fn request(
        &self,
        source: CaptureSource,
        target: &'static str,
        settings: &CaptureSettings,
        context: &CaptureContext,
    ) -> Result<CaptureRequest, CaptureError> {
        let mut request =
            CaptureRequest::new(source, self.camera_params(settings), self.target(target)?);
        context.apply(&mut request);
        Ok(request)
    }

    /// Run one capture with the clip plane meshes visible. The meshes
    /// are hidden again before this returns, success or not.
    pub fn capture_with_occluders(
        &mut self,
        scene: &mut dyn SceneCapture,
        request: &CaptureRequest,
    ) -> Result<(), CaptureError> {
        let mut request = request.clone();
        request.show_occluders = true;
        if self.use_ground_plane {
            self.ground_plane.set_capture_visible(true);
        }
        let result = self
            .clip_plane
            .while_visible(|_| scene.capture(&request));
        self.ground_plane.set_capture_visible(false);
        result
    }

    /// Hand the finished frame to the compositor: flush GPU work, then
    /// foreground, then background, then submit.
    pub fn submit_outputs(
        &self,
        gpu: &dyn GpuBackend,
        bridge: &mut dyn Bridge,
        settings: &CaptureSettings,
        foreground: &'static str,
        background: &'static str,
    ) -> Result<(), CaptureError> {
        gpu.flush();
        bridge.start_frame()?;
        for (name, semantic) in [
            (foreground, TextureSemantic::Foreground),
            (background, TextureSemantic::Background),
        ] {
            let handle = self.target(name)?;
            let desc = gpu
                .texture_descriptor(handle)
                .ok_or(CaptureError::MissingTarget(name))?;
            let native_handle = gpu
                .native_handle(handle)
                .ok_or(CaptureError::MissingTarget(name))?;
            bridge.add_texture(TextureSubmission {
                semantic,
                native_handle,
                width: desc.width,
                // Rendered output is vertically flipped relative to the
                // compositor's convention.
                height: -(desc.height as i32),
                format: desc.format,
                color_space: settings.color_space,
            })?;
        }
        bridge.submit()
    }
}
