//! Scene capture abstraction.
//!
//! Capture strategies render the world through the [`SceneCapture`]
//! trait. Each call renders the whole scene once, from a given camera,
//! into a backend texture, selecting one of a few well-known capture
//! sources. The production implementation wraps the host engine's
//! scene renderer; [`StaticScene`] is a deterministic stand-in used by
//! the crate's tests.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::error::CaptureError;
use crate::gpu::cpu::{CpuBackend, Pixel};
use crate::gpu::{GpuBackend, TextureHandle};

/// What a scene capture writes into its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    /// Linear scene color in RGB, scene depth in alpha. No tonemapping.
    SceneColorSceneDepth,
    /// Scene depth in the red channel.
    SceneDepth,
    /// Tonemapped, post-processed color. Alpha is opaque.
    FinalColorLdr,
    /// HDR scene color in RGB, inverse opacity in alpha.
    SceneColorHdr,
    /// HDR scene color with alpha forced opaque.
    SceneColorHdrNoAlpha,
}

/// Camera for one scene capture, in engine space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in degrees. Ignored when a projection
    /// override is set.
    pub vertical_fov: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    pub projection_override: Option<Mat4>,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            vertical_fov: 90.0,
            near_clip: 10.0,
            far_clip: 0.0,
            projection_override: None,
        }
    }
}

/// Analytic clip plane applied during a capture. Geometry behind the
/// plane (opposite the normal) is not rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalClipPlane {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Identifier of a world object (actor or component) known to the host
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// One scene capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub source: CaptureSource,
    pub camera: CameraParams,
    pub global_clip_plane: Option<GlobalClipPlane>,
    /// Render clip-plane occluder meshes during this capture.
    pub show_occluders: bool,
    /// Objects excluded from this capture.
    pub hidden: Vec<ObjectId>,
    pub target: TextureHandle,
}

impl CaptureRequest {
    pub fn new(source: CaptureSource, camera: CameraParams, target: TextureHandle) -> Self {
        Self {
            source,
            camera,
            global_clip_plane: None,
            show_occluders: false,
            hidden: Vec::new(),
            target,
        }
    }
}

/// Renders the world into backend textures.
pub trait SceneCapture {
    fn capture(&mut self, request: &CaptureRequest) -> Result<(), CaptureError>;
}

/// Record of one capture taken by [`StaticScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCapture {
    pub source: CaptureSource,
    pub target: TextureHandle,
    pub show_occluders: bool,
    pub clipped: bool,
    pub hidden: Vec<ObjectId>,
    pub camera_position: Vec3,
    pub vertical_fov: f32,
    pub has_projection_override: bool,
}

/// A uniform synthetic scene: one surface color at one depth, with an
/// optional occluder depth used when occluder meshes are shown.
///
/// Every texel of a capture gets the same value, which makes strategy
/// outputs fully predictable in tests.
pub struct StaticScene {
    backend: Arc<CpuBackend>,
    /// Linear surface color.
    pub color: [f32; 3],
    /// Post-processed surface color.
    pub post_processed_color: [f32; 3],
    /// Depth of the scene surface, engine units.
    pub depth: f32,
    /// Depth written where occluder meshes cover the view.
    pub occluder_depth: f32,
    /// A point on the scene surface, used to evaluate clip planes.
    pub surface_point: Vec3,
    captures: Vec<RecordedCapture>,
}

impl StaticScene {
    pub fn new(backend: Arc<CpuBackend>) -> Self {
        Self {
            backend,
            color: [0.5, 0.5, 0.5],
            post_processed_color: [0.8, 0.8, 0.8],
            depth: 500.0,
            occluder_depth: 500.0,
            surface_point: Vec3::new(500.0, 0.0, 0.0),
            captures: Vec::new(),
        }
    }

    pub fn captures(&self) -> &[RecordedCapture] {
        &self.captures
    }

    pub fn clear_captures(&mut self) {
        self.captures.clear();
    }

    fn texel(&self, request: &CaptureRequest, clipped_out: bool) -> Pixel {
        let depth = if request.show_occluders {
            self.occluder_depth
        } else {
            self.depth
        };
        match request.source {
            CaptureSource::SceneColorSceneDepth => {
                [self.color[0], self.color[1], self.color[2], depth]
            }
            CaptureSource::SceneDepth => [depth, 0.0, 0.0, 0.0],
            CaptureSource::FinalColorLdr => [
                self.post_processed_color[0],
                self.post_processed_color[1],
                self.post_processed_color[2],
                1.0,
            ],
            CaptureSource::SceneColorHdr => {
                if clipped_out {
                    // Surface removed by the clip plane: nothing
                    // rendered, fully transparent (inverse opacity 1).
                    [0.0, 0.0, 0.0, 1.0]
                } else {
                    [self.color[0], self.color[1], self.color[2], 0.0]
                }
            }
            CaptureSource::SceneColorHdrNoAlpha => {
                [self.color[0], self.color[1], self.color[2], 1.0]
            }
        }
    }
}

impl SceneCapture for StaticScene {
    fn capture(&mut self, request: &CaptureRequest) -> Result<(), CaptureError> {
        let desc = self
            .backend
            .texture_descriptor(request.target)
            .ok_or(CaptureError::MissingTarget("capture target"))?;

        let clipped_out = request
            .global_clip_plane
            .map(|plane| plane.normal.dot(self.surface_point - plane.position) < 0.0)
            .unwrap_or(false);

        let texel = self.texel(request, clipped_out);
        self.backend
            .write_pixels(request.target, vec![texel; desc.texel_count()])?;

        self.captures.push(RecordedCapture {
            source: request.source,
            target: request.target,
            show_occluders: request.show_occluders,
            clipped: request.global_clip_plane.is_some(),
            hidden: request.hidden.clone(),
            camera_position: request.camera.position,
            vertical_fov: request.camera.vertical_fov,
            has_projection_override: request.camera.projection_override.is_some(),
        });
        Ok(())
    }
}
