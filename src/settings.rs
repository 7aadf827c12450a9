//! Capture configuration.

use glam::{Quat, Vec3};

use crate::bridge::ColorSpace;

/// The four capture strategies.
///
/// Mesh-clip strategies render clip plane quads as occluders and
/// segment by depth comparison; global-clip strategies use the
/// renderer's analytic clip plane. Each comes with and without
/// post-processing of the captured color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMethod {
    MeshClipNoPostProcess,
    /// The configuration default: best quality for typical scenes.
    #[default]
    MeshClipPostProcess,
    GlobalClipNoPostProcess,
    GlobalClipPostProcess,
}

impl CaptureMethod {
    /// Fallback used by the session layer when a configured method
    /// cannot be resolved. Distinct from the configuration default.
    pub fn fallback() -> Self {
        Self::MeshClipNoPostProcess
    }
}

/// Fixed camera override used instead of the compositor pose.
///
/// Placement is in engine space; the field of view is horizontal, in
/// degrees, and converted per frame to the vertical field of view the
/// capture camera wants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugCamera {
    pub position: Vec3,
    pub rotation: Quat,
    pub horizontal_fov: f32,
}

impl Default for DebugCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            horizontal_fov: 90.0,
        }
    }
}

/// Capture pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaptureSettings {
    pub capture_method: CaptureMethod,
    /// Color space declared for submitted textures.
    pub color_space: ColorSpace,
    /// When set, capture cameras use this fixed pose instead of the
    /// compositor pose.
    pub debug_camera: Option<DebugCamera>,
    /// Keep clip plane meshes visible in the main view.
    pub debug_clip_planes: bool,
}

impl CaptureSettings {
    pub fn new() -> Self {
        Self::default()
    }
}
