//! Per-frame input state delivered by the compositor bridge.
//!
//! An [`InputFrame`] carries the compositor camera pose, the clip plane
//! placement and a feature word describing which optional behaviors the
//! compositor requests for this frame. All spatial data arrives in the
//! compositor's coordinate conventions; see [`crate::convert`] for the
//! mapping into engine space.

use glam::{Mat4, Quat, Vec3};

use crate::convert;

/// Priority value used for fields written by the game side.
pub const GAME_PRIORITY: i8 = 63;

bitflags::bitflags! {
    /// Optional per-frame behaviors requested by the compositor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameFeatures: u64 {
        const BACKGROUND_RENDER = 1 << 0;
        const FOREGROUND_RENDER = 1 << 1;
        const COMPLEX_CLIP_PLANE = 1 << 2;
        const BACKGROUND_DEPTH_RENDER = 1 << 3;
        const OVERRIDE_POST_PROCESSING = 1 << 4;
        const FIX_FOREGROUND_ALPHA = 1 << 5;
        const GROUND_CLIP_PLANE = 1 << 6;
        const RELEASE_CONTROL = 1 << 15;
        const DEBUG_CLIP_PLANE = 1 << 48;
    }
}

/// Compositor camera pose for one frame, in compositor space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub projection_matrix: Mat4,
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in degrees.
    pub vertical_fov: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            projection_matrix: Mat4::IDENTITY,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            vertical_fov: 59.0,
            near_clip: 0.1,
            far_clip: 1000.0,
            width: 1920,
            height: 1080,
        }
    }
}

/// Placement of an infinite plane, as a transform in compositor space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaneData {
    pub transform: Mat4,
}

/// Priority of each writable field, one signed byte per field.
///
/// Higher values win when both the game and the compositor write the
/// same field. The game writes with [`GAME_PRIORITY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldPriorities {
    pub pose: i8,
    pub clip_plane: i8,
    pub ground_plane: i8,
}

/// One frame of compositor input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputFrame {
    pub pose: Pose,
    pub clip_plane: PlaneData,
    pub ground_plane: PlaneData,
    pub features: FrameFeatures,
    pub frame_id: u64,
    pub reference_frame: u64,
    pub priorities: FieldPriorities,
}

impl InputFrame {
    /// Whether the compositor asked for the ground clip plane this frame.
    pub fn wants_ground_clip_plane(&self) -> bool {
        self.features.contains(FrameFeatures::GROUND_CLIP_PLANE)
    }

    /// Whether the compositor drives the camera pose this frame. A
    /// field written at [`GAME_PRIORITY`] or above belongs to the game
    /// side; consumers keep their own value for it.
    pub fn compositor_controls_pose(&self) -> bool {
        self.priorities.pose < GAME_PRIORITY
    }

    pub fn compositor_controls_clip_plane(&self) -> bool {
        self.priorities.clip_plane < GAME_PRIORITY
    }

    pub fn compositor_controls_ground_plane(&self) -> bool {
        self.priorities.ground_plane < GAME_PRIORITY
    }

    /// Camera position converted to engine space.
    pub fn camera_position(&self) -> Vec3 {
        convert::position_from_external(self.pose.position)
    }

    /// Camera rotation converted to engine space.
    pub fn camera_rotation(&self) -> Quat {
        convert::rotation_from_external(self.pose.rotation)
    }

    /// Clip plane transform converted to engine space.
    pub fn clip_plane_transform(&self) -> Mat4 {
        convert::matrix_from_external(self.clip_plane.transform)
    }

    /// Ground plane transform converted to engine space.
    pub fn ground_plane_transform(&self) -> Mat4 {
        convert::matrix_from_external(self.ground_plane.transform)
    }
}
