//! Clip plane geometry.
//!
//! Mesh-clip strategies place a large quad mesh at the compositor's
//! clip plane and render it as an occluder into depth-only captures.
//! Global-clip strategies instead derive an analytic plane for the
//! renderer's clip test. Both representations come from the same
//! engine-space transform.
//!
//! The mesh is hidden except while a capture that wants it is being
//! rendered; a debug toggle can keep it visible in the main view for
//! inspecting plane placement.

use glam::{Mat4, Vec3};

use crate::frame::InputFrame;
use crate::scene::GlobalClipPlane;

/// Scale applied to the unit quad. The plane must cover the whole
/// frustum at any usable distance.
pub const MESH_SCALE: Vec3 = Vec3::new(1.0, 50.0, 50.0);

/// Which frame field a plane mesh follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSource {
    CameraClipPlane,
    GroundClipPlane,
}

/// A clip plane quad placed in the world.
#[derive(Debug, Clone)]
pub struct ClipPlaneMesh {
    source: PlaneSource,
    transform: Mat4,
    visible: bool,
    debug_visible: bool,
}

impl ClipPlaneMesh {
    pub fn new(source: PlaneSource) -> Self {
        Self {
            source,
            transform: Mat4::IDENTITY,
            visible: false,
            debug_visible: false,
        }
    }

    pub fn source(&self) -> PlaneSource {
        self.source
    }

    /// Update the plane placement from this tick's input frame. The
    /// frame's transform is tracking-local; `origin` roots it in the
    /// world.
    pub fn update_from_frame(&mut self, frame: &InputFrame, origin: Mat4) {
        self.transform = origin
            * match self.source {
                PlaneSource::CameraClipPlane => frame.clip_plane_transform(),
                PlaneSource::GroundClipPlane => frame.ground_plane_transform(),
            };
    }

    /// Engine-space transform, without the mesh scale.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Transform of the scaled quad as placed in the world.
    pub fn mesh_transform(&self) -> Mat4 {
        self.transform * Mat4::from_scale(MESH_SCALE)
    }

    /// Analytic plane equivalent: origin plus the local X axis.
    pub fn analytic(&self) -> GlobalClipPlane {
        let position = self.transform.transform_point3(Vec3::ZERO);
        let normal = self.transform.transform_vector3(Vec3::X);
        GlobalClipPlane {
            position,
            normal: normal.normalize_or_zero(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible || self.debug_visible
    }

    /// Keep the mesh visible outside captures, for debugging placement.
    pub fn set_debug_visible(&mut self, debug_visible: bool) {
        self.debug_visible = debug_visible;
    }

    /// Show the mesh, run `f`, hide it again. The mesh is never left
    /// visible after a capture, whatever `f` returns.
    pub fn while_visible<R>(&mut self, f: impl FnOnce(&Self) -> R) -> R {
        self.visible = true;
        let result = f(self);
        self.visible = false;
        result
    }

    pub(crate) fn set_capture_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::InputFrame;

    #[test]
    fn follows_frame_clip_plane() {
        let mut frame = InputFrame::default();
        frame.clip_plane.transform = Mat4::from_translation(Vec3::new(3.0, 2.0, 9.0));
        let mut mesh = ClipPlaneMesh::new(PlaneSource::CameraClipPlane);
        mesh.update_from_frame(&frame, Mat4::IDENTITY);
        let origin = mesh.transform().transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(900.0, 300.0, 200.0));
    }

    #[test]
    fn ground_plane_follows_ground_field() {
        let mut frame = InputFrame::default();
        frame.ground_plane.transform = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let mut mesh = ClipPlaneMesh::new(PlaneSource::GroundClipPlane);
        mesh.update_from_frame(&frame, Mat4::IDENTITY);
        let origin = mesh.transform().transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(0.0, 0.0, 100.0));
    }

    #[test]
    fn placement_composes_with_tracking_origin() {
        let mut frame = InputFrame::default();
        frame.clip_plane.transform = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        let mut mesh = ClipPlaneMesh::new(PlaneSource::CameraClipPlane);
        mesh.update_from_frame(&frame, Mat4::from_translation(Vec3::new(1000.0, 0.0, 0.0)));
        let origin = mesh.transform().transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(1500.0, 0.0, 0.0));
        assert_eq!(mesh.analytic().position, Vec3::new(1500.0, 0.0, 0.0));
        assert_eq!(mesh.analytic().normal, Vec3::X);
    }

    #[test]
    fn mesh_transform_applies_scale() {
        let mesh = ClipPlaneMesh::new(PlaneSource::CameraClipPlane);
        let corner = mesh.mesh_transform().transform_point3(Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(corner, Vec3::new(0.0, 50.0, 50.0));
    }

    #[test]
    fn analytic_plane_from_transform() {
        let mut frame = InputFrame::default();
        frame.clip_plane.transform = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        let mut mesh = ClipPlaneMesh::new(PlaneSource::CameraClipPlane);
        mesh.update_from_frame(&frame, Mat4::IDENTITY);
        let plane = mesh.analytic();
        assert_eq!(plane.position, Vec3::new(500.0, 0.0, 0.0));
        assert_eq!(plane.normal, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn hidden_outside_captures() {
        let mut mesh = ClipPlaneMesh::new(PlaneSource::CameraClipPlane);
        assert!(!mesh.is_visible());
        let seen = mesh.while_visible(|m| m.is_visible());
        assert!(seen);
        assert!(!mesh.is_visible());
    }

    #[test]
    fn debug_visibility_persists() {
        let mut mesh = ClipPlaneMesh::new(PlaneSource::CameraClipPlane);
        mesh.set_debug_visible(true);
        assert!(mesh.is_visible());
        mesh.while_visible(|_| ());
        assert!(mesh.is_visible());
    }
}
