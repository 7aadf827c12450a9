//! End-to-end pipeline tests: session lifecycle driving real strategy
//! captures through the CPU backend, the static test scene and the
//! mock bridge.

use std::sync::Arc;

use mixcap::bridge::{Bridge, MockBridge, TextureSemantic};
use mixcap::capture::CaptureHost;
use mixcap::context::CaptureContext;
use mixcap::frame::{FrameFeatures, InputFrame};
use mixcap::gpu::cpu::CpuBackend;
use mixcap::scene::{CaptureSource, StaticScene};
use mixcap::session::{PlayerSession, SessionRegistry, WorldSession, CONNECTION_POLL_INTERVAL};
use mixcap::settings::{CaptureMethod, CaptureSettings};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Pipeline {
    backend: Arc<CpuBackend>,
    scene: StaticScene,
    bridge: MockBridge,
    context: CaptureContext,
    settings: CaptureSettings,
    registry: Arc<SessionRegistry>,
    session: PlayerSession,
    world: WorldSession,
}

impl Pipeline {
    fn new() -> Self {
        init_logging();
        let backend = Arc::new(CpuBackend::new());
        let scene = StaticScene::new(backend.clone());
        let mut bridge = MockBridge::new();
        bridge.load().unwrap();
        let registry = Arc::new(SessionRegistry::new());
        let session = PlayerSession::new(registry.clone());
        Self {
            backend,
            scene,
            bridge,
            context: CaptureContext::new(),
            settings: CaptureSettings::default(),
            registry,
            session,
            world: WorldSession::new(),
        }
    }

    fn frame(width: u32, height: u32) -> InputFrame {
        let mut frame = InputFrame::default();
        frame.pose.width = width;
        frame.pose.height = height;
        frame
    }

    fn tick(&mut self, delta_time: f32) {
        let mut host = CaptureHost {
            gpu: self.backend.as_ref(),
            scene: &mut self.scene,
            bridge: &mut self.bridge,
            context: &self.context,
            settings: &self.settings,
        };
        self.session.tick(delta_time, &mut host, &mut self.world);
    }
}

#[test]
fn inactive_compositor_means_no_work() {
    let mut p = Pipeline::new();
    p.bridge.push_frame(Pipeline::frame(4, 4));
    for _ in 0..3 {
        p.tick(CONNECTION_POLL_INTERVAL);
    }
    assert!(!p.session.is_capture_active());
    assert!(p.scene.captures().is_empty());
    assert!(p.bridge.submissions().is_empty());
    assert_eq!(p.backend.texture_count(), 0);
}

#[test]
fn activation_captures_and_submits_every_tick() {
    let mut p = Pipeline::new();
    p.bridge.set_active(true);
    p.bridge.push_frame(Pipeline::frame(4, 4));

    for _ in 0..5 {
        p.tick(0.016);
    }

    assert!(p.session.is_capture_active());
    assert_eq!(p.world.current_method(), Some(CaptureMethod::MeshClipPostProcess));
    assert_eq!(p.bridge.submissions().len(), 5);

    for submission in p.bridge.submissions() {
        assert_eq!(submission.len(), 2);
        assert_eq!(submission[0].semantic, TextureSemantic::Foreground);
        assert_eq!(submission[1].semantic, TextureSemantic::Background);
        assert_eq!(submission[0].height, -4);
        assert_eq!(submission[0].width, 4);
    }
}

#[test]
fn frame_miss_skips_capture_but_keeps_session_up() {
    let mut p = Pipeline::new();
    p.bridge.set_active(true);
    p.bridge.push_frame(Pipeline::frame(4, 4));
    p.tick(0.016);
    assert_eq!(p.bridge.submissions().len(), 1);

    p.bridge.push_frame_miss();
    p.bridge.push_frame(Pipeline::frame(4, 4));
    p.tick(0.016);
    assert!(p.session.is_capture_active());
    assert_eq!(p.bridge.submissions().len(), 1);

    p.tick(0.016);
    assert_eq!(p.bridge.submissions().len(), 2);
}

#[test]
fn dimension_change_recreates_targets_between_ticks() {
    let mut p = Pipeline::new();
    p.bridge.set_active(true);
    // One frame feeds activation, one the first capture.
    p.bridge.push_frame(Pipeline::frame(4, 4));
    p.bridge.push_frame(Pipeline::frame(4, 4));
    p.bridge.push_frame(Pipeline::frame(8, 8));

    p.tick(0.016);
    let count_after_first = p.backend.texture_count();
    assert_eq!(p.bridge.last_submission().unwrap()[0].width, 4);

    p.tick(0.016);
    // Same number of live textures, all replaced at the new size.
    assert_eq!(p.backend.texture_count(), count_after_first);
    let last = p.bridge.last_submission().unwrap();
    assert_eq!(last[0].width, 8);
    assert_eq!(last[0].height, -8);
}

#[test]
fn deactivation_releases_every_texture() {
    let mut p = Pipeline::new();
    p.bridge.set_active(true);
    p.bridge.push_frame(Pipeline::frame(4, 4));
    p.tick(0.016);
    assert!(p.backend.texture_count() > 0);

    p.bridge.set_active(false);
    p.tick(CONNECTION_POLL_INTERVAL);
    assert!(!p.session.is_capture_active());
    assert_eq!(p.backend.texture_count(), 0);
    assert_eq!(p.registry.leader(), None);
}

#[test]
fn mesh_clip_occluder_visibility_stays_scoped_to_captures() {
    let mut p = Pipeline::new();
    p.bridge.set_active(true);
    let mut frame = Pipeline::frame(4, 4);
    frame.features |= FrameFeatures::GROUND_CLIP_PLANE;
    p.bridge.push_frame(frame);

    p.tick(0.016);

    // Default method takes color, background depth, foreground depth.
    let captures = p.scene.captures().to_vec();
    assert_eq!(captures.len(), 3);
    assert_eq!(
        captures.iter().filter(|c| c.show_occluders).count(),
        1,
        "only the foreground depth capture sees the plane meshes"
    );
    assert_eq!(captures[2].source, CaptureSource::SceneDepth);
    assert!(captures[2].show_occluders);
}

#[test]
fn foreground_segmentation_tracks_scene_depths() {
    let mut p = Pipeline::new();
    p.bridge.set_active(true);
    p.bridge.push_frame(Pipeline::frame(2, 2));
    p.scene.post_processed_color = [0.25, 0.5, 0.75];
    p.scene.depth = 300.0;
    p.scene.occluder_depth = 300.0;

    p.tick(0.016);
    let fg_handle = p.bridge.last_submission().unwrap()[0].native_handle;
    // Read back over the byte interface the compositor side would use.
    let bytes = p
        .backend
        .read_bytes(mixcap::gpu::TextureHandle::from_raw(fg_handle))
        .unwrap();
    let fg: &[[f32; 4]] = bytemuck::cast_slice(&bytes);
    assert!(fg.iter().all(|px| *px == [0.25, 0.5, 0.75, 1.0]));

    // Plane moves in front of the scene: everything becomes background.
    p.scene.occluder_depth = 100.0;
    p.tick(0.016);
    let fg = p
        .backend
        .read_pixels(mixcap::gpu::TextureHandle::from_raw(fg_handle))
        .unwrap();
    assert!(fg.iter().all(|px| *px == [0.0, 0.0, 0.0, 0.0]));
}

#[test]
fn reset_capture_rebuilds_resources_in_place() {
    let mut p = Pipeline::new();
    p.bridge.set_active(true);
    p.bridge.push_frame(Pipeline::frame(4, 4));
    p.tick(0.016);
    let before = p.bridge.last_submission().unwrap()[0].native_handle;

    {
        let mut host = CaptureHost {
            gpu: p.backend.as_ref(),
            scene: &mut p.scene,
            bridge: &mut p.bridge,
            context: &p.context,
            settings: &p.settings,
        };
        p.session.reset_capture(&mut host, &mut p.world);
    }
    assert!(p.session.is_capture_active());

    p.tick(0.016);
    let after = p.bridge.last_submission().unwrap()[0].native_handle;
    assert_ne!(before, after, "targets were reallocated by the reset");
}

#[test]
fn global_clip_methods_run_end_to_end() {
    for method in [
        CaptureMethod::GlobalClipNoPostProcess,
        CaptureMethod::GlobalClipPostProcess,
    ] {
        let mut p = Pipeline::new();
        p.settings.capture_method = method;
        p.bridge.set_active(true);
        p.bridge.push_frame(Pipeline::frame(4, 4));

        p.tick(0.016);
        assert_eq!(p.world.current_method(), Some(method));
        let subs = p.bridge.last_submission().unwrap();
        assert_eq!(subs.len(), 2);
        assert!(p.scene.captures().iter().all(|c| !c.show_occluders));
        assert!(p.scene.captures().iter().any(|c| c.clipped));
    }
}
