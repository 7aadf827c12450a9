//! Session and lifecycle management.
//!
//! A [`PlayerSession`] polls the bridge for compositor presence and
//! drives activation, per-tick capture and deactivation. A
//! [`WorldSession`] owns the capture strategy and the tracking-origin
//! transform for one world. When several player sessions exist (split
//! screen, editor viewports) the shared [`SessionRegistry`] elects one
//! leader; the others stay passive until the leader deactivates.
//!
//! Activation and deactivation are announced through observer
//! registries: one per session, plus a process-wide hub reachable with
//! [`global_events`].

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use parking_lot::Mutex;

use crate::capture::{create_strategy, CaptureHost, CaptureStrategy};
use crate::error::CaptureError;
use crate::gpu::GpuBackend;
use crate::settings::CaptureMethod;

/// Seconds between compositor presence polls.
pub const CONNECTION_POLL_INTERVAL: f32 = 1.0;

/// Lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    Activated,
    Deactivated,
}

/// Handle returned by [`EventHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(CaptureEvent) + Send>;

/// Observer registry for lifecycle events.
#[derive(Default)]
pub struct EventHub {
    next_id: u64,
    observers: Vec<(SubscriptionId, Observer)>,
}

impl EventHub {
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(CaptureEvent) + Send + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub fn emit(&mut self, event: CaptureEvent) {
        for (_, observer) in &mut self.observers {
            observer(event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

static GLOBAL_EVENTS: Mutex<EventHub> = Mutex::new(EventHub::new());

/// Process-wide lifecycle event hub. Every session reports here in
/// addition to its own hub.
pub fn global_events() -> &'static Mutex<EventHub> {
    &GLOBAL_EVENTS
}

/// Identifier of a registered player session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    leader: Option<SessionId>,
}

/// Tracks which player session leads capture.
///
/// Leadership is first come first served: the first session to ask
/// while the seat is empty wins, and keeps it until it resigns.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> SessionId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        SessionId(inner.next_id)
    }

    /// Claim leadership for `id`. Returns true if `id` now leads.
    pub fn try_lead(&self, id: SessionId) -> bool {
        let mut inner = self.inner.lock();
        match inner.leader {
            None => {
                inner.leader = Some(id);
                log::debug!("session {} takes capture leadership", id.0);
                true
            }
            Some(leader) => leader == id,
        }
    }

    /// Give leadership up. No effect unless `id` is the leader.
    pub fn resign(&self, id: SessionId) {
        let mut inner = self.inner.lock();
        if inner.leader == Some(id) {
            inner.leader = None;
            log::debug!("session {} resigns capture leadership", id.0);
        }
    }

    pub fn leader(&self) -> Option<SessionId> {
        self.inner.lock().leader
    }
}

/// Per-world capture state: the owned strategy and the tracking-origin
/// transform everything spatial is rooted at.
pub struct WorldSession {
    strategy: Option<Box<dyn CaptureStrategy>>,
    method: Option<CaptureMethod>,
    camera_root: Mat4,
    explicit_origin: Option<Mat4>,
    attached: bool,
}

impl Default for WorldSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldSession {
    pub fn new() -> Self {
        Self {
            strategy: None,
            method: None,
            camera_root: Mat4::IDENTITY,
            explicit_origin: None,
            attached: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.strategy.is_some()
    }

    pub fn current_method(&self) -> Option<CaptureMethod> {
        self.method
    }

    /// Create and activate the strategy. `None` resolves to the session
    /// layer fallback rather than the configuration default. Fails and
    /// leaves the session inactive when the compositor has no frame for
    /// the strategy to start from.
    pub fn activate(
        &mut self,
        host: &mut CaptureHost<'_>,
        requested: Option<CaptureMethod>,
    ) -> Result<(), CaptureError> {
        let method = requested.unwrap_or_else(CaptureMethod::fallback);
        let mut strategy = create_strategy(method);
        strategy.activate(host)?;
        strategy.rig_mut().set_origin(self.camera_root);
        self.method = Some(method);
        self.strategy = Some(strategy);
        Ok(())
    }

    pub fn deactivate(&mut self, gpu: &dyn GpuBackend) {
        if let Some(mut strategy) = self.strategy.take() {
            strategy.deactivate(gpu);
        }
        self.method = None;
        self.attached = false;
    }

    /// Drop capture resources without ending the session, as a world
    /// teardown does. The next capture recreates them.
    pub fn invalidate_world(&mut self, gpu: &dyn GpuBackend) {
        if let Some(mut strategy) = self.strategy.take() {
            strategy.deactivate(gpu);
        }
    }

    /// Capture one frame. Recreates missing resources first, so a world
    /// swap between ticks only costs one reallocation.
    pub fn capture(&mut self, host: &mut CaptureHost<'_>) -> Result<bool, CaptureError> {
        if self.strategy.is_none() {
            let Some(method) = self.method else {
                return Ok(false);
            };
            log::warn!("capture resources missing, recreating strategy {method:?}");
            let mut strategy = create_strategy(method);
            if strategy.activate(host).is_err() {
                return Ok(false);
            }
            self.strategy = Some(strategy);
        }
        match self.strategy.as_mut() {
            Some(strategy) => {
                strategy.rig_mut().set_origin(self.camera_root);
                strategy.capture(host)
            }
            None => Ok(false),
        }
    }

    // Tracking origin.

    /// Pin the tracking origin to an explicit transform. It is applied
    /// once, on the next follow, and then left alone.
    pub fn set_tracking_origin(&mut self, origin: Mat4) {
        self.explicit_origin = Some(origin);
        self.attached = false;
    }

    /// Return to following the polled origin.
    pub fn clear_tracking_origin(&mut self) {
        self.explicit_origin = None;
        self.attached = false;
    }

    /// Per-tick origin update with the transform polled from the XR
    /// runtime. Ignored once an explicit origin has attached.
    pub fn follow_tracking_origin(&mut self, polled: Mat4) {
        match self.explicit_origin {
            Some(origin) if !self.attached => {
                self.camera_root = origin;
                self.attached = true;
            }
            Some(_) => {}
            None => self.camera_root = polled,
        }
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.rig_mut().set_origin(self.camera_root);
        }
    }

    pub fn camera_root(&self) -> Mat4 {
        self.camera_root
    }

    // World-space camera queries. The strategy's rig already composes
    // the tracking origin; without a strategy the origin itself is the
    // best answer.

    pub fn camera_location(&self) -> Vec3 {
        match &self.strategy {
            Some(strategy) => strategy.camera_location(),
            None => self.camera_root.transform_point3(Vec3::ZERO),
        }
    }

    pub fn camera_rotation(&self) -> Quat {
        match &self.strategy {
            Some(strategy) => strategy.camera_rotation(),
            None => Quat::from_mat4(&self.camera_root),
        }
    }

    pub fn clip_plane_transform(&self) -> Mat4 {
        match &self.strategy {
            Some(strategy) => strategy.clip_plane_transform(),
            None => self.camera_root,
        }
    }
}

/// Drives one player's capture lifecycle.
pub struct PlayerSession {
    id: SessionId,
    registry: Arc<SessionRegistry>,
    active: bool,
    poll_timer: f32,
    events: EventHub,
}

impl PlayerSession {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        let id = registry.register();
        Self {
            id,
            registry,
            active: false,
            // First tick polls immediately.
            poll_timer: CONNECTION_POLL_INTERVAL,
            events: EventHub::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_capture_active(&self) -> bool {
        self.active
    }

    /// This session's lifecycle event hub.
    pub fn events(&mut self) -> &mut EventHub {
        &mut self.events
    }

    /// Advance the session by `delta_time` seconds. Polls the bridge at
    /// [`CONNECTION_POLL_INTERVAL`] and, while active, captures one
    /// frame. Capture failures are logged and the session stays up.
    pub fn tick(&mut self, delta_time: f32, host: &mut CaptureHost<'_>, world: &mut WorldSession) {
        self.poll_timer += delta_time;
        if self.poll_timer >= CONNECTION_POLL_INTERVAL {
            self.poll_timer = 0.0;
            self.poll_connection(host, world);
        }

        if self.active {
            if let Err(err) = world.capture(host) {
                match host.bridge.last_error() {
                    Some(detail) => log::error!("capture failed: {err} (bridge: {detail})"),
                    None => log::error!("capture failed: {err}"),
                }
            }
        }
    }

    /// Tear capture down and immediately re-poll the connection, so an
    /// active compositor gets fresh resources within this call.
    pub fn reset_capture(&mut self, host: &mut CaptureHost<'_>, world: &mut WorldSession) {
        log::info!("resetting capture for session {}", self.id.0);
        if self.active {
            self.deactivate(host.gpu, world);
        }
        self.poll_timer = 0.0;
        self.poll_connection(host, world);
    }

    fn poll_connection(&mut self, host: &mut CaptureHost<'_>, world: &mut WorldSession) {
        let wanted = host.bridge.is_active();
        if wanted && !self.active {
            if !self.registry.try_lead(self.id) {
                log::trace!(
                    "session {} stays passive, leader is {:?}",
                    self.id.0,
                    self.registry.leader()
                );
                return;
            }
            match world.activate(host, Some(host.settings.capture_method)) {
                Ok(()) => {
                    self.active = true;
                    self.emit(CaptureEvent::Activated);
                }
                Err(err) => {
                    log::warn!("capture activation failed: {err}");
                    self.registry.resign(self.id);
                }
            }
        } else if !wanted && self.active {
            self.deactivate(host.gpu, world);
        }
    }

    fn deactivate(&mut self, gpu: &dyn GpuBackend, world: &mut WorldSession) {
        world.deactivate(gpu);
        self.active = false;
        self.registry.resign(self.id);
        self.emit(CaptureEvent::Deactivated);
    }

    fn emit(&mut self, event: CaptureEvent) {
        self.events.emit(event);
        global_events().lock().emit(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::bridge::{Bridge, MockBridge};
    use crate::context::CaptureContext;
    use crate::frame::InputFrame;
    use crate::gpu::cpu::CpuBackend;
    use crate::scene::StaticScene;
    use crate::settings::CaptureSettings;

    struct Fixture {
        backend: Arc<CpuBackend>,
        scene: StaticScene,
        bridge: MockBridge,
        context: CaptureContext,
        settings: CaptureSettings,
    }

    impl Fixture {
        fn new() -> Self {
            let mut fx = Self::without_frames();
            let mut frame = InputFrame::default();
            frame.pose.width = 2;
            frame.pose.height = 2;
            fx.bridge.push_frame(frame);
            fx
        }

        fn without_frames() -> Self {
            let backend = Arc::new(CpuBackend::new());
            let scene = StaticScene::new(backend.clone());
            let mut bridge = MockBridge::new();
            bridge.load().unwrap();
            bridge.set_active(true);
            Self {
                backend,
                scene,
                bridge,
                context: CaptureContext::new(),
                settings: CaptureSettings::default(),
            }
        }

        fn with_host<R>(&mut self, f: impl FnOnce(&mut CaptureHost<'_>) -> R) -> R {
            let mut host = CaptureHost {
                gpu: self.backend.as_ref(),
                scene: &mut self.scene,
                bridge: &mut self.bridge,
                context: &self.context,
                settings: &self.settings,
            };
            f(&mut host)
        }
    }

    #[test]
    fn activates_and_captures_on_first_tick() {
        let mut fx = Fixture::new();
        let registry = Arc::new(SessionRegistry::new());
        let mut session = PlayerSession::new(registry.clone());
        let mut world = WorldSession::new();

        fx.with_host(|host| session.tick(0.016, host, &mut world));

        assert!(session.is_capture_active());
        assert_eq!(world.current_method(), Some(CaptureMethod::MeshClipPostProcess));
        assert_eq!(registry.leader(), Some(session.id()));
        assert_eq!(fx.bridge.submissions().len(), 1);
    }

    #[test]
    fn poll_interval_gates_activation() {
        let mut fx = Fixture::new();
        let registry = Arc::new(SessionRegistry::new());
        let mut session = PlayerSession::new(registry);
        let mut world = WorldSession::new();

        // First tick polls immediately and activates.
        fx.with_host(|host| session.tick(0.016, host, &mut world));
        assert!(session.is_capture_active());

        // Compositor goes away; deactivation waits for the next poll.
        fx.bridge.set_active(false);
        fx.with_host(|host| session.tick(0.016, host, &mut world));
        assert!(session.is_capture_active());
        fx.with_host(|host| session.tick(CONNECTION_POLL_INTERVAL, host, &mut world));
        assert!(!session.is_capture_active());
        assert!(!world.is_active());
    }

    #[test]
    fn second_session_stays_passive_until_leader_resigns() {
        let mut fx = Fixture::new();
        let registry = Arc::new(SessionRegistry::new());
        let mut first = PlayerSession::new(registry.clone());
        let mut second = PlayerSession::new(registry.clone());
        let mut world_a = WorldSession::new();
        let mut world_b = WorldSession::new();

        fx.with_host(|host| first.tick(0.016, host, &mut world_a));
        fx.with_host(|host| second.tick(0.016, host, &mut world_b));
        assert!(first.is_capture_active());
        assert!(!second.is_capture_active());

        // Leader resigns; the other session wins the next poll.
        fx.bridge.set_active(false);
        fx.with_host(|host| first.tick(CONNECTION_POLL_INTERVAL, host, &mut world_a));
        assert_eq!(registry.leader(), None);

        fx.bridge.set_active(true);
        fx.with_host(|host| second.tick(CONNECTION_POLL_INTERVAL, host, &mut world_b));
        assert!(second.is_capture_active());
        assert_eq!(registry.leader(), Some(second.id()));
    }

    #[test]
    fn reset_capture_reactivates_in_one_call() {
        let mut fx = Fixture::new();
        let registry = Arc::new(SessionRegistry::new());
        let mut session = PlayerSession::new(registry);
        let mut world = WorldSession::new();

        fx.with_host(|host| session.tick(0.016, host, &mut world));
        assert!(session.is_capture_active());

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        session.events().subscribe(move |event| sink.lock().push(event));

        fx.with_host(|host| session.reset_capture(host, &mut world));
        assert!(session.is_capture_active());
        assert_eq!(
            events.lock().as_slice(),
            &[CaptureEvent::Deactivated, CaptureEvent::Activated]
        );
    }

    #[test]
    fn world_invalidation_recreates_resources_next_capture() {
        let mut fx = Fixture::new();
        let registry = Arc::new(SessionRegistry::new());
        let mut session = PlayerSession::new(registry);
        let mut world = WorldSession::new();

        fx.with_host(|host| session.tick(0.016, host, &mut world));
        assert!(world.is_active());

        world.invalidate_world(fx.backend.as_ref());
        assert!(!world.is_active());
        assert_eq!(fx.backend.texture_count(), 0);

        fx.with_host(|host| session.tick(0.016, host, &mut world));
        assert!(world.is_active());
        assert_eq!(fx.bridge.submissions().len(), 2);
    }

    #[test]
    fn fallback_method_when_none_requested() {
        let mut fx = Fixture::new();
        let mut world = WorldSession::new();
        fx.with_host(|host| world.activate(host, None)).unwrap();
        assert_eq!(world.current_method(), Some(CaptureMethod::MeshClipNoPostProcess));
    }

    #[test]
    fn tracking_origin_attach_latch() {
        let mut world = WorldSession::new();
        let polled = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        world.follow_tracking_origin(polled);
        assert_eq!(world.camera_root(), polled);

        let pinned = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        world.set_tracking_origin(pinned);
        world.follow_tracking_origin(polled);
        world.follow_tracking_origin(Mat4::from_translation(Vec3::new(9.0, 9.0, 9.0)));
        assert_eq!(world.camera_root(), pinned);

        world.clear_tracking_origin();
        world.follow_tracking_origin(polled);
        assert_eq!(world.camera_root(), polled);
    }

    #[test]
    fn camera_queries_compose_with_tracking_origin() {
        let mut world = WorldSession::new();
        world.follow_tracking_origin(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(world.camera_location(), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn captures_compose_with_tracking_origin() {
        let mut fx = Fixture::new();
        let registry = Arc::new(SessionRegistry::new());
        let mut session = PlayerSession::new(registry);
        let mut world = WorldSession::new();
        world.follow_tracking_origin(Mat4::from_translation(Vec3::new(1000.0, 0.0, 0.0)));

        fx.with_host(|host| session.tick(0.016, host, &mut world));

        assert!(session.is_capture_active());
        assert!(!fx.scene.captures().is_empty());
        for capture in fx.scene.captures() {
            assert_eq!(capture.camera_position, Vec3::new(1000.0, 0.0, 0.0));
        }
        assert_eq!(world.camera_location(), Vec3::new(1000.0, 0.0, 0.0));
        assert_eq!(
            world.clip_plane_transform(),
            Mat4::from_translation(Vec3::new(1000.0, 0.0, 0.0))
        );
    }

    #[test]
    fn tracking_origin_moves_between_ticks() {
        let mut fx = Fixture::new();
        let registry = Arc::new(SessionRegistry::new());
        let mut session = PlayerSession::new(registry);
        let mut world = WorldSession::new();

        fx.with_host(|host| session.tick(0.016, host, &mut world));
        assert_eq!(fx.scene.captures()[0].camera_position, Vec3::ZERO);

        fx.scene.clear_captures();
        world.follow_tracking_origin(Mat4::from_translation(Vec3::new(0.0, 500.0, 0.0)));
        fx.with_host(|host| session.tick(0.016, host, &mut world));
        assert_eq!(
            fx.scene.captures()[0].camera_position,
            Vec3::new(0.0, 500.0, 0.0)
        );
    }

    #[test]
    fn activation_aborts_without_compositor_frame() {
        let mut fx = Fixture::without_frames();
        let registry = Arc::new(SessionRegistry::new());
        let mut session = PlayerSession::new(registry.clone());
        let mut world = WorldSession::new();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        session.events().subscribe(move |event| sink.lock().push(event));

        fx.with_host(|host| session.tick(0.016, host, &mut world));

        assert!(!session.is_capture_active());
        assert!(!world.is_active());
        // Leadership goes back so another session can try.
        assert_eq!(registry.leader(), None);
        assert!(events.lock().is_empty());

        // A frame arriving later lets the next poll succeed.
        fx.bridge.push_frame(InputFrame::default());
        fx.with_host(|host| session.tick(CONNECTION_POLL_INTERVAL, host, &mut world));
        assert!(session.is_capture_active());
        assert_eq!(registry.leader(), Some(session.id()));
    }

    #[test]
    fn event_hub_subscribe_and_unsubscribe() {
        let mut hub = EventHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let id = hub.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        hub.emit(CaptureEvent::Activated);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(hub.unsubscribe(id));
        hub.emit(CaptureEvent::Deactivated);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!hub.unsubscribe(id));
    }

    #[test]
    fn global_hub_receives_session_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let id = global_events().lock().subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut fx = Fixture::new();
        let registry = Arc::new(SessionRegistry::new());
        let mut session = PlayerSession::new(registry);
        let mut world = WorldSession::new();
        fx.with_host(|host| session.tick(0.016, host, &mut world));

        // Other tests may emit concurrently; at least our activation
        // must have arrived.
        assert!(count.load(Ordering::SeqCst) >= 1);
        assert!(global_events().lock().unsubscribe(id));
    }
}
