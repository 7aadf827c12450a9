//! Mixed-reality capture and compositing pipeline.
//!
//! `mixcap` renders a game scene into foreground and background layers
//! for an external mixed-reality compositor. Each tick the pipeline
//! polls the compositor [`bridge`](crate::bridge) for an input frame,
//! places the camera and clip plane from it, takes the scene captures
//! its configured [`capture`](crate::capture) strategy needs, runs the
//! compositing passes on the [`gpu`](crate::gpu) backend and hands the
//! results back over the bridge.
//!
//! # Layers
//!
//! - [`convert`]: compositor-space to engine-space math.
//! - [`frame`], [`bridge`]: compositor input and handoff contract.
//! - [`gpu`], [`scene`]: device and scene rendering seams.
//! - [`clip_plane`], [`context`], [`capture`]: the four capture
//!   strategies and their shared state.
//! - [`session`]: lifecycle, leader election and events.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mixcap::bridge::MockBridge;
//! use mixcap::capture::CaptureHost;
//! use mixcap::context::CaptureContext;
//! use mixcap::gpu::cpu::CpuBackend;
//! use mixcap::scene::StaticScene;
//! use mixcap::session::{PlayerSession, SessionRegistry, WorldSession};
//! use mixcap::settings::CaptureSettings;
//!
//! let backend = Arc::new(CpuBackend::new());
//! let mut scene = StaticScene::new(backend.clone());
//! let mut bridge = MockBridge::new();
//! let context = CaptureContext::new();
//! let settings = CaptureSettings::default();
//!
//! let registry = Arc::new(SessionRegistry::new());
//! let mut session = PlayerSession::new(registry);
//! let mut world = WorldSession::new();
//!
//! loop {
//!     let mut host = CaptureHost {
//!         gpu: backend.as_ref(),
//!         scene: &mut scene,
//!         bridge: &mut bridge,
//!         context: &context,
//!         settings: &settings,
//!     };
//!     session.tick(0.016, &mut host, &mut world);
//! }
//! ```

pub mod bridge;
pub mod capture;
pub mod clip_plane;
pub mod context;
pub mod convert;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod scene;
pub mod session;
pub mod settings;

pub use bridge::{Bridge, ColorSpace, TextureSemantic, TextureSubmission};
pub use capture::{create_strategy, CaptureHost, CaptureRig, CaptureStrategy};
pub use context::CaptureContext;
pub use error::CaptureError;
pub use frame::{FrameFeatures, InputFrame, Pose};
pub use session::{CaptureEvent, PlayerSession, SessionRegistry, WorldSession};
pub use settings::{CaptureMethod, CaptureSettings};
