//! Compositor bridge contract.
//!
//! The bridge is the process boundary between the engine and the
//! external compositor. The engine polls it once per tick: if the
//! compositor is active and a new [`InputFrame`] is available, the
//! capture pipeline renders its outputs and hands them back through
//! [`Bridge::add_texture`] and [`Bridge::submit`].
//!
//! Texture handoff is by native GPU handle. All pending GPU work for a
//! handed-off texture must be flushed before `add_texture` is called;
//! the compositor samples the texture on its own timeline.

use crate::error::CaptureError;
use crate::frame::InputFrame;
use crate::gpu::TextureFormat;

/// What a submitted texture means to the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSemantic {
    /// Scene content in front of the clip plane, with opacity in alpha.
    Foreground,
    /// Full scene behind (and including) the clip plane.
    Background,
}

/// Color space the compositor should interpret a submitted texture in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

/// One texture handed to the compositor.
///
/// `height` is signed: a negative value tells the compositor the image
/// is vertically flipped relative to its own convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSubmission {
    pub semantic: TextureSemantic,
    pub native_handle: u64,
    pub width: u32,
    pub height: i32,
    pub format: TextureFormat,
    pub color_space: ColorSpace,
}

/// Connection to the external compositor.
pub trait Bridge {
    /// Load the bridge runtime. Idempotent.
    fn load(&mut self) -> Result<(), CaptureError>;

    /// Tear the bridge runtime down. Idempotent.
    fn unload(&mut self);

    /// Last error reported by the bridge runtime, if any.
    fn last_error(&self) -> Option<String>;

    /// Whether a compositor is connected and wants frames.
    fn is_active(&self) -> bool;

    /// Fetch the input frame for this tick. `None` means the compositor
    /// had no frame ready; the caller should skip capture this tick.
    fn input_frame(&mut self) -> Option<InputFrame>;

    /// Begin a submission. Must precede any `add_texture` call for the
    /// current frame.
    fn start_frame(&mut self) -> Result<(), CaptureError>;

    /// Hand one output texture to the compositor.
    fn add_texture(&mut self, submission: TextureSubmission) -> Result<(), CaptureError>;

    /// Finish the submission started by `start_frame`.
    fn submit(&mut self) -> Result<(), CaptureError>;
}

/// In-process bridge double that records every call.
///
/// Used by the crate's own tests and useful for integration tests of
/// code layered on the capture pipeline.
#[derive(Default)]
pub struct MockBridge {
    loaded: bool,
    active: bool,
    error: Option<String>,
    pending_frames: Vec<Option<InputFrame>>,
    last_frame: Option<InputFrame>,
    started: usize,
    in_frame: bool,
    current: Vec<TextureSubmission>,
    submissions: Vec<Vec<TextureSubmission>>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle compositor presence.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Queue a frame to return from `input_frame`. Frames are returned
    /// in push order; once the queue drains the last delivered frame
    /// repeats until the next push.
    pub fn push_frame(&mut self, frame: InputFrame) {
        self.pending_frames.push(Some(frame));
    }

    /// Queue a frame miss. The corresponding `input_frame` call returns
    /// `None`.
    pub fn push_frame_miss(&mut self) {
        self.pending_frames.push(None);
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn frames_started(&self) -> usize {
        self.started
    }

    /// Completed submissions, one entry per `submit` call.
    pub fn submissions(&self) -> &[Vec<TextureSubmission>] {
        &self.submissions
    }

    pub fn last_submission(&self) -> Option<&[TextureSubmission]> {
        self.submissions.last().map(Vec::as_slice)
    }
}

impl Bridge for MockBridge {
    fn load(&mut self) -> Result<(), CaptureError> {
        self.loaded = true;
        Ok(())
    }

    fn unload(&mut self) {
        self.loaded = false;
        self.in_frame = false;
        self.current.clear();
    }

    fn last_error(&self) -> Option<String> {
        self.error.clone()
    }

    fn is_active(&self) -> bool {
        self.loaded && self.active
    }

    fn input_frame(&mut self) -> Option<InputFrame> {
        if self.pending_frames.is_empty() {
            return self.last_frame;
        }
        let next = self.pending_frames.remove(0);
        if next.is_some() {
            self.last_frame = next;
        }
        next
    }

    fn start_frame(&mut self) -> Result<(), CaptureError> {
        if !self.loaded {
            return Err(CaptureError::Internal("bridge not loaded".into()));
        }
        self.started += 1;
        self.in_frame = true;
        Ok(())
    }

    fn add_texture(&mut self, submission: TextureSubmission) -> Result<(), CaptureError> {
        if !self.in_frame {
            return Err(CaptureError::Internal(
                "add_texture outside start_frame/submit".into(),
            ));
        }
        self.current.push(submission);
        Ok(())
    }

    fn submit(&mut self) -> Result<(), CaptureError> {
        if !self.in_frame {
            return Err(CaptureError::Internal("submit without start_frame".into()));
        }
        self.in_frame = false;
        self.submissions.push(std::mem::take(&mut self.current));
        Ok(())
    }
}
