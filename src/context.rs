//! Capture exclusion context.
//!
//! Games hide objects from the mixed-reality output without hiding
//! them from the player's view: the local avatar, UI widgets attached
//! to controllers, spectator-only props. The [`CaptureContext`] keeps
//! the exclude list and stamps it onto every capture request a
//! strategy issues.

use std::collections::BTreeSet;

use crate::scene::{CaptureRequest, ObjectId};

/// Set of world objects excluded from capture.
///
/// Hide and show are idempotent; hiding an object twice and showing it
/// once leaves it visible again.
#[derive(Debug, Clone, Default)]
pub struct CaptureContext {
    hidden: BTreeSet<ObjectId>,
}

impl CaptureContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude an object from capture output.
    pub fn hide(&mut self, id: ObjectId) {
        if self.hidden.insert(id) {
            log::debug!("capture context: hide object {}", id.0);
        }
    }

    /// Stop excluding an object.
    pub fn show(&mut self, id: ObjectId) {
        if self.hidden.remove(&id) {
            log::debug!("capture context: show object {}", id.0);
        }
    }

    pub fn is_hidden(&self, id: ObjectId) -> bool {
        self.hidden.contains(&id)
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    /// Drop all exclusions.
    pub fn clear(&mut self) {
        self.hidden.clear();
    }

    /// Stamp the exclude list onto a capture request.
    pub fn apply(&self, request: &mut CaptureRequest) {
        request.hidden.extend(self.hidden.iter().copied());
    }
}
