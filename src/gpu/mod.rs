//! GPU backend abstraction layer.
//!
//! The capture pipeline talks to the GPU through the [`GpuBackend`]
//! trait: texture lifetime, full-screen pass execution and the flush
//! that must precede handing a texture across the process boundary.
//!
//! [`cpu::CpuBackend`] is a reference software implementation used by
//! the crate's tests; production integrations supply their own backend
//! over the engine's RHI.

pub mod cpu;
pub mod pass;
pub mod targets;
pub mod types;

pub use pass::{FullScreenPass, PassList, PixelStage};
pub use targets::{RenderTarget, RenderTargetSet};
pub use types::{TextureDescriptor, TextureFormat, TextureHandle, TextureUsage};

use crate::error::CaptureError;

/// Backend over a GPU device.
///
/// Methods take `&self`; implementations are internally synchronized.
pub trait GpuBackend {
    /// Allocate a texture. The handle stays valid until
    /// [`destroy_texture`](Self::destroy_texture).
    fn create_texture(&self, desc: &TextureDescriptor) -> Result<TextureHandle, CaptureError>;

    /// Release a texture. Unknown handles are ignored.
    fn destroy_texture(&self, handle: TextureHandle);

    /// Descriptor the texture was created with.
    fn texture_descriptor(&self, handle: TextureHandle) -> Option<TextureDescriptor>;

    /// Platform handle for sharing the texture with another process.
    fn native_handle(&self, handle: TextureHandle) -> Option<u64>;

    /// Run a pass list. Passes execute in order; nothing runs before
    /// this call.
    fn execute(&self, passes: &PassList) -> Result<(), CaptureError>;

    /// Block until all previously submitted GPU work has completed.
    ///
    /// Required before a texture's native handle is handed to the
    /// compositor.
    fn flush(&self);
}
