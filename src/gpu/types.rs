//! Texture types and descriptors.

use bitflags::bitflags;

/// Texture format enumeration.
///
/// Only the formats the capture pipeline allocates are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    /// 16-bit red channel, float. Used for depth-only captures.
    R16Float,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB. The compositor handoff format.
    Rgba8UnormSrgb,
    /// 16-bit RGBA channels, float. Used for HDR scene color.
    Rgba16Float,
    /// 32-bit RGBA channels, float.
    Rgba32Float,
}

impl TextureFormat {
    /// Returns true if this format stores a single channel.
    pub fn is_single_channel(&self) -> bool {
        matches!(self, Self::R16Float)
    }

    /// Size of one texel in bytes.
    pub fn texel_size(&self) -> u32 {
        match self {
            Self::R16Float => 2,
            Self::Rgba8Unorm | Self::Rgba8UnormSrgb => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }
}

bitflags! {
    /// How a texture may be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be sampled in a pass.
        const SAMPLED = 1 << 0;
        /// Texture can be bound as a pass output.
        const RENDER_TARGET = 1 << 1;
        /// Texture can be a scene capture destination.
        const CAPTURE_TARGET = 1 << 2;
        /// Texture can be shared with the compositor by native handle.
        const SHARED = 1 << 3;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        TextureUsage::SAMPLED | TextureUsage::RENDER_TARGET
    }
}

/// Description of a texture to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            label: None,
            width,
            height,
            format: TextureFormat::default(),
            usage: TextureUsage::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_usage(mut self, usage: TextureUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Opaque handle to a texture owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

impl TextureHandle {
    /// Wrap a backend-assigned id. Only meaningful to the backend that
    /// issued it.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}
