//! Full-screen compositing passes.
//!
//! Capture strategies describe their per-frame compositing as a
//! [`PassList`]: an ordered list of full-screen passes, each applying
//! one [`PixelStage`] to a set of input textures and writing one or two
//! outputs. The list is handed to the backend as a unit with
//! [`crate::gpu::GpuBackend::execute`] and has no effect until then.

use super::types::TextureHandle;

/// Per-pixel function applied by a full-screen pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelStage {
    /// `out = (in.rgb, 1 - in.a)`. One input, one output.
    InvertAlpha,
    /// `out = (color.rgb, 1 - mask.a)`. Inputs: color, inverse-opacity
    /// mask. One output.
    CombineAlpha,
    /// Split an un-postprocessed scene into foreground and background.
    ///
    /// Inputs: scene color with depth in alpha, occluded depth in a
    /// single-channel texture. Outputs: foreground (transparent where
    /// the depths differ), background (scene color, opaque).
    ///
    /// Depths are compared with exact float equality. Both depth inputs
    /// must come from captures of the same scene at the same pose in
    /// the same tick, which yields bit-identical values where no
    /// occluder intervenes.
    ForegroundSegmentation,
    /// Split a post-processed scene into foreground and background.
    ///
    /// Inputs: post-processed color, scene depth, occluded depth.
    /// Outputs and depth comparison as in `ForegroundSegmentation`.
    ForegroundSegmentationPostProcessed,
}

impl PixelStage {
    /// Number of input textures the stage samples.
    pub fn input_count(&self) -> usize {
        match self {
            Self::InvertAlpha => 1,
            Self::CombineAlpha => 2,
            Self::ForegroundSegmentation => 2,
            Self::ForegroundSegmentationPostProcessed => 3,
        }
    }

    /// Number of output textures the stage writes.
    pub fn output_count(&self) -> usize {
        match self {
            Self::InvertAlpha | Self::CombineAlpha => 1,
            Self::ForegroundSegmentation | Self::ForegroundSegmentationPostProcessed => 2,
        }
    }
}

/// One full-screen pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullScreenPass {
    pub stage: PixelStage,
    pub inputs: Vec<TextureHandle>,
    pub outputs: Vec<TextureHandle>,
}

impl FullScreenPass {
    pub fn new(stage: PixelStage) -> Self {
        Self {
            stage,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: TextureHandle) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: TextureHandle) -> Self {
        self.outputs.push(output);
        self
    }

    /// Checks input and output arity against the stage.
    pub fn is_complete(&self) -> bool {
        self.inputs.len() == self.stage.input_count()
            && self.outputs.len() == self.stage.output_count()
    }
}

/// Ordered list of full-screen passes, executed as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassList {
    passes: Vec<FullScreenPass>,
}

impl PassList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pass: FullScreenPass) {
        debug_assert!(pass.is_complete(), "pass arity mismatch for {:?}", pass.stage);
        self.passes.push(pass);
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FullScreenPass> {
        self.passes.iter()
    }

    pub fn clear(&mut self) {
        self.passes.clear();
    }
}
