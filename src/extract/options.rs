//! Extraction options.

/// Options controlling text normalization and page image selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Image blocks must be strictly wider and taller than this (points)
    pub min_block_size: f32,

    /// Render scale for cropped image blocks
    pub crop_scale: f32,

    /// Render scale for the whole-page fallback
    pub fallback_scale: f32,

    /// Apply Unicode NFC normalization to page text
    pub normalize_text: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum image block size in points.
    pub fn with_min_block_size(mut self, points: f32) -> Self {
        self.min_block_size = points;
        self
    }

    /// Set the crop render scale.
    pub fn with_crop_scale(mut self, scale: f32) -> Self {
        self.crop_scale = scale;
        self
    }

    /// Set the fallback render scale.
    pub fn with_fallback_scale(mut self, scale: f32) -> Self {
        self.fallback_scale = scale;
        self
    }

    /// Keep page text exactly as the PDF library returns it.
    pub fn raw_text(mut self) -> Self {
        self.normalize_text = false;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_block_size: 50.0,
            crop_scale: 3.0,
            fallback_scale: 2.0,
            normalize_text: true,
        }
    }
}
