//! Page-level types.

use serde::{Deserialize, Serialize};

/// A rectangle on a page in PDF points (1 point = 1/72 inch).
///
/// The origin is the bottom-left corner of the page, as in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockRect {
    /// Left edge
    pub left: f32,
    /// Bottom edge
    pub bottom: f32,
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
}

impl BlockRect {
    /// Create a rectangle from its bottom-left corner and size.
    pub fn new(left: f32, bottom: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            bottom,
            width,
            height,
        }
    }

    /// Top edge in points.
    pub fn top(&self) -> f32 {
        self.bottom + self.height
    }

    /// Whether both sides are strictly larger than `min`.
    pub fn exceeds(&self, min: f32) -> bool {
        self.width > min && self.height > min
    }
}

/// Where a page image came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Cropped render of an image block
    Crop {
        /// Cropped region in points
        rect: BlockRect,
    },
    /// Whole-page render, used when no image block qualified
    FullPage,
}

/// A PNG raster associated with a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageImage {
    /// PNG-encoded bytes
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// How the image was produced
    pub source: ImageSource,
}

impl PageImage {
    /// Create a page image from PNG bytes.
    pub fn png(data: Vec<u8>, width: u32, height: u32, source: ImageSource) -> Self {
        Self {
            data,
            width,
            height,
            source,
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        "image/png"
    }

    /// Whether this is the whole-page fallback render.
    pub fn is_full_page(&self) -> bool {
        matches!(self.source, ImageSource::FullPage)
    }

    /// Suggested filename for saving, e.g. `page-3-1.png`.
    pub fn suggested_filename(&self, page: u32, index: usize) -> String {
        format!("page-{}-{}.png", page, index + 1)
    }
}

/// A single extracted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Plain text of the page, possibly empty
    pub text: String,

    /// Images in page order
    pub images: Vec<PageImage>,
}

impl Page {
    /// Create a page with no images yet.
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            images: Vec::new(),
        }
    }

    /// Page text wrapped in its start/end markers.
    ///
    /// The markers are the only way the model learns which page it is
    /// reading, so their format must match the `[PAGE: N]` instruction.
    pub fn tagged_text(&self) -> String {
        format!(
            "\n{}\n{}\n{}\n",
            start_marker(self.number),
            self.text,
            end_marker(self.number)
        )
    }
}

/// `[--- Page N START ---]`
pub fn start_marker(page: u32) -> String {
    format!("[--- Page {} START ---]", page)
}

/// `[--- Page N END ---]`
pub fn end_marker(page: u32) -> String {
    format!("[--- Page {} END ---]", page)
}
