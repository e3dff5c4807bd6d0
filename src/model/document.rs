//! Document-level types.

use super::{Page, PageImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The extracted knowledge base: page-tagged text plus the page image index.
///
/// Built once by the extractor and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentContext {
    /// Concatenation of every page's tagged text, in page order
    pub full_text: String,

    /// Number of pages processed
    pub page_count: u32,

    /// Page number → images, only for pages with at least one image
    pub page_images: BTreeMap<u32, Vec<PageImage>>,
}

impl DocumentContext {
    /// The context used when extraction fails: no text, no images.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a page. Pages must be pushed in order.
    pub fn push_page(&mut self, page: Page) {
        self.full_text.push_str(&page.tagged_text());
        self.page_count = page.number;
        if !page.images.is_empty() {
            self.page_images.insert(page.number, page.images);
        }
    }

    /// Images recorded for a cited page.
    pub fn images_for(&self, page: u32) -> Option<&[PageImage]> {
        self.page_images.get(&page).map(Vec::as_slice)
    }

    /// Whether nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.page_count == 0 && self.full_text.is_empty()
    }

    /// Total number of images across all pages.
    pub fn image_count(&self) -> usize {
        self.page_images.values().map(Vec::len).sum()
    }
}
