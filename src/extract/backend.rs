//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the handful of PDF operations the
//! extractor needs, isolating the concrete PDF library (PDFium) from the
//! page-image selection logic.

use std::cell::RefCell;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;

use crate::error::{Error, Result};
use crate::model::BlockRect;

/// A PNG-encoded raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// PNG bytes
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// One page of an open document.
pub trait PageSource {
    /// Page number (1-indexed).
    fn number(&self) -> u32;

    /// Plain text of the page.
    fn text(&self) -> Result<String>;

    /// Bounding boxes of image-type content on the page, in page order.
    fn image_blocks(&self) -> Result<Vec<BlockRect>>;

    /// Render the page at `scale`, optionally clipped to `clip`, as PNG.
    fn render(&self, scale: f32, clip: Option<BlockRect>) -> Result<Raster>;
}

/// Abstract interface for opening a document and walking its pages.
///
/// Pages borrow from the open document, so they are handed to a visitor
/// rather than returned.
pub trait PdfBackend {
    /// Open `path` and call `visitor` for every page in order.
    ///
    /// The first error returned by the backend or the visitor stops the walk.
    fn visit_pages(
        &self,
        path: &Path,
        visitor: &mut dyn FnMut(&dyn PageSource) -> Result<()>,
    ) -> Result<()>;
}

// ---------------------------------------------------------------------------
// PdfiumBackend — concrete implementation backed by pdfium-render
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by a dynamically bound PDFium library.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind PDFium from `library_dir`, or from the system library path when `None`.
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        let bindings = match library_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Try the working directory first, then the system library.
    pub fn bind_default() -> Result<Self> {
        Self::bind(Some(Path::new("./"))).or_else(|e| {
            log::debug!("No PDFium in working directory ({}), trying system library", e);
            Self::bind(None)
        })
    }
}

impl PdfBackend for PdfiumBackend {
    fn visit_pages(
        &self,
        path: &Path,
        visitor: &mut dyn FnMut(&dyn PageSource) -> Result<()>,
    ) -> Result<()> {
        let document = self.pdfium.load_pdf_from_file(path, None)?;
        for (index, page) in document.pages().iter().enumerate() {
            let source = PdfiumPage {
                number: index as u32 + 1,
                geometry: page_geometry(&page),
                page,
                raster: RefCell::new(None),
            };
            visitor(&source)?;
        }
        Ok(())
    }
}

struct PdfiumPage<'a> {
    number: u32,
    geometry: PageGeometry,
    page: PdfPage<'a>,
    /// Last full-page render, reused for every crop at the same scale
    raster: RefCell<Option<(f32, DynamicImage)>>,
}

impl PdfiumPage<'_> {
    /// Run `f` on the full-page render at `scale`, rendering only on a cache miss.
    fn with_full_render<T>(
        &self,
        scale: f32,
        f: impl FnOnce(&DynamicImage) -> Result<T>,
    ) -> Result<T> {
        let cached = matches!(self.raster.borrow().as_ref(), Some((s, _)) if *s == scale);
        if !cached {
            let config = PdfRenderConfig::new().scale_page_by_factor(scale);
            let image = self
                .page
                .render_with_config(&config)?
                .as_image()
                .into_dynamic_image()?;
            *self.raster.borrow_mut() = Some((scale, image));
        }

        match self.raster.borrow().as_ref() {
            Some((_, image)) => f(image),
            None => Err(Error::Other(format!("page {} was not rendered", self.number))),
        }
    }
}

impl PageSource for PdfiumPage<'_> {
    fn number(&self) -> u32 {
        self.number
    }

    fn text(&self) -> Result<String> {
        Ok(self.page.text()?.all())
    }

    fn image_blocks(&self) -> Result<Vec<BlockRect>> {
        let mut blocks = Vec::new();
        for object in self.page.objects().iter() {
            if object.object_type() != PdfPageObjectType::Image {
                continue;
            }
            let rect = object.bounds()?.into_pdf_rect();
            let block = BlockRect::new(
                rect.left().value,
                rect.bottom().value,
                rect.width().value,
                rect.height().value,
            );
            // Only the visible part of a block can be cropped
            if let Some(visible) = clip_to_page(&block, &self.geometry) {
                blocks.push(visible);
            }
        }
        Ok(blocks)
    }

    fn render(&self, scale: f32, clip: Option<BlockRect>) -> Result<Raster> {
        self.with_full_render(scale, |image| match clip {
            Some(rect) => {
                let bounds = (image.width(), image.height());
                let (x, y, w, h) = pixel_region(&rect, &self.geometry, scale, bounds)
                    .ok_or_else(|| {
                        Error::Other(format!("empty crop region on page {}", self.number))
                    })?;
                encode_png(&image.crop_imm(x, y, w, h))
            }
            None => encode_png(image),
        })
    }
}

/// Visible area of a page in PDF user space, plus its `/Rotate`.
///
/// PDFium renders only the crop box, turned by the page rotation, so both
/// are needed to find where a user-space rectangle lands in the bitmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageGeometry {
    /// Crop box in unrotated user space
    pub crop_box: BlockRect,
    /// Clockwise rotation in degrees: 0, 90, 180 or 270
    pub rotation: u16,
}

impl PageGeometry {
    #[cfg(test)]
    pub(crate) fn upright(width: f32, height: f32) -> Self {
        Self {
            crop_box: BlockRect::new(0.0, 0.0, width, height),
            rotation: 0,
        }
    }

    /// Map a user-space point to display coordinates in points, with the
    /// origin at the top-left of the rendered page.
    fn to_display(&self, x: f32, y: f32) -> (f32, f32) {
        let width = self.crop_box.width;
        let height = self.crop_box.height;
        let x = x - self.crop_box.left;
        let y = y - self.crop_box.bottom;
        match self.rotation {
            90 => (y, x),
            180 => (width - x, y),
            270 => (height - y, width - x),
            _ => (x, height - y),
        }
    }
}

fn page_geometry(page: &PdfPage<'_>) -> PageGeometry {
    let rotation = match page.rotation() {
        Ok(PdfPageRenderRotation::Degrees90) => 90,
        Ok(PdfPageRenderRotation::Degrees180) => 180,
        Ok(PdfPageRenderRotation::Degrees270) => 270,
        _ => 0,
    };

    let boundaries = page.boundaries();
    let crop_box = boundaries
        .crop()
        .or_else(|_| boundaries.media())
        .map(|boundary| {
            let rect = boundary.bounds;
            BlockRect::new(
                rect.left().value,
                rect.bottom().value,
                rect.width().value,
                rect.height().value,
            )
        })
        .unwrap_or_else(|_| {
            // Reported page size is already rotated
            let (width, height) = (page.width().value, page.height().value);
            if rotation % 180 == 90 {
                BlockRect::new(0.0, 0.0, height, width)
            } else {
                BlockRect::new(0.0, 0.0, width, height)
            }
        });

    PageGeometry { crop_box, rotation }
}

/// Normalizes return types that differ between pdfium-render 0.8 releases.
trait IntoDynamicImage {
    fn into_dynamic_image(self) -> Result<DynamicImage>;
}

impl IntoDynamicImage for DynamicImage {
    fn into_dynamic_image(self) -> Result<DynamicImage> {
        Ok(self)
    }
}

impl IntoDynamicImage for std::result::Result<DynamicImage, PdfiumError> {
    fn into_dynamic_image(self) -> Result<DynamicImage> {
        self.map_err(Error::from)
    }
}

trait IntoPdfRect {
    fn into_pdf_rect(self) -> PdfRect;
}

impl IntoPdfRect for PdfRect {
    fn into_pdf_rect(self) -> PdfRect {
        self
    }
}

impl IntoPdfRect for PdfQuadPoints {
    fn into_pdf_rect(self) -> PdfRect {
        self.to_rect()
    }
}

/// Encode an image as PNG.
pub fn encode_png(image: &DynamicImage) -> Result<Raster> {
    let mut data = Vec::new();
    image.write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;
    Ok(Raster {
        data,
        width: image.width(),
        height: image.height(),
    })
}

/// Intersect a block with the page's crop box. Coordinates stay in user space.
pub(crate) fn clip_to_page(rect: &BlockRect, geometry: &PageGeometry) -> Option<BlockRect> {
    let page = &geometry.crop_box;
    let left = rect.left.max(page.left);
    let bottom = rect.bottom.max(page.bottom);
    let right = (rect.left + rect.width).min(page.left + page.width);
    let top = rect.top().min(page.top());
    if right <= left || top <= bottom {
        return None;
    }
    Some(BlockRect::new(left, bottom, right - left, top - bottom))
}

/// Map a user-space rectangle to a pixel region `(x, y, width, height)` of
/// the page rendered at `scale` (top-left origin).
pub(crate) fn pixel_region(
    rect: &BlockRect,
    geometry: &PageGeometry,
    scale: f32,
    bounds: (u32, u32),
) -> Option<(u32, u32, u32, u32)> {
    let (x1, y1) = geometry.to_display(rect.left, rect.bottom);
    let (x2, y2) = geometry.to_display(rect.left + rect.width, rect.top());

    let left = (x1.min(x2) * scale).floor().max(0.0);
    let top = (y1.min(y2) * scale).floor().max(0.0);
    let right = (x1.max(x2) * scale).ceil().min(bounds.0 as f32);
    let bottom = (y1.max(y2) * scale).ceil().min(bounds.1 as f32);
    if right <= left || bottom <= top {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    const LETTER: (f32, f32) = (612.0, 792.0);

    #[test]
    fn test_pixel_region_flips_y_axis() {
        // 100x100 block in the top-left corner of a Letter page
        let geometry = PageGeometry::upright(LETTER.0, LETTER.1);
        let rect = BlockRect::new(0.0, 692.0, 100.0, 100.0);
        let region = pixel_region(&rect, &geometry, 3.0, (1836, 2376)).unwrap();
        assert_eq!(region, (0, 0, 300, 300));
    }

    #[test]
    fn test_pixel_region_clamps_to_bitmap() {
        let geometry = PageGeometry::upright(LETTER.0, LETTER.1);
        let rect = BlockRect::new(500.0, 0.0, 200.0, 100.0);
        let (x, y, w, h) = pixel_region(&rect, &geometry, 2.0, (1224, 1584)).unwrap();
        assert_eq!((x, y), (1000, 1384));
        assert_eq!(w, 224);
        assert_eq!(h, 200);
    }

    #[test]
    fn test_pixel_region_outside_bitmap() {
        let geometry = PageGeometry::upright(LETTER.0, LETTER.1);
        let rect = BlockRect::new(700.0, 0.0, 50.0, 50.0);
        assert!(pixel_region(&rect, &geometry, 1.0, (612, 792)).is_none());
    }

    #[test]
    fn test_pixel_region_offset_crop_box() {
        // Crop box [36 36 648 828], image in its bottom-left corner
        let geometry = PageGeometry {
            crop_box: BlockRect::new(36.0, 36.0, 612.0, 792.0),
            rotation: 0,
        };
        let rect = BlockRect::new(36.0, 36.0, 200.0, 200.0);
        let region = pixel_region(&rect, &geometry, 3.0, (1836, 2376)).unwrap();
        assert_eq!(region, (0, 1776, 600, 600));
    }

    #[test]
    fn test_pixel_region_rotated_90() {
        // Letter page shown landscape: the bottom-left corner moves to the top-left
        let geometry = PageGeometry {
            crop_box: BlockRect::new(0.0, 0.0, LETTER.0, LETTER.1),
            rotation: 90,
        };
        let rect = BlockRect::new(0.0, 0.0, 100.0, 50.0);
        let region = pixel_region(&rect, &geometry, 2.0, (1584, 1224)).unwrap();
        assert_eq!(region, (0, 0, 100, 200));
    }

    #[test]
    fn test_pixel_region_rotated_180_and_270() {
        let mut geometry = PageGeometry {
            crop_box: BlockRect::new(0.0, 0.0, LETTER.0, LETTER.1),
            rotation: 180,
        };
        let rect = BlockRect::new(0.0, 0.0, 100.0, 50.0);

        // Bottom-left lands top-right
        let region = pixel_region(&rect, &geometry, 1.0, (612, 792)).unwrap();
        assert_eq!(region, (512, 0, 100, 50));

        // Bottom-left lands bottom-right of the landscape bitmap
        geometry.rotation = 270;
        let region = pixel_region(&rect, &geometry, 1.0, (792, 612)).unwrap();
        assert_eq!(region, (742, 512, 50, 100));
    }

    #[test]
    fn test_clip_to_page() {
        let geometry = PageGeometry::upright(LETTER.0, LETTER.1);
        let rect = BlockRect::new(-20.0, 10.0, 100.0, 100.0);
        let clipped = clip_to_page(&rect, &geometry).unwrap();
        assert_eq!(clipped, BlockRect::new(0.0, 10.0, 80.0, 100.0));

        let off_page = BlockRect::new(700.0, 10.0, 100.0, 100.0);
        assert!(clip_to_page(&off_page, &geometry).is_none());
    }

    #[test]
    fn test_clip_to_offset_crop_box() {
        let geometry = PageGeometry {
            crop_box: BlockRect::new(36.0, 36.0, 612.0, 792.0),
            rotation: 0,
        };
        // Bleed area left of and below the crop box is cut away
        let rect = BlockRect::new(0.0, 0.0, 136.0, 136.0);
        let clipped = clip_to_page(&rect, &geometry).unwrap();
        assert_eq!(clipped, BlockRect::new(36.0, 36.0, 100.0, 100.0));

        // Visible in the media box, outside the crop box
        let bleed_only = BlockRect::new(640.0, 40.0, 20.0, 20.0);
        assert!(clip_to_page(&bleed_only, &geometry).is_none());
    }

    #[test]
    fn test_encode_png() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(4, 3));
        let raster = encode_png(&image).unwrap();
        assert_eq!((raster.width, raster.height), (4, 3));
        assert!(raster.data.starts_with(b"\x89PNG"));
    }
}
