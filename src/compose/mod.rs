//! Document compositions built on the paginator and the image pipeline.
//!
//! A [`Composer`] is constructed once with its image source and handed the
//! listing data per build; it holds no state between builds.

mod brochure;
mod furniture;
mod sheet;

pub use brochure::{brochure_file_name, card_slot, BrochureLayout, BrochureOptions, CardSlot};
pub use furniture::{Branding, PageFurniture};
pub use sheet::SheetLayout;

use crate::batch::{BatchProcessor, Processed};
use crate::document::{Document, TextStyle, FAINT, PLACEHOLDER};
use crate::error::{BuildFailure, Result};
use crate::fetch::ImageSource;
use crate::fonts::Font;
use crate::parse::PageSize;

pub const IMAGE_NOT_AVAILABLE: &str = "Image not available";

const PLACEHOLDER_TEXT: TextStyle = TextStyle::new(Font::Helvetica, 12.0, FAINT);

/// A finished document and the name it should be saved under.
#[derive(Debug, Clone)]
pub struct Export {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct Composer<S> {
    processor: BatchProcessor<S>,
    branding: Branding,
    page_size: PageSize,
}

impl<S: ImageSource> Composer<S> {
    pub fn new(processor: BatchProcessor<S>) -> Self {
        Composer {
            processor,
            branding: Branding::default(),
            page_size: PageSize::default(),
        }
    }

    pub fn with_branding(mut self, branding: Branding) -> Self {
        self.branding = branding;
        self
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    /// Fresh document plus furniture; the logo is fetched once per build.
    async fn start(&self) -> Result<(Document, PageFurniture)> {
        let mut doc = Document::new(self.page_size);
        let logo = match &self.branding.logo_url {
            Some(url) => self
                .processor
                .fetch_normalized(url)
                .await?
                .map(|asset| doc.add_image(asset)),
            None => None,
        };
        Ok((doc, PageFurniture::new(self.branding.clone(), logo)))
    }

    /// Compose and serialize a spec sheet for one listing.
    pub async fn export_spec_sheet(
        &self,
        listing: &crate::listing::ListingSnapshot,
        layout: &SheetLayout,
    ) -> std::result::Result<Export, BuildFailure> {
        let doc = self.spec_sheet(listing, layout).await?;
        Ok(Export {
            file_name: listing.file_name(),
            bytes: doc.finish()?,
        })
    }

    /// Compose and serialize a brochure of the given entries, in order.
    pub async fn export_brochure(
        &self,
        entries: &[crate::listing::BrochureEntry],
        options: &BrochureOptions,
    ) -> std::result::Result<Export, BuildFailure> {
        let doc = self.brochure(entries, options).await?;
        Ok(Export {
            file_name: brochure_file_name(&self.branding.company, chrono::Utc::now().date_naive()),
            bytes: doc.finish()?,
        })
    }
}

/// Place a processed image, or a filled box saying it is missing.
fn image_or_placeholder(doc: &mut Document, image: Processed, x: f32, y: f32, width: f32, height: f32) {
    match image {
        Some(asset) => {
            let image = doc.add_image(asset);
            doc.place_image(image, x, y, width, height);
        }
        None => {
            doc.rect(x, y, width, height, PLACEHOLDER);
            doc.text_centered_in(IMAGE_NOT_AVAILABLE, x, width, y + height / 2.0, PLACEHOLDER_TEXT);
        }
    }
}
