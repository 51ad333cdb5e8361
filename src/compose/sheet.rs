//! Single-listing spec sheet.
//!
//! Page one carries the headline: name and location, hero photo, price,
//! a specification grid and two secondary photos pinned above the footer.
//! Following pages hold the gallery, the description and the equipment
//! list, all flowed through the paginator.

use super::{image_or_placeholder, Composer};
use crate::batch::ImageRequest;
use crate::document::{Document, TextStyle, BODY, DIVIDER, INK, MUTED};
use crate::error::Result;
use crate::fetch::ImageSource;
use crate::fonts::{wrap_text, Font};
use crate::layout::{Furniture, Margins, Paginator};
use crate::listing::{format_price, ListingSnapshot};

const TITLE: TextStyle = TextStyle::new(Font::Times, 24.0, INK);
const SUBTITLE: TextStyle = TextStyle::new(Font::Helvetica, 12.0, MUTED);
const PRICE: TextStyle = TextStyle::new(Font::Helvetica, 20.0, INK);
const SECTION: TextStyle = TextStyle::new(Font::Times, 20.0, INK);
const SPEC_LABEL: TextStyle = TextStyle::new(Font::Helvetica, 10.0, MUTED);
const SPEC_VALUE: TextStyle = TextStyle::new(Font::Helvetica, 12.0, INK);
const DESCRIPTION: TextStyle = TextStyle::new(Font::Helvetica, 11.0, BODY);
const EQUIPMENT: TextStyle = TextStyle::new(Font::Helvetica, 10.0, BODY);

/// Geometry of a spec sheet, in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub margins: Margins,
    /// hero width as a share of the content width
    pub hero_width_share: f32,
    pub hero_height: f32,
    pub hero_rounded: bool,
    /// at most this many secondary photos sit above the first footer
    pub secondary_count: usize,
    pub secondary_height: f32,
    pub secondary_rounded: bool,
    pub spec_columns: usize,
    pub spec_row_height: f32,
    pub gallery_columns: usize,
    pub gallery_spacing: f32,
    /// gallery cell height / width
    pub gallery_height_ratio: f32,
    /// leading photos left out of the gallery because page one shows them
    pub gallery_skip: usize,
    pub gallery_rounded: bool,
    /// space kept free on the right of the description column
    pub description_padding: f32,
    pub line_height: f32,
    /// room a section heading needs below it to stay on the current page
    pub keep_with_next: f32,
    pub equipment_columns: usize,
    pub equipment_row_height: f32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        SheetLayout {
            margins: Margins::default(),
            hero_width_share: 0.8,
            hero_height: 65.0,
            hero_rounded: false,
            secondary_count: 2,
            secondary_height: 45.0,
            secondary_rounded: true,
            spec_columns: 3,
            spec_row_height: 20.0,
            gallery_columns: 2,
            gallery_spacing: 5.0,
            gallery_height_ratio: 2.0 / 3.0,
            gallery_skip: 2,
            gallery_rounded: true,
            description_padding: 30.0,
            line_height: 5.0,
            keep_with_next: 65.0,
            equipment_columns: 2,
            equipment_row_height: 7.0,
        }
    }
}

/// The six headline specifications, label and display value.
pub(crate) fn spec_grid(listing: &ListingSnapshot) -> Vec<(&'static str, String)> {
    vec![
        ("Year", listing.year.clone()),
        (
            "Engine hours",
            listing.engine_hours.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("Engines", listing.engines.clone()),
        ("LOA", format!("{} m", listing.size_meters)),
        ("Beam", format!("{} m", listing.beam_meters)),
        ("Propulsion type", listing.propulsion_type.clone()),
    ]
}

impl<S: ImageSource> Composer<S> {
    /// Lay out a spec sheet for `listing`.
    pub async fn spec_sheet(&self, listing: &ListingSnapshot, layout: &SheetLayout) -> Result<Document> {
        let (mut doc, furniture) = self.start().await?;
        doc.set_title(listing.name.as_str());
        let mut pages = Paginator::new(doc, furniture, layout.margins);
        let left = pages.cursor().left();
        let content_width = pages.cursor().content_width();
        let page_height = pages.document().height();

        pages.place(8.0, |doc, y| doc.centered_text(&listing.name, y, TITLE))?;
        let location = format!("Location: {}", listing.location);
        pages.place(12.0, |doc, y| doc.centered_text(&location, y, SUBTITLE))?;

        // hero
        let hero_width = content_width * layout.hero_width_share;
        let hero = self
            .processor
            .process_one(
                ImageRequest::new(listing.main_photo.as_str(), hero_width / layout.hero_height)
                    .rounded(layout.hero_rounded),
            )
            .await?;
        let hero_x = left + (content_width - hero_width) / 2.0;
        pages.place(layout.hero_height + 15.0, |doc, y| {
            image_or_placeholder(doc, hero, hero_x, y, hero_width, layout.hero_height)
        })?;

        let price = format_price(&listing.price);
        pages.place(8.0, |doc, y| doc.centered_text(&price, y, PRICE))?;
        pages.place(10.0, |doc, y| {
            doc.centered_text(listing.tax_status.sheet_label(), y, SUBTITLE)
        })?;

        // secondary photos, pinned above the footer of page one
        let secondary_urls: Vec<&String> = listing.other_photos.iter().take(layout.secondary_count).collect();
        if !secondary_urls.is_empty() {
            let slots = layout.secondary_count.max(1) as f32;
            let width = (content_width - (slots - 1.0) * layout.gallery_spacing) / slots;
            let requests: Vec<ImageRequest> = secondary_urls
                .iter()
                .map(|url| {
                    ImageRequest::new(url.as_str(), width / layout.secondary_height)
                        .rounded(layout.secondary_rounded)
                })
                .collect();
            let images = self.processor.process(&requests).await?;
            let y = page_height - layout.margins.bottom - layout.secondary_height;
            for (i, image) in images.into_iter().enumerate() {
                let x = left + i as f32 * (width + layout.gallery_spacing);
                image_or_placeholder(pages.doc_mut(), image, x, y, width, layout.secondary_height);
            }
        }

        pages.place(15.0, |doc, y| {
            doc.line(left, y, left + content_width, y, 0.5, DIVIDER)
        })?;

        // specification grid
        let specs = spec_grid(listing);
        let columns = layout.spec_columns.max(1);
        let col_width = content_width / columns as f32;
        let rows = specs.len().div_ceil(columns);
        pages.place(rows as f32 * layout.spec_row_height + 5.0, |doc, y| {
            for (i, (label, value)) in specs.iter().enumerate() {
                let x = left + (i % columns) as f32 * col_width;
                let row_y = y + (i / columns) as f32 * layout.spec_row_height;
                doc.text(*label, x, row_y, SPEC_LABEL);
                doc.text(value.as_str(), x, row_y + 6.0, SPEC_VALUE);
            }
        })?;

        pages.new_page();

        let gallery_drawn = self.gallery(&mut pages, listing, layout).await?;

        let description = listing.description.trim();
        if !description.is_empty() {
            if gallery_drawn {
                if pages.fits(layout.keep_with_next)? {
                    pages.advance(20.0)?;
                } else {
                    pages.new_page();
                }
            }
            pages.place(15.0, |doc, y| doc.text("Description", left, y, SECTION))?;
            let width_pt = (content_width - layout.description_padding) * 72.0 / 25.4;
            let lines = wrap_text(description, DESCRIPTION.font, DESCRIPTION.size, width_pt);
            pages.text_lines(&lines, left, layout.line_height, DESCRIPTION)?;
        }

        let equipment = listing.equipment_labels();
        if !equipment.is_empty() {
            let columns = layout.equipment_columns.max(1);
            if pages.y() > pages.cursor().top() {
                pages.advance(15.0)?;
            }
            // heading stays with its first row
            if !pages.fits(15.0 + layout.equipment_row_height)? {
                pages.new_page();
            }
            pages.place(15.0, |doc, y| doc.text("Equipment", left, y, SECTION))?;
            let col_width = content_width / columns as f32;
            for row in equipment.chunks(columns) {
                pages.place(layout.equipment_row_height, |doc, y| {
                    for (i, item) in row.iter().enumerate() {
                        let x = left + i as f32 * col_width;
                        doc.rect(x, y - 2.2, 2.2, 2.2, INK);
                        doc.text(item.as_str(), x + 5.0, y, EQUIPMENT);
                    }
                })?;
            }
        }

        Ok(pages.finish())
    }

    /// Gallery rows on the current page and onwards. Returns whether
    /// anything was drawn.
    async fn gallery<F: Furniture>(
        &self,
        pages: &mut Paginator<F>,
        listing: &ListingSnapshot,
        layout: &SheetLayout,
    ) -> Result<bool> {
        let photos: Vec<&String> = listing.other_photos.iter().skip(layout.gallery_skip).collect();
        if photos.is_empty() {
            return Ok(false);
        }
        let left = pages.cursor().left();
        let columns = layout.gallery_columns.max(1);
        let width = (pages.cursor().content_width() - (columns - 1) as f32 * layout.gallery_spacing)
            / columns as f32;
        let height = width * layout.gallery_height_ratio;

        let requests: Vec<ImageRequest> = photos
            .iter()
            .map(|url| ImageRequest::new(url.as_str(), width / height).rounded(layout.gallery_rounded))
            .collect();
        let images = self.processor.process(&requests).await?;

        pages.place(20.0, |doc, y| doc.text("Gallery", left, y, SECTION))?;
        let mut images = images.into_iter().peekable();
        while images.peek().is_some() {
            let row: Vec<_> = images.by_ref().take(columns).collect();
            pages.place(height + layout.gallery_spacing, |doc, y| {
                for (i, image) in row.into_iter().enumerate() {
                    let x = left + i as f32 * (width + layout.gallery_spacing);
                    image_or_placeholder(doc, image, x, y, width, height);
                }
            })?;
        }
        Ok(true)
    }
}
