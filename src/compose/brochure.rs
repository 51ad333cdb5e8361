use chrono::NaiveDate;

use super::{image_or_placeholder, Composer};
use crate::batch::ImageRequest;
use crate::document::{Document, TextStyle, INK, MUTED};
use crate::error::{Error, Result};
use crate::fetch::ImageSource;
use crate::fonts::Font;
use crate::layout::{Margins, Paginator};
use crate::listing::{format_price, truncate_name, BrochureEntry};
use crate::parse::PageSize;

const TITLE: TextStyle = TextStyle::new(Font::Times, 24.0, INK);
const SUBTITLE: TextStyle = TextStyle::new(Font::Times, 16.0, MUTED);
const CARD_NAME: TextStyle = TextStyle::new(Font::Helvetica, 12.0, INK);
const CARD_DETAILS: TextStyle = TextStyle::new(Font::Helvetica, 10.0, MUTED);

/// Card grid geometry, in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct BrochureLayout {
    pub margins: Margins,
    pub columns: usize,
    pub rows: usize,
    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,
    /// page height not shared out between card rows
    pub content_reserve: f32,
    /// taken off every card on page one to make room for the banner
    pub first_page_allowance: f32,
    /// y of the first card row on page one
    pub first_page_start: f32,
    pub title_y: f32,
    pub subtitle_y: f32,
    /// image height / card height
    pub image_share: f32,
    pub image_rounded: bool,
    /// names longer than this are cut and end in "..."
    pub name_limit: usize,
    /// below the image to the name baseline
    pub text_gap: f32,
    /// name baseline to details baseline
    pub line_gap: f32,
}

impl Default for BrochureLayout {
    fn default() -> Self {
        BrochureLayout {
            margins: Margins::default(),
            columns: 2,
            rows: 3,
            horizontal_spacing: 6.0,
            vertical_spacing: 0.0,
            content_reserve: 60.0,
            first_page_allowance: 10.0,
            first_page_start: 61.0,
            title_y: 41.0,
            subtitle_y: 51.0,
            image_share: 0.65,
            image_rounded: false,
            name_limit: 30,
            text_gap: 6.0,
            line_gap: 8.0,
        }
    }
}

impl BrochureLayout {
    pub fn cards_per_page(&self) -> usize {
        self.columns.max(1) * self.rows.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct BrochureOptions {
    pub title: String,
    pub subtitle: String,
    pub layout: BrochureLayout,
}

impl Default for BrochureOptions {
    fn default() -> Self {
        BrochureOptions {
            title: "Nova Yachts".to_string(),
            subtitle: "Collection".to_string(),
            layout: BrochureLayout::default(),
        }
    }
}

/// Where one card goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardSlot {
    /// 1-based
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub image_height: f32,
}

impl CardSlot {
    pub fn image_ratio(&self) -> f32 {
        self.width / self.image_height
    }
}

/// Slot of the `index`-th card (0-based) in a brochure.
pub fn card_slot(index: usize, page_size: PageSize, layout: &BrochureLayout) -> CardSlot {
    let (page_width, page_height) = page_size.dimensions_mm();
    let columns = layout.columns.max(1);
    let rows = layout.rows.max(1);
    let per_page = columns * rows;
    let page = index / per_page;
    let within = index % per_page;

    let content_width = page_width - 2.0 * layout.margins.side;
    let width = (content_width - (columns - 1) as f32 * layout.horizontal_spacing) / columns as f32;
    let mut height = (page_height - layout.content_reserve) / rows as f32;
    let start = if page == 0 {
        height -= layout.first_page_allowance;
        layout.first_page_start
    } else {
        layout.margins.top
    };

    let column = within % columns;
    let row = within / columns;
    CardSlot {
        page: page + 1,
        x: layout.margins.side + column as f32 * (width + layout.horizontal_spacing),
        y: start + row as f32 * (height + layout.vertical_spacing),
        width,
        height,
        image_height: height * layout.image_share,
    }
}

/// `Nova Yachts` on 2024-03-09 -> `Nova-Yachts-Brochure-2024-03-09.pdf`
pub fn brochure_file_name(company: &str, date: NaiveDate) -> String {
    let company = company.split_whitespace().collect::<Vec<_>>().join("-");
    format!("{}-Brochure-{}.pdf", company, date.format("%Y-%m-%d"))
}

fn details_line(entry: &BrochureEntry) -> String {
    format!(
        "{} \u{2022} {} ({})",
        entry.year,
        format_price(&entry.price),
        entry.tax_status.card_label()
    )
}

impl<S: ImageSource> Composer<S> {
    /// Lay out a brochure with one card per entry, in the order given.
    pub async fn brochure(&self, entries: &[BrochureEntry], options: &BrochureOptions) -> Result<Document> {
        if entries.is_empty() {
            return Err(Error::EmptyBrochure);
        }
        let layout = &options.layout;
        let (mut doc, furniture) = self.start().await?;
        doc.set_title(format!("{} {}", options.title, options.subtitle));
        let page_size = doc.page_size();

        let slots: Vec<CardSlot> = (0..entries.len())
            .map(|i| card_slot(i, page_size, layout))
            .collect();
        let requests: Vec<ImageRequest> = entries
            .iter()
            .zip(&slots)
            .map(|(entry, slot)| {
                ImageRequest::new(entry.main_photo.as_str(), slot.image_ratio()).rounded(layout.image_rounded)
            })
            .collect();
        let images = self.processor.process(&requests).await?;

        let mut pages = Paginator::new(doc, furniture, layout.margins);
        let banner = pages.doc_mut();
        banner.centered_text(&options.title, layout.title_y, TITLE);
        banner.centered_text(&options.subtitle, layout.subtitle_y, SUBTITLE);

        for ((entry, slot), image) in entries.iter().zip(&slots).zip(images) {
            while pages.page() < slot.page {
                pages.new_page();
            }
            let doc = pages.doc_mut();
            image_or_placeholder(doc, image, slot.x, slot.y, slot.width, slot.image_height);
            let name_y = slot.y + slot.image_height + layout.text_gap;
            doc.text(truncate_name(&entry.name, layout.name_limit), slot.x, name_y, CARD_NAME);
            doc.text(details_line(entry), slot.x, name_y + layout.line_gap, CARD_DETAILS);
        }

        log::debug!("{} card(s) on {} page(s)", entries.len(), pages.page());
        Ok(pages.finish())
    }
}
