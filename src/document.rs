//! In-memory page model and its serialization to PDF.
//!
//! Composers place blocks in millimetres with the origin at the top-left
//! corner, text positioned by its baseline. [`Document::finish`] converts
//! everything to PDF user space and writes the file once.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream, StringFormat};
use std::io::Write;

use crate::error::Result;
use crate::fonts::{self, Font};
use crate::normalize::ImageAsset;
use crate::parse::{mm_to_pt, PageSize};

/// RGB fill/stroke colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn hex(rgb: u32) -> Self {
        Color {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        }
    }

    fn operands(self) -> Vec<Object> {
        [self.r, self.g, self.b]
            .into_iter()
            .map(|c| Object::Real(c as f32 / 255.0))
            .collect()
    }
}

pub const INK: Color = Color::hex(0x0f172a);
pub const MUTED: Color = Color::hex(0x64748b);
pub const FAINT: Color = Color::hex(0x94a3b8);
pub const BODY: Color = Color::hex(0x374151);
pub const RULE: Color = Color::hex(0xcbd5e1);
pub const DIVIDER: Color = Color::hex(0xe2e8f0);
pub const PLACEHOLDER: Color = Color::hex(0xf8fafc);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub color: Color,
}

impl TextStyle {
    pub const fn new(font: Font, size: f32, color: Color) -> Self {
        TextStyle { font, size, color }
    }

    /// rendered width in millimetres (size is in points)
    pub fn width_of(&self, text: &str) -> f32 {
        fonts::text_width(text, self.font, self.size) * 25.4 / 72.0
    }
}

/// Handle to an image registered with [`Document::add_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef(usize);

/// One placed unit of page content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Image {
        image: ImageRef,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        style: TextStyle,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Color,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Color,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    blocks: Vec<Block>,
}

impl Page {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// text blocks as (text, baseline y) in placement order
    pub fn texts(&self) -> impl Iterator<Item = (&str, f32)> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Text { text, y, .. } => Some((text.as_str(), *y)),
            _ => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Image { .. }))
            .count()
    }
}

/// A document under construction. Consumed by [`Document::finish`].
pub struct Document {
    page_size: PageSize,
    pages: Vec<Page>,
    images: Vec<ImageAsset>,
    title: Option<String>,
}

impl Document {
    pub fn new(page_size: PageSize) -> Self {
        Document {
            page_size,
            pages: Vec::new(),
            images: Vec::new(),
            title: None,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn width(&self) -> f32 {
        self.page_size.dimensions_mm().0
    }

    pub fn height(&self) -> f32 {
        self.page_size.dimensions_mm().1
    }

    /// append an empty page, returning its 1-based number
    pub fn add_page(&mut self) -> usize {
        self.pages.push(Page::default());
        self.pages.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn add_image(&mut self, image: ImageAsset) -> ImageRef {
        self.images.push(image);
        ImageRef(self.images.len() - 1)
    }

    pub fn image(&self, image: ImageRef) -> &ImageAsset {
        &self.images[image.0]
    }

    /// place a block on the last page, opening the first page if needed
    pub fn push(&mut self, block: Block) {
        if self.pages.is_empty() {
            self.add_page();
        }
        if let Some(page) = self.pages.last_mut() {
            page.blocks.push(block);
        }
    }

    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32, style: TextStyle) {
        self.push(Block::Text {
            text: text.into(),
            x,
            y,
            style,
        });
    }

    /// text horizontally centred on the page
    pub fn centered_text(&mut self, text: &str, y: f32, style: TextStyle) {
        let x = self.width() / 2.0 - style.width_of(text) / 2.0;
        self.text(text, x, y, style);
    }

    /// text centred inside the horizontal span starting at `x`
    pub fn text_centered_in(&mut self, text: &str, x: f32, width: f32, y: f32, style: TextStyle) {
        let x = x + (width - style.width_of(text)) / 2.0;
        self.text(text, x, y, style);
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Color) {
        self.push(Block::Rect {
            x,
            y,
            width,
            height,
            fill,
        });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Color) {
        self.push(Block::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        });
    }

    pub fn place_image(&mut self, image: ImageRef, x: f32, y: f32, width: f32, height: f32) {
        self.push(Block::Image {
            image,
            x,
            y,
            width,
            height,
        });
    }

    /// Serialize to PDF bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let (_, page_h_mm) = self.page_size.dimensions_mm();
        let (page_w_pts, page_h_pts) = self.page_size.dimensions_pt();

        // images are shared by every page through one resource dictionary
        let mut xobjects = lopdf::Dictionary::new();
        for (i, image) in self.images.iter().enumerate() {
            let stream = Stream::new(
                dictionary! {
                    "Type" => Object::Name(b"XObject".to_vec()),
                    "Subtype" => Object::Name(b"Image".to_vec()),
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => Object::Name(b"DeviceRGB".to_vec()),
                    "BitsPerComponent" => 8,
                    "Filter" => Object::Name(b"DCTDecode".to_vec()),
                    "Length" => image.data.len() as i64,
                },
                image.data.clone(),
            );
            let id = doc.add_object(stream);
            xobjects.set(image_name(i), id);
        }

        let mut fonts_dict = lopdf::Dictionary::new();
        for font in [Font::Helvetica, Font::Times] {
            let id = doc.add_object(dictionary! {
                "Type" => Object::Name(b"Font".to_vec()),
                "Subtype" => Object::Name(b"Type1".to_vec()),
                "BaseFont" => Object::Name(font.base_font().to_vec()),
                "Encoding" => Object::Name(b"WinAnsiEncoding".to_vec()),
            });
            fonts_dict.set(font.resource_name(), id);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts_dict,
            "XObject" => xobjects,
        });

        let mut page_ids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let operations: Vec<Operation> = page
                .blocks
                .iter()
                .flat_map(|block| block_operations(block, page_h_mm))
                .collect();
            let content = Content { operations };
            let compressed = {
                use flate2::write::ZlibEncoder;
                use flate2::Compression;
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(&content.encode()?)?;
                enc.finish()?
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {
                    "Filter" => Object::Name(b"FlateDecode".to_vec()),
                },
                compressed,
            ));

            let page_id = doc.add_object(dictionary! {
                "Type" => Object::Name(b"Page".to_vec()),
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), Object::Real(page_w_pts), Object::Real(page_h_pts)],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id.into());
        }

        let count = page_ids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => Object::Name(b"Pages".to_vec()),
                "Kids" => page_ids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Catalog".to_vec()),
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut info_dict = lopdf::Dictionary::new();
        info_dict.set(
            "Producer",
            Object::String(
                format!("hullprint {}", env!("CARGO_PKG_VERSION")).into_bytes(),
                StringFormat::Literal,
            ),
        );
        // PDF date format: D:YYYYMMDDHHmmSSZ
        let created = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        info_dict.set(
            "CreationDate",
            Object::String(created.into_bytes(), StringFormat::Literal),
        );
        if let Some(title) = &self.title {
            info_dict.set(
                "Title",
                Object::String(fonts::encode_win_ansi(title), StringFormat::Literal),
            );
        }
        let info_id = doc.add_object(Object::Dictionary(info_dict));
        doc.trailer.set("Info", info_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)?;
        log::info!(
            "finalized document: {} page(s), {} image(s), {} bytes",
            count,
            self.images.len(),
            out.len()
        );
        Ok(out)
    }
}

fn image_name(index: usize) -> Vec<u8> {
    format!("Im{}", index).into_bytes()
}

fn real(mm: f32) -> Object {
    Object::Real(mm_to_pt(mm))
}

/// flip a top-down millimetre offset into bottom-up PDF space
fn flip(y: f32, page_h: f32) -> Object {
    real(page_h - y)
}

fn block_operations(block: &Block, page_h: f32) -> Vec<Operation> {
    match block {
        Block::Image {
            image,
            x,
            y,
            width,
            height,
        } => vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(*width),
                    Object::Integer(0),
                    Object::Integer(0),
                    real(*height),
                    real(*x),
                    flip(y + height, page_h),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image_name(image.0))]),
            Operation::new("Q", vec![]),
        ],
        Block::Text { text, x, y, style } => vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(style.font.resource_name().to_vec()),
                    Object::Real(style.size),
                ],
            ),
            Operation::new("rg", style.color.operands()),
            Operation::new("Td", vec![real(*x), flip(*y, page_h)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    fonts::encode_win_ansi(text),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
        Block::Rect {
            x,
            y,
            width,
            height,
            fill,
        } => vec![
            Operation::new("rg", fill.operands()),
            Operation::new(
                "re",
                vec![real(*x), flip(y + height, page_h), real(*width), real(*height)],
            ),
            Operation::new("f", vec![]),
        ],
        Block::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        } => vec![
            Operation::new("RG", color.operands()),
            Operation::new("w", vec![real(*width)]),
            Operation::new("m", vec![real(*x1), flip(*y1, page_h)]),
            Operation::new("l", vec![real(*x2), flip(*y2, page_h)]),
            Operation::new("S", vec![]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_asset() -> ImageAsset {
        let img = image::RgbImage::from_fn(8, 4, |x, _| image::Rgb([(x * 30) as u8, 90, 160]));
        crate::normalize::encode_jpeg("mem://tiny", &img, 50).unwrap()
    }

    #[test]
    fn color_from_hex() {
        assert_eq!(INK, Color { r: 0x0f, g: 0x17, b: 0x2a });
    }

    #[test]
    fn push_opens_first_page() {
        let mut doc = Document::new(PageSize::A4);
        assert_eq!(doc.page_count(), 0);
        doc.rect(0.0, 0.0, 10.0, 10.0, PLACEHOLDER);
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages()[0].blocks().len(), 1);
    }

    #[test]
    fn centered_text_is_symmetric() {
        let mut doc = Document::new(PageSize::A4);
        let style = TextStyle::new(Font::Helvetica, 12.0, INK);
        doc.centered_text("Centre me", 50.0, style);
        let Block::Text { x, .. } = &doc.pages()[0].blocks()[0] else {
            panic!("expected text");
        };
        let right = x + style.width_of("Centre me");
        assert!((x - (210.0 - right)).abs() < 1e-3);
    }

    #[test]
    fn finish_writes_loadable_pdf() {
        let mut doc = Document::new(PageSize::A4);
        doc.set_title("Test (sheet)");
        let image = doc.add_image(tiny_asset());
        doc.add_page();
        doc.place_image(image, 20.0, 40.0, 80.0, 40.0);
        doc.text("Price: €1,000 (net)", 20.0, 100.0, TextStyle::new(Font::Helvetica, 12.0, INK));
        doc.add_page();
        doc.line(20.0, 25.0, 190.0, 25.0, 0.5, RULE);
        doc.place_image(image, 20.0, 40.0, 80.0, 40.0);

        let bytes = doc.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let pdf = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = pdf.get_pages();
        assert_eq!(pages.len(), 2);

        let first = *pages.get(&1).unwrap();
        let content = Content::decode(&pdf.get_page_content(first).unwrap()).unwrap();
        let shown: Vec<Vec<u8>> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match &op.operands[0] {
                Object::String(s, _) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![fonts::encode_win_ansi("Price: €1,000 (net)")]);
        assert!(content.operations.iter().any(|op| op.operator == "Do"));
    }

    #[test]
    fn image_placed_top_down() {
        let ops = block_operations(
            &Block::Image {
                image: ImageRef(0),
                x: 0.0,
                y: 0.0,
                width: 25.4,
                height: 25.4,
            },
            297.0,
        );
        let cm = &ops[1];
        assert_eq!(cm.operator, "cm");
        // bottom edge of an inch-high image at the top of the page
        let Object::Real(y) = cm.operands[5] else {
            panic!("expected real");
        };
        assert!((y - mm_to_pt(297.0 - 25.4)).abs() < 1e-3);
    }
}
