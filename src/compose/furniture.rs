use crate::document::{Document, ImageRef, TextStyle, FAINT, INK, MUTED, RULE};
use crate::fonts::Font;
use crate::layout::{Furniture, SIDE_MARGIN};

const LOGO_WIDTH: f32 = 35.0;
const LOGO_HEIGHT: f32 = 12.0;
const LOGO_Y: f32 = 8.0;
const HEADER_RULE_Y: f32 = 25.0;
/// distance of the footer rule from the bottom edge
const FOOTER_RULE_OFFSET: f32 = 25.0;
const RULE_WIDTH: f32 = 0.5;

/// Dealer identity printed in the header and footer of every page.
#[derive(Debug, Clone, PartialEq)]
pub struct Branding {
    pub company: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    /// legal name and seat, under the website in the footer
    pub address: String,
    /// drawn in the header instead of the company name when it loads
    pub logo_url: Option<String>,
}

impl Default for Branding {
    fn default() -> Self {
        Branding {
            company: "Nova Yachts".to_string(),
            email: "office@novayachts.eu".to_string(),
            phone: "+385 98 301 987".to_string(),
            website: "www.novayachts.eu".to_string(),
            address: "Nova Yachts d.o.o Zagreb, Croatia".to_string(),
            logo_url: None,
        }
    }
}

pub struct PageFurniture {
    branding: Branding,
    logo: Option<ImageRef>,
}

impl PageFurniture {
    pub fn new(branding: Branding, logo: Option<ImageRef>) -> Self {
        PageFurniture { branding, logo }
    }
}

impl Furniture for PageFurniture {
    fn draw(&self, doc: &mut Document, _page: usize) {
        let width = doc.width();
        let height = doc.height();

        match self.logo {
            Some(logo) => doc.place_image(logo, SIDE_MARGIN, LOGO_Y, LOGO_WIDTH, LOGO_HEIGHT),
            None => doc.text(
                self.branding.company.as_str(),
                SIDE_MARGIN,
                LOGO_Y + LOGO_HEIGHT - 2.0,
                TextStyle::new(Font::Times, 18.0, INK),
            ),
        }

        let label = TextStyle::new(Font::Helvetica, 9.0, FAINT);
        let value = TextStyle::new(Font::Helvetica, 9.0, INK);
        doc.text("Email", width - SIDE_MARGIN - 60.0, 12.0, label);
        doc.text("Phone", width - SIDE_MARGIN - 60.0, 18.0, label);
        doc.text(self.branding.email.as_str(), width - SIDE_MARGIN - 35.0, 12.0, value);
        doc.text(self.branding.phone.as_str(), width - SIDE_MARGIN - 35.0, 18.0, value);

        doc.line(SIDE_MARGIN, HEADER_RULE_Y, width - SIDE_MARGIN, HEADER_RULE_Y, RULE_WIDTH, RULE);
        let footer_rule = height - FOOTER_RULE_OFFSET;
        doc.line(SIDE_MARGIN, footer_rule, width - SIDE_MARGIN, footer_rule, RULE_WIDTH, RULE);

        let footer_y = height - 15.0;
        doc.centered_text(&self.branding.website, footer_y, TextStyle::new(Font::Helvetica, 11.0, INK));
        doc.centered_text(&self.branding.address, footer_y + 5.0, TextStyle::new(Font::Helvetica, 9.0, MUTED));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Block;
    use crate::parse::PageSize;

    #[test]
    fn header_and_footer_without_logo() {
        let mut doc = Document::new(PageSize::A4);
        doc.add_page();
        PageFurniture::new(Branding::default(), None).draw(&mut doc, 1);

        let texts: Vec<_> = doc.pages()[0].texts().map(|(t, _)| t).collect();
        assert_eq!(
            texts,
            vec![
                "Nova Yachts",
                "Email",
                "Phone",
                "office@novayachts.eu",
                "+385 98 301 987",
                "www.novayachts.eu",
                "Nova Yachts d.o.o Zagreb, Croatia",
            ]
        );
        let rules: Vec<f32> = doc.pages()[0]
            .blocks()
            .iter()
            .filter_map(|b| match b {
                Block::Line { y1, .. } => Some(*y1),
                _ => None,
            })
            .collect();
        assert_eq!(rules, vec![25.0, 272.0]);
    }

    #[test]
    fn logo_replaces_wordmark() {
        let mut doc = Document::new(PageSize::A4);
        let img = image::RgbImage::new(35, 12);
        let logo = doc.add_image(crate::normalize::encode_jpeg("logo", &img, 50).unwrap());
        doc.add_page();
        PageFurniture::new(Branding::default(), Some(logo)).draw(&mut doc, 1);
        assert_eq!(doc.pages()[0].image_count(), 1);
        assert!(doc.pages()[0].texts().all(|(t, _)| t != "Nova Yachts"));
    }
}
