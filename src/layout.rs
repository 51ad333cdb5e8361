//! Running cursor and page-break decisions.
//!
//! A [`Paginator`] owns the document for the duration of one build. Before a
//! block of height `h` is placed at cursor `y`, `y + h` is compared with the
//! page height minus the footer reserve; when it does not fit a new page is
//! opened, its header and footer drawn, and the cursor reset to the top
//! content offset. Rows are placed as one block so they never split; text is
//! placed one physical line at a time so paragraphs may.

use crate::document::{Document, TextStyle};
use crate::error::{Error, Result};

pub const SIDE_MARGIN: f32 = 20.0;
pub const TOP_OFFSET: f32 = 40.0;
/// reserved above the bottom edge for the footer
pub const BOTTOM_MARGIN: f32 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub side: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            side: SIDE_MARGIN,
            top: TOP_OFFSET,
            bottom: BOTTOM_MARGIN,
        }
    }
}

/// Current page and write position, in millimetres from the page top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    /// 1-based
    pub page: usize,
    pub y: f32,
    page_width: f32,
    page_height: f32,
    margins: Margins,
}

impl LayoutCursor {
    pub fn new(page_width: f32, page_height: f32, margins: Margins) -> Self {
        LayoutCursor {
            page: 1,
            y: margins.top,
            page_width,
            page_height,
            margins,
        }
    }

    /// lowest y a block may reach
    pub fn limit(&self) -> f32 {
        self.page_height - self.margins.bottom
    }

    pub fn top(&self) -> f32 {
        self.margins.top
    }

    pub fn left(&self) -> f32 {
        self.margins.side
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margins.side
    }

    pub fn usable_height(&self) -> f32 {
        self.limit() - self.margins.top
    }

    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.limit()
    }

    fn at_top(&self) -> bool {
        self.y <= self.margins.top
    }
}

/// Page furniture repeated on every page.
pub trait Furniture {
    fn draw(&self, doc: &mut Document, page: usize);
}

impl<F: Fn(&mut Document, usize)> Furniture for F {
    fn draw(&self, doc: &mut Document, page: usize) {
        self(doc, page)
    }
}

fn checked(height: f32) -> Result<f32> {
    if height.is_finite() && height >= 0.0 {
        Ok(height)
    } else {
        Err(Error::LayoutOverflow { height })
    }
}

pub struct Paginator<F> {
    doc: Document,
    furniture: F,
    cursor: LayoutCursor,
}

impl<F: Furniture> Paginator<F> {
    /// Open the first page of `doc` with its furniture.
    pub fn new(mut doc: Document, furniture: F, margins: Margins) -> Self {
        let cursor = LayoutCursor::new(doc.width(), doc.height(), margins);
        doc.add_page();
        furniture.draw(&mut doc, 1);
        Paginator {
            doc,
            furniture,
            cursor,
        }
    }

    pub fn cursor(&self) -> &LayoutCursor {
        &self.cursor
    }

    pub fn y(&self) -> f32 {
        self.cursor.y
    }

    pub fn page(&self) -> usize {
        self.cursor.page
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Direct access for content pinned to absolute positions.
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Move the cursor to an absolute position on the current page.
    pub fn set_y(&mut self, y: f32) -> Result<()> {
        self.cursor.y = checked(y)?;
        Ok(())
    }

    pub fn advance(&mut self, dy: f32) -> Result<()> {
        self.cursor.y += checked(dy)?;
        Ok(())
    }

    /// Whether a block of `height` fits below the cursor.
    pub fn fits(&self, height: f32) -> Result<bool> {
        Ok(self.cursor.fits(checked(height)?))
    }

    /// Open a new page, draw its furniture and reset the cursor.
    pub fn new_page(&mut self) {
        self.cursor.page = self.doc.add_page();
        self.cursor.y = self.cursor.top();
        self.furniture.draw(&mut self.doc, self.cursor.page);
        log::debug!("started page {}", self.cursor.page);
    }

    /// Make room for a block of `height`, breaking the page if it would
    /// cross the footer reserve. Returns the y the block starts at. A block
    /// taller than a whole page goes on a fresh page and overflows it.
    pub fn reserve(&mut self, height: f32) -> Result<f32> {
        let height = checked(height)?;
        if !self.cursor.fits(height) && !self.cursor.at_top() {
            self.new_page();
        }
        Ok(self.cursor.y)
    }

    /// Reserve `height`, draw the block at the resulting y and move past it.
    pub fn place<T>(&mut self, height: f32, draw: impl FnOnce(&mut Document, f32) -> T) -> Result<T> {
        let y = self.reserve(height)?;
        let out = draw(&mut self.doc, y);
        self.cursor.y = y + height;
        Ok(out)
    }

    /// Flow lines of text, checking for a page break before every line.
    pub fn text_lines(
        &mut self,
        lines: &[String],
        x: f32,
        line_height: f32,
        style: TextStyle,
    ) -> Result<()> {
        for line in lines {
            self.place(line_height, |doc, y| {
                if !line.is_empty() {
                    doc.text(line.as_str(), x, y, style);
                }
            })?;
        }
        Ok(())
    }

    /// End composition and hand back the finished page model.
    pub fn finish(self) -> Document {
        self.doc
    }
}
