//! Spec sheet and brochure PDF generation for yacht listings.
//!
//! Photos are fetched through an image proxy, normalized, center-cropped to
//! their slots and laid out on fixed-size pages with repeated header and
//! footer furniture.

pub mod batch;
pub mod compose;
pub mod crop;
pub mod document;
pub mod error;
pub mod fetch;
pub mod fonts;
pub mod layout;
pub mod listing;
pub mod normalize;
pub mod parse;

pub use batch::{BatchProcessor, ImageRequest, Processed};
pub use compose::{Branding, BrochureLayout, BrochureOptions, Composer, Export, SheetLayout};
pub use document::Document;
pub use error::{BuildFailure, Error, ImageError, Result};
pub use fetch::{ImageSource, ProxySource};
pub use listing::{BrochureEntry, ListingSnapshot, TaxStatus};
pub use normalize::{ImageAsset, NormalizeOptions};
pub use parse::PageSize;
