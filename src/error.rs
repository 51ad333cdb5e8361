//! Error types for document builds.
//!
//! Per-image problems ([`ImageError`]) are recovered inside the batch
//! processor and turned into placeholders. Everything else is an [`Error`]
//! that aborts the build and reaches the caller wrapped in [`BuildFailure`].

use std::io;
use thiserror::Error;

/// Result type alias for structural operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to turn one source URL into a placeable image.
#[derive(Error, Debug)]
pub enum ImageError {
    /// The proxy or network could not deliver the image.
    #[error("failed to fetch image {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The bytes are not a supported raster format.
    #[error("failed to decode image {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding the processed raster failed.
    #[error("failed to encode image {url}: {source}")]
    Encode {
        url: String,
        #[source]
        source: image::ImageError,
    },
}

impl ImageError {
    pub fn fetch(url: &str, reason: impl ToString) -> Self {
        ImageError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The source URL this error refers to.
    pub fn url(&self) -> &str {
        match self {
            ImageError::Fetch { url, .. }
            | ImageError::Decode { url, .. }
            | ImageError::Encode { url, .. } => url,
        }
    }
}

/// Structural errors. None of these are recovered during a build.
#[derive(Error, Debug)]
pub enum Error {
    /// A block asked for placement with a negative or non-finite height.
    #[error("invalid block height {height}: layout cannot place it")]
    LayoutOverflow { height: f32 },

    /// An image request asked for a crop ratio that is not a positive number.
    #[error("invalid crop ratio {ratio} requested for {url}")]
    InvalidAspectRatio { url: String, ratio: f32 },

    /// A brochure was requested without any entries.
    #[error("no listings selected for the brochure")]
    EmptyBrochure,

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// A background image worker panicked or was cancelled.
    #[error("image worker failed: {0}")]
    Task(String),

    /// PDF serialization failed.
    #[error("PDF serialization error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// I/O error while encoding streams.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}

/// Returned by the top-level export functions. No output exists when this
/// is returned; the caller should report it and offer a retry.
#[derive(Error, Debug)]
#[error("export failed, please retry: {source}")]
pub struct BuildFailure {
    #[from]
    source: Error,
}

impl BuildFailure {
    /// The unrecovered error behind the failure.
    pub fn cause(&self) -> &Error {
        &self.source
    }

    pub fn into_inner(self) -> Error {
        self.source
    }
}
