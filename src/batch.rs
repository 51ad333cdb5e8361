//! Bounded fan-out over many image requests.
//!
//! Requests are taken in fixed-size chunks. Within a chunk every fetch runs
//! concurrently, then decoding, cropping and encoding run in parallel on the
//! rayon pool. Results come back in request order no matter which item
//! finished first, and a failed item becomes `None` instead of failing its
//! siblings.

use rayon::prelude::*;
use std::sync::Arc;

use crate::crop::crop_to_ratio;
use crate::error::{Error, ImageError, Result};
use crate::fetch::ImageSource;
use crate::normalize::{self, ImageAsset, NormalizeOptions};

pub const DEFAULT_CHUNK_SIZE: usize = 4;

/// One photo to fetch and fit into a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub url: String,
    /// slot width / slot height
    pub aspect_ratio: f32,
    /// clip to rounded corners
    pub rounded: bool,
}

impl ImageRequest {
    pub fn new(url: impl Into<String>, aspect_ratio: f32) -> Self {
        ImageRequest {
            url: url.into(),
            aspect_ratio,
            rounded: false,
        }
    }

    pub fn rounded(mut self, rounded: bool) -> Self {
        self.rounded = rounded;
        self
    }
}

/// `None` marks an image that could not be produced; the composer draws a
/// placeholder in its slot.
pub type Processed = Option<ImageAsset>;

pub struct BatchProcessor<S> {
    source: Arc<S>,
    chunk_size: usize,
    options: NormalizeOptions,
}

impl<S: ImageSource> BatchProcessor<S> {
    pub fn new(source: S) -> Self {
        BatchProcessor {
            source: Arc::new(source),
            chunk_size: DEFAULT_CHUNK_SIZE,
            options: NormalizeOptions::default(),
        }
    }

    /// how many requests may be in flight at once (at least one)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Process every request, returning one entry per request in order.
    pub async fn process(&self, requests: &[ImageRequest]) -> Result<Vec<Processed>> {
        for req in requests {
            if !(req.aspect_ratio.is_finite() && req.aspect_ratio > 0.0) {
                return Err(Error::InvalidAspectRatio {
                    url: req.url.clone(),
                    ratio: req.aspect_ratio,
                });
            }
        }

        let mut results = Vec::with_capacity(requests.len());
        let chunks = requests.len().div_ceil(self.chunk_size);
        for (i, chunk) in requests.chunks(self.chunk_size).enumerate() {
            log::debug!("image chunk {}/{} ({} request(s))", i + 1, chunks, chunk.len());

            // phase 1 - concurrent fetches
            let handles: Vec<_> = chunk
                .iter()
                .map(|req| {
                    let source = Arc::clone(&self.source);
                    let url = req.url.clone();
                    tokio::spawn(async move { source.fetch(&url).await })
                })
                .collect();
            let mut fetched = Vec::with_capacity(chunk.len());
            for handle in handles {
                fetched.push(handle.await?);
            }

            // phase 2 - parallel decode/crop/encode, each on its own buffer
            let options = self.options;
            let jobs: Vec<(ImageRequest, std::result::Result<Vec<u8>, ImageError>)> =
                chunk.iter().cloned().zip(fetched).collect();
            let processed = tokio::task::spawn_blocking(move || {
                jobs.into_par_iter()
                    .map(|(req, bytes)| bytes.and_then(|b| render(&req, &b, &options)))
                    .collect::<Vec<_>>()
            })
            .await?;

            results.extend(processed.into_iter().map(|result| match result {
                Ok(asset) => Some(asset),
                Err(e) => {
                    log::warn!("{}; drawing a placeholder instead", e);
                    None
                }
            }));
        }
        Ok(results)
    }

    /// Single-request convenience over [`BatchProcessor::process`].
    pub async fn process_one(&self, request: ImageRequest) -> Result<Processed> {
        Ok(self
            .process(std::slice::from_ref(&request))
            .await?
            .pop()
            .flatten())
    }

    /// Fetch and normalize without cropping (used for the page logo).
    pub async fn fetch_normalized(&self, url: &str) -> Result<Processed> {
        let source = Arc::clone(&self.source);
        let owned = url.to_string();
        let bytes = tokio::spawn(async move { source.fetch(&owned).await }).await?;
        let options = self.options;
        let owned = url.to_string();
        let result = tokio::task::spawn_blocking(move || {
            bytes.and_then(|b| normalize::normalize(&owned, &b, &options))
        })
        .await?;
        Ok(result
            .map_err(|e| log::warn!("{}; continuing without it", e))
            .ok())
    }
}

/// decode -> bound -> crop/mask -> encode for one fetched image
pub fn render(
    request: &ImageRequest,
    bytes: &[u8],
    options: &NormalizeOptions,
) -> std::result::Result<ImageAsset, ImageError> {
    let img = normalize::decode_bounded(&request.url, bytes, options)?;
    let cropped = crop_to_ratio(&img, request.aspect_ratio, request.rounded);
    normalize::encode_jpeg(&request.url, &cropped, options.quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
        });
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    /// serves known URLs after a per-URL number of yields
    struct SlowMemory {
        images: HashMap<String, (Vec<u8>, usize)>,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl ImageSource for SlowMemory {
        fn fetch(
            &self,
            url: &str,
        ) -> impl Future<Output = std::result::Result<Vec<u8>, ImageError>> + Send {
            let entry = self.images.get(url).cloned();
            let url = url.to_string();
            let in_flight = Arc::clone(&self.in_flight);
            let peak = Arc::clone(&self.peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                let yields = entry.as_ref().map_or(1, |(_, y)| *y);
                for _ in 0..yields {
                    tokio::task::yield_now().await;
                }
                in_flight.fetch_sub(1, Ordering::SeqCst);
                entry
                    .map(|(bytes, _)| bytes)
                    .ok_or_else(|| ImageError::fetch(&url, "proxy answered 404 Not Found"))
            }
        }
    }

    fn fixture(n: usize) -> (SlowMemory, Vec<ImageRequest>, Arc<AtomicUsize>) {
        let mut images = HashMap::new();
        let mut requests = Vec::new();
        let bytes = png(24, 16);
        for i in 0..n {
            let url = format!("https://cdn.example/{}.png", i);
            // every third photo is missing upstream
            if i % 3 != 1 {
                // later requests finish first
                images.insert(url.clone(), (bytes.clone(), (n - i) * 3));
            }
            requests.push(ImageRequest::new(url, 1.5).rounded(i % 2 == 0));
        }
        let peak = Arc::new(AtomicUsize::new(0));
        let source = SlowMemory {
            images,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        };
        (source, requests, peak)
    }

    #[tokio::test]
    async fn order_preserved_for_every_chunking() {
        for n in 1..=7 {
            for k in 1..=8 {
                let (source, requests, peak) = fixture(n);
                let processor = BatchProcessor::new(source).with_chunk_size(k);
                let out = processor.process(&requests).await.unwrap();
                assert_eq!(out.len(), n);
                for (i, slot) in out.iter().enumerate() {
                    match slot {
                        Some(asset) => {
                            assert_ne!(i % 3, 1, "n={} k={} i={}", n, k, i);
                            assert_eq!(asset.url, requests[i].url);
                        }
                        None => assert_eq!(i % 3, 1, "n={} k={} i={}", n, k, i),
                    }
                }
                assert!(peak.load(Ordering::SeqCst) <= k);
            }
        }
    }

    #[tokio::test]
    async fn outputs_are_cropped_jpegs() {
        let (source, requests, _) = fixture(1);
        let processor = BatchProcessor::new(source);
        let asset = processor.process_one(requests[0].clone()).await.unwrap().unwrap();
        // 24x16 is already 1.5:1, nothing to cut
        assert_eq!((asset.width, asset.height), (24, 16));
        assert_eq!(&asset.data[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn undecodable_bytes_become_placeholders() {
        let mut images = HashMap::new();
        images.insert("bad".to_string(), (b"<html>not found</html>".to_vec(), 1));
        let source = SlowMemory {
            images,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        };
        let processor = BatchProcessor::new(source);
        let out = processor.process(&[ImageRequest::new("bad", 1.0)]).await.unwrap();
        assert_eq!(out, vec![None]);
    }

    #[tokio::test]
    async fn invalid_ratio_is_structural() {
        let (source, _, _) = fixture(1);
        let processor = BatchProcessor::new(source);
        for ratio in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = processor
                .process(&[ImageRequest::new("https://cdn.example/0.png", ratio)])
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidAspectRatio { .. }));
        }
    }

    #[tokio::test]
    async fn empty_batch() {
        let (source, _, _) = fixture(0);
        let out = BatchProcessor::new(source).process(&[]).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn normalized_without_crop() {
        let (source, requests, _) = fixture(1);
        let processor = BatchProcessor::new(source);
        let logo = processor.fetch_normalized(&requests[0].url).await.unwrap().unwrap();
        assert_eq!((logo.width, logo.height), (24, 16));
        assert!(processor.fetch_normalized("missing").await.unwrap().is_none());
    }
}
