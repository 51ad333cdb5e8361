//! Image acquisition through the same-origin proxy.
//!
//! Listing photos live on third-party object stores. They are requested via
//! `GET <base><path>?url=<encoded-url>` so the bytes come back from our own
//! origin.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::{Error, ImageError};

pub const DEFAULT_PROXY_PATH: &str = "/proxy-image";

/// Anything that can turn an image URL into its encoded bytes.
///
/// The HTTP proxy is the production implementation; tests supply
/// in-memory sources.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ImageError>> + Send;
}

/// Fetches images through the proxy endpoint.
#[derive(Debug, Clone)]
pub struct ProxySource {
    client: Client,
    endpoint: Url,
}

impl ProxySource {
    /// `base` is the proxy's origin (e.g. `http://localhost:3000`), `path`
    /// the endpoint path on it.
    pub fn new(base: &str, path: &str) -> Result<Self, Error> {
        let endpoint = Url::parse(base)
            .and_then(|b| b.join(path))
            .map_err(|e| Error::Client(format!("invalid proxy endpoint {}{}: {}", base, path, e)))?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("hullprint/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;
        Ok(ProxySource { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The proxied location of `url`, with the target percent-encoded.
    pub fn proxied(&self, url: &str) -> Url {
        let mut proxied = self.endpoint.clone();
        proxied.query_pairs_mut().clear().append_pair("url", url);
        proxied
    }
}

impl ImageSource for ProxySource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ImageError>> + Send {
        let client = self.client.clone();
        let target = url.to_string();
        let proxied = self.proxied(url);
        async move {
            if target.trim().is_empty() {
                return Err(ImageError::fetch(&target, "empty image URL"));
            }
            let response = client
                .get(proxied)
                .send()
                .await
                .map_err(|e| ImageError::fetch(&target, e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(ImageError::fetch(&target, format!("proxy answered {}", status)));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ImageError::fetch(&target, e))?;
            log::debug!("fetched {} ({} bytes)", target, bytes.len());
            Ok(bytes.to_vec())
        }
    }
}
