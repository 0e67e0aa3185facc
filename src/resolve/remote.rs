//! Remote resolution: download once per process, then reuse the temp copy.

use std::sync::Arc;
use std::time::Duration;

use super::{ResolveContext, ResolvedFile, Resolver, TempStore};
use crate::asset::Asset;
use crate::debug;
use crate::error::{BundleError, Result};
use crate::utils::io;

/// Downloads bundled remote assets with a blocking HTTP client.
pub struct HttpResolver {
    client: reqwest::blocking::Client,
    store: Arc<TempStore>,
}

impl HttpResolver {
    pub fn new(store: Arc<TempStore>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("stitch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BundleError::InvalidConfiguration(e.to_string()))?;
        Ok(Self { client, store })
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let remote_err = |detail: String| BundleError::Remote {
            url: url.to_string(),
            detail,
        };
        debug!("remote"; "fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| remote_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(remote_err(format!("HTTP {}", response.status())));
        }
        let bytes = response.bytes().map_err(|e| remote_err(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Extension of the last path segment of a URL, without query or fragment.
fn url_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let last = path.rsplit('/').next().unwrap_or_default();
    last.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default()
}

impl Resolver for HttpResolver {
    fn resolve(&self, asset: &Asset, _ctx: &ResolveContext<'_>) -> Result<Vec<ResolvedFile>> {
        let url = asset.remote_url.as_deref().unwrap_or(&asset.source);
        let path = self
            .store
            .get_or_materialize(url, url_extension(url), || self.download(url))?;
        let content = io::read_to_string(&path)?;
        Ok(vec![ResolvedFile { path, content }])
    }
}
