use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::EffectiveConfig;

/// A media object as served by the library that playlist additions point at.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MediaObject {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub location: Value,
}

impl MediaObject {
    pub fn is_song(&self) -> bool {
        self.kind == "song"
    }
}

fn host(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

pub fn is_uri_allowed(cfg: &EffectiveConfig, uri: &str) -> bool {
    let h = host(uri).unwrap_or_default();
    if cfg.block_patterns.iter().any(|re| re.is_match(uri) || (!h.is_empty() && re.is_match(&h))) {
        return false;
    }
    if cfg.allow_patterns.is_empty() {
        true
    } else {
        cfg.allow_patterns.iter().any(|re| re.is_match(uri) || (!h.is_empty() && re.is_match(&h)))
    }
}

/// Only spaces are escaped; the rest of the URL is fetched as submitted.
pub fn encode_spaces(url: &str) -> String {
    url.replace(' ', "%20")
}

#[derive(Clone)]
pub struct ObjectResolver {
    http: reqwest::Client,
    timeout: Duration,
}

impl ObjectResolver {
    pub fn new(http: reqwest::Client, timeout_ms: u64) -> Self {
        Self { http, timeout: Duration::from_millis(timeout_ms) }
    }

    /// Fetches `url` and parses it as a media object. Disallowed URLs, transport errors and
    /// unparsable payloads all yield `None`.
    pub async fn resolve(&self, cfg: &EffectiveConfig, url: &str) -> Option<MediaObject> {
        let target = encode_spaces(url);
        match Url::parse(&target) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => {
                warn!(%url, "refusing to resolve non-http object URL");
                return None;
            }
        }
        if !is_uri_allowed(cfg, &target) {
            warn!(%url, "object URL blocked by resolver patterns");
            return None;
        }
        match self.fetch(&target).await {
            Ok(obj) => Some(obj),
            Err(e) => {
                debug!(%url, error = %e, "object resolve failed");
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<MediaObject> {
        let resp = tokio::time::timeout(self.timeout, self.http.get(url).send())
            .await
            .context("object fetch timed out")?
            .context("object fetch")?;
        let bytes = tokio::time::timeout(self.timeout, resp.bytes())
            .await
            .context("object body timed out")?
            .context("object read body")?;
        let obj: MediaObject = serde_json::from_slice(&bytes).context("object parse json")?;
        Ok(obj)
    }
}
