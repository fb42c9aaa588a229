//! Font downloads from a Google-Fonts-compatible CSS endpoint

use super::names::{compact, family_name};
use super::provider::{FontProvider, ProvidedFont};
use crate::{ReplaceError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CSS_ENDPOINT: &str = "https://fonts.googleapis.com/css";

/// Legacy browsers are served TrueType rather than WOFF2
const TTF_USER_AGENT: &str = "Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.1)";

static TTF_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"url\((https?://[^)\s]+?\.ttf)\)").unwrap());

/// Downloads the TrueType file of a family into the session cache
pub struct WebFontProvider {
    client: Client,
    css_endpoint: String,
}

impl WebFontProvider {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_CSS_ENDPOINT)
    }

    pub fn with_endpoint(css_endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(TTF_USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| ReplaceError::FontProvider(e.to_string()))?;
        Ok(Self {
            client,
            css_endpoint: css_endpoint.into(),
        })
    }

    fn fetch_css(&self, family: &str) -> Result<String> {
        let url = format!("{}?family={}", self.css_endpoint, family.replace(' ', "+"));
        self.client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| ReplaceError::FontProvider(format!("{url}: {e}")))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map(|b| b.to_vec())
            .map_err(|e| ReplaceError::FontProvider(format!("{url}: {e}")))
    }
}

/// First TrueType URL of a stylesheet
pub(crate) fn first_ttf_url(css: &str) -> Option<&str> {
    TTF_URL
        .captures(css)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

impl FontProvider for WebFontProvider {
    fn locate(&self, font_name: &str, cache_dir: &Path) -> Result<ProvidedFont> {
        let family = family_name(font_name);
        let css = self.fetch_css(&family)?;
        let Some(url) = first_ttf_url(&css) else {
            tracing::debug!(family = %family, "stylesheet has no TrueType source");
            return Ok(ProvidedFont::name_only(family));
        };

        let bytes = self.download(url)?;
        let target = cache_dir.join(format!("{}.ttf", compact(&family)));
        std::fs::write(&target, bytes)?;

        tracing::debug!(family = %family, path = %target.display(), "downloaded font");
        Ok(ProvidedFont {
            name: family,
            path: Some(target),
        })
    }
}
