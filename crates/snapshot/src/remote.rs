use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Result, SnapshotError, TimestampedSnapshot, FILE_EXTENSION};

/// Where to look for a published snapshot of the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLocation", into = "RawLocation")]
pub enum SnapshotLocation {
    /// Next to the presentation page: `talk.html` -> `talk.inkdeck`.
    Auto,
    Url(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLocation {
    Keyword(String),
    Explicit { url: String },
}

impl TryFrom<RawLocation> for SnapshotLocation {
    type Error = String;

    fn try_from(raw: RawLocation) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawLocation::Keyword(word) if word == "auto" => Ok(SnapshotLocation::Auto),
            RawLocation::Keyword(word) => Err(format!(
                "unknown snapshot location {:?}, expected \"auto\" or {{ \"url\": ... }}",
                word
            )),
            RawLocation::Explicit { url } => Ok(SnapshotLocation::Url(url)),
        }
    }
}

impl From<SnapshotLocation> for RawLocation {
    fn from(location: SnapshotLocation) -> Self {
        match location {
            SnapshotLocation::Auto => RawLocation::Keyword("auto".to_string()),
            SnapshotLocation::Url(url) => RawLocation::Explicit { url },
        }
    }
}

impl SnapshotLocation {
    /// Resolves the URI to fetch for a presentation served at `page_path`.
    pub fn resolve(&self, page_path: &str) -> String {
        match self {
            SnapshotLocation::Url(url) => url.clone(),
            SnapshotLocation::Auto => [".html", ".htm"]
                .iter()
                .find_map(|ext| page_path.strip_suffix(*ext))
                .map(|stem| format!("{}{}", stem, FILE_EXTENSION))
                .unwrap_or_else(|| format!("index{}", FILE_EXTENSION)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches a URI once. Implementations never retry.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<FetchResponse>;
}

/// HTTP(S) fetcher; relative URIs are joined onto `base`.
pub struct HttpFetcher {
    client: reqwest::Client,
    base: Option<reqwest::Url>,
}

impl HttpFetcher {
    pub fn new(base: Option<&str>) -> Result<Self> {
        let base = base
            .map(reqwest::Url::parse)
            .transpose()
            .map_err(|e| SnapshotError::Network(e.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    fn url_for(&self, uri: &str) -> Result<reqwest::Url> {
        let parsed = match &self.base {
            Some(base) => base.join(uri),
            None => reqwest::Url::parse(uri),
        };
        parsed.map_err(|e| SnapshotError::Network(format!("bad uri {}: {}", uri, e)))
    }
}

#[async_trait]
impl SnapshotFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchResponse> {
        let url = self.url_for(uri)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SnapshotError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SnapshotError::Network(e.to_string()))?;
        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// Serves URIs from a directory, the way a static file server would.
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl SnapshotFetcher for FsFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchResponse> {
        let path = self.root.join(uri.trim_start_matches('/'));
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(FetchResponse {
                status: 200,
                status_text: "OK".to_string(),
                body,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                body: String::new(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// A configured remote source for one load.
pub struct RemoteSource<'a> {
    pub location: &'a SnapshotLocation,
    pub page_path: &'a str,
    pub fetcher: &'a dyn SnapshotFetcher,
}

impl RemoteSource<'_> {
    /// Fetches and validates the remote snapshot. Every failure is logged and
    /// reported as absence.
    pub async fn load(&self) -> Option<TimestampedSnapshot> {
        let uri = self.location.resolve(self.page_path);
        let response = match self.fetcher.fetch(&uri).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch drawings from {}: {}", uri, e);
                return None;
            }
        };

        if !response.is_success() {
            match self.location {
                SnapshotLocation::Auto => info!(
                    "No saved drawings found at auto-detected uri {} (status {} {})",
                    uri, response.status, response.status_text
                ),
                SnapshotLocation::Url(_) => warn!(
                    "Failed to load saved drawings from {} (status {} {})",
                    uri, response.status, response.status_text
                ),
            }
            return None;
        }

        match TimestampedSnapshot::parse(&response.body) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Received invalid snapshot from {}: {}", uri, e);
                None
            }
        }
    }
}
