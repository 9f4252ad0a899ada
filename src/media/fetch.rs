use crate::feed::types::MediaKind;
use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("invalid media URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not spool media to disk: {0}")]
    Io(#[from] std::io::Error),
}

/// One media download spooled to a uniquely named temporary file.
///
/// The file is removed when the value is dropped, so holding the value is
/// what keeps the bytes on disk: relay-and-discard callers drop it as soon
/// as the bytes are sent, while the photo path keeps it alive until text
/// extraction has run.
#[derive(Debug)]
pub struct RetrievedMedia {
    file: NamedTempFile,
    pub size: u64,
    pub kind: MediaKind,
}

impl RetrievedMedia {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.path())
    }
}

/// Fetches raw media bytes for a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, kind: MediaKind) -> Result<RetrievedMedia, RetrieveError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, RetrieveError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Single GET, redirects handled by the client's default policy, no
    /// retry. The status line is not inspected: whatever body the server
    /// returns is spooled and relayed as-is.
    async fn fetch(&self, url: &str, kind: MediaKind) -> Result<RetrievedMedia, RetrieveError> {
        let url = Url::parse(url)?;
        debug!("Fetching media from {}", url);

        let response = self.client.get(url).send().await?;
        let body = response.bytes().await?;

        spool(&body, kind)
    }
}

/// Writes a response body to a fresh temporary file. Names are random and
/// the file is opened exclusively, so concurrent commands never collide.
pub(crate) fn spool(data: &[u8], kind: MediaKind) -> Result<RetrievedMedia, RetrieveError> {
    let mut file = NamedTempFile::new()?;
    file.write_all(data)?;
    file.flush()?;

    Ok(RetrievedMedia {
        file,
        size: data.len() as u64,
        kind,
    })
}
