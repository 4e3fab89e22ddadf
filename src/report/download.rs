use crate::client::get_checked;
use crate::client::providers::ProviderError;
use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};
use url::Url;

/// A report document fetched to local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub path: PathBuf,
    pub url: String,
    pub size_bytes: u64,
    pub sha256: String,
}

impl ReportArtifact {
    /// File name the document was stored under
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Trailing path segment of the document URL
pub fn file_name_for(url: &Url) -> Result<String, ProviderError> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .filter(|name| !name.contains('/') && name != "..")
        .ok_or_else(|| ProviderError::Parse(format!("Document URL has no file name: {url}")))
}

/// Stream a document into `folder`, overwriting any file of the same name
#[instrument(skip(client))]
pub async fn download_report(
    client: &Client,
    url: &Url,
    folder: &Path,
    timeout: Duration,
) -> Result<ReportArtifact, ProviderError> {
    tokio::fs::create_dir_all(folder).await?;
    let path = folder.join(file_name_for(url)?);

    let response = get_checked(client, url.as_str(), &[], timeout).await?;
    let mut stream = response.bytes_stream();
    let mut file = File::create(&path).await?;
    let mut hasher = Sha256::new();
    let mut size_bytes = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ProviderError::from)?;
        hasher.update(&chunk);
        size_bytes += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    let sha256 = format!("{:x}", hasher.finalize());
    debug!("Wrote {} bytes to {}", size_bytes, path.display());
    info!("Downloaded report {} -> {}", url, path.display());

    Ok(ReportArtifact {
        path,
        url: url.to_string(),
        size_bytes,
        sha256,
    })
}
