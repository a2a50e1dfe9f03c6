use crate::error::{CliError, Result};
use dockbatch::core::io::pdbqt::has_coordinate_records;
use futures_util::StreamExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const RCSB_DOWNLOAD_URL: &str = "https://files.rcsb.org/download";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PDB_CODE_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy)]
pub enum DownloadProgress {
    Started { total_size: Option<u64> },
    Downloading { downloaded: u64 },
}

/// Fetches receptor structures from the RCSB Protein Data Bank.
#[derive(Debug)]
pub struct PdbDownloader {
    client: reqwest::Client,
    base_url: String,
}

impl PdbDownloader {
    pub fn new() -> Result<Self> {
        Self::with_base_url(RCSB_DOWNLOAD_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, code: &str) -> String {
        format!("{}/{}.pdb", self.base_url, code)
    }

    /// Downloads `code` into `output_dir/<CODE>.pdb` and returns the written path.
    ///
    /// The body must contain ATOM/HETATM records; anything else (an HTML error
    /// page, an empty file) is rejected rather than saved.
    pub async fn download(
        &self,
        code: &str,
        output_dir: &Path,
        mut progress_callback: impl FnMut(DownloadProgress),
    ) -> Result<PathBuf> {
        let code = validate_pdb_code(code)?;
        let url = self.url_for(&code);
        info!("Downloading PDB entry {} from {}", code, url);

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let total_size = response.content_length();
        progress_callback(DownloadProgress::Started { total_size });

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::with_capacity(total_size.unwrap_or(0) as usize);

        while let Some(item) = stream.next().await {
            let chunk = item?;
            buffer.extend_from_slice(&chunk);
            downloaded += chunk.len() as u64;
            progress_callback(DownloadProgress::Downloading { downloaded });
        }

        let content = String::from_utf8_lossy(&buffer);
        if !has_coordinate_records(&content) {
            return Err(CliError::Argument(format!(
                "PDB entry {} has no ATOM/HETATM records",
                code
            )));
        }

        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("{}.pdb", code));
        fs::write(&path, buffer)?;
        debug!("Saved {} bytes to {:?}", downloaded, path);
        Ok(path)
    }
}

/// Checks that `code` is a four-character PDB identifier and returns it upper-cased.
pub fn validate_pdb_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() == PDB_CODE_LENGTH && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(CliError::Argument(format!(
            "'{}' is not a valid PDB identifier (expected {} letters or digits)",
            code, PDB_CODE_LENGTH
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn pdb_codes_are_validated_and_upper_cased() {
        assert_eq!(validate_pdb_code("1abc").unwrap(), "1ABC");
        assert_eq!(validate_pdb_code(" 7xyz ").unwrap(), "7XYZ");

        for bad in ["", "1ab", "1abcd", "1a-c", "1äbc"] {
            assert!(
                matches!(validate_pdb_code(bad), Err(CliError::Argument(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn download_url_follows_the_rcsb_layout() {
        let downloader = PdbDownloader::new().unwrap();
        assert_eq!(
            downloader.url_for("1ABC"),
            "https://files.rcsb.org/download/1ABC.pdb"
        );

        let mirror = PdbDownloader::with_base_url("http://mirror.local/pdb/").unwrap();
        assert_eq!(mirror.url_for("2XYZ"), "http://mirror.local/pdb/2XYZ.pdb");
    }

    #[tokio::test]
    async fn invalid_code_fails_before_any_request() {
        let dir = tempdir().unwrap();
        let downloader = PdbDownloader::with_base_url("http://127.0.0.1:9").unwrap();

        let result = downloader.download("nope!", dir.path(), |_| {}).await;
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let dir = tempdir().unwrap();
        let downloader = PdbDownloader::with_base_url("http://127.0.0.1:9").unwrap();

        let result = downloader.download("1abc", dir.path(), |_| {}).await;
        assert!(matches!(result, Err(CliError::Network(_))));
        assert!(!dir.path().join("1ABC.pdb").exists());
    }
}
