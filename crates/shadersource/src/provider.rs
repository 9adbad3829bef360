use std::fs;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::SourceError;
use crate::locator::Locator;

/// Anything that can turn a [`Locator`] into UTF-8 shader text.
///
/// Providers are shared across the fetch threads, hence the `Sync` bound.
pub trait SourceProvider: Sync {
    fn fetch(&self, locator: &Locator) -> Result<String, SourceError>;
}

/// Reads files from disk and fetches `http(s)` locators with a blocking client.
#[derive(Debug, Clone)]
pub struct DefaultProvider {
    http: Client,
}

impl DefaultProvider {
    pub fn new() -> Result<Self, SourceError> {
        let http = Client::builder()
            .build()
            .map_err(|source| SourceError::Http {
                url: String::from("<client>"),
                source,
            })?;
        Ok(Self { http })
    }

    fn fetch_remote(&self, url: &reqwest::Url) -> Result<String, SourceError> {
        debug!(%url, "fetching shader source");
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|source| SourceError::Http {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })
    }
}

impl SourceProvider for DefaultProvider {
    fn fetch(&self, locator: &Locator) -> Result<String, SourceError> {
        match locator {
            Locator::Http(url) => self.fetch_remote(url),
            Locator::File(path) => {
                debug!(path = %path.display(), "reading shader source");
                fs::read_to_string(path).map_err(|source| SourceError::Io {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn reads_local_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quad.vert");
        fs::write(&path, "#version 450\nvoid main() {}\n").unwrap();

        let provider = DefaultProvider::new().unwrap();
        let text = provider.fetch(&Locator::File(path)).unwrap();
        assert!(text.starts_with("#version 450"));
    }

    #[test]
    fn missing_file_reports_path() {
        let provider = DefaultProvider::new().unwrap();
        let missing = PathBuf::from("/definitely/not/here/quad.frag");
        let err = provider.fetch(&Locator::File(missing.clone())).unwrap_err();
        match err {
            SourceError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
