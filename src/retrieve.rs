use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::OzoneError;

/// Fetches a single URL into a directory. One call is one attempt; retrying
/// is the caller's business.
pub trait Retriever: Send + Sync {
    fn retrieve(&self, url: &str, destination_dir: &Path) -> Result<(), OzoneError>;
}

#[derive(Clone)]
pub struct WgetRetriever {
    wget: Option<PathBuf>,
    tries: u32,
}

impl WgetRetriever {
    pub fn new(tries: u32) -> Self {
        Self {
            wget: find_in_path("wget"),
            tries,
        }
    }

    pub fn is_available(&self) -> bool {
        self.wget.is_some()
    }

    fn require_wget(&self) -> Result<&PathBuf, OzoneError> {
        self.wget
            .as_ref()
            .ok_or_else(|| OzoneError::MissingTool("wget".to_string()))
    }
}

impl Retriever for WgetRetriever {
    fn retrieve(&self, url: &str, destination_dir: &Path) -> Result<(), OzoneError> {
        let wget = self.require_wget()?;
        let output = Command::new(wget)
            .arg(format!("--tries={}", self.tries))
            .arg("--quiet")
            .arg(url)
            .current_dir(destination_dir)
            .output()
            .map_err(|err| OzoneError::Download(format!("{}: {err}", wget.display())))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = match (output.status.code(), stderr.is_empty()) {
            (Some(code), true) => format!("wget exited with status {code} for {url}"),
            (None, true) => format!("wget terminated by signal for {url}"),
            (_, false) => stderr,
        };
        Err(OzoneError::Download(message))
    }
}

#[derive(Clone)]
pub struct HttpRetriever {
    client: Client,
}

impl HttpRetriever {
    pub fn new() -> Result<Self, OzoneError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ozone-aux/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OzoneError::Download(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| OzoneError::Download(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Retriever for HttpRetriever {
    fn retrieve(&self, url: &str, destination_dir: &Path) -> Result<(), OzoneError> {
        let file_name = file_name_from_url(url)
            .ok_or_else(|| OzoneError::Download(format!("no file name in url {url}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| OzoneError::Download(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .status()
                .canonical_reason()
                .unwrap_or("archive request failed")
                .to_string();
            return Err(OzoneError::DownloadStatus { status, message });
        }
        let bytes = response
            .bytes()
            .map_err(|err| OzoneError::Download(err.to_string()))?;

        fs::create_dir_all(destination_dir)
            .map_err(|err| OzoneError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix(".ozone-aux-part")
            .tempfile_in(destination_dir)
            .map_err(|err| OzoneError::Filesystem(err.to_string()))?;
        temp.write_all(&bytes)
            .map_err(|err| OzoneError::Filesystem(err.to_string()))?;
        temp.persist(destination_dir.join(file_name))
            .map_err(|err| OzoneError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

/// Last path segment of a URL, ignoring any query string.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    if name.is_empty() { None } else { Some(name) }
}

pub(crate) fn find_in_path(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.exists().then(|| candidate.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    find_in_dirs(name, std::env::split_paths(&path_var))
}

fn find_in_dirs<I>(name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::app::NoopSink;
    use crate::download::{Downloader, RetryPolicy};

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(
            file_name_from_url("https://host/omi/data/ozone/Y2010/L3_ozone_omi_20100101.txt"),
            Some("L3_ozone_omi_20100101.txt")
        );
        assert_eq!(
            file_name_from_url("https://host/a/b.txt?token=1"),
            Some("b.txt")
        );
        assert_eq!(file_name_from_url("https://host/dir/"), None);
    }

    #[test]
    fn missing_wget_is_reported() {
        let retriever = WgetRetriever {
            wget: None,
            tries: 5,
        };
        let temp = tempfile::tempdir().unwrap();
        let err = retriever
            .retrieve("https://host/file.txt", temp.path())
            .unwrap_err();
        assert_matches!(err, OzoneError::MissingTool(_));
    }

    #[test]
    fn missing_wget_fails_each_url_not_the_batch() {
        let temp = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(
            WgetRetriever {
                wget: None,
                tries: 5,
            },
            RetryPolicy::immediate(1),
        );
        let urls = [
            "https://host/Y2010/L3_ozone_omi_20100101.txt",
            "https://host/Y2010/L3_ozone_omi_20100102.txt",
        ];

        let report = downloader
            .download(&urls, &temp.path().join("2010"), &NoopSink)
            .unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.succeeded(), 0);
        assert!(report.outcomes.iter().all(|outcome| outcome.attempts == 2));
        assert!(
            report.outcomes[0]
                .error
                .as_deref()
                .unwrap()
                .contains("wget")
        );
    }

    #[test]
    fn lookup_finds_exact_name_only() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        fs::create_dir(&bin).unwrap();
        fs::write(bin.join("convert_ozone.exe"), b"").unwrap();
        fs::create_dir(bin.join("wget")).unwrap();
        fs::write(bin.join("convert_ozone"), b"").unwrap();

        let dirs = || vec![temp.path().to_path_buf(), bin.clone()];
        assert_eq!(
            find_in_dirs("convert_ozone", dirs()),
            Some(bin.join("convert_ozone"))
        );
        assert_eq!(find_in_dirs("wget", dirs()), None);
    }
}
