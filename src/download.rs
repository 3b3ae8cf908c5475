use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::error::OzoneError;
use crate::fs_util::{self, Prepared};
use crate::retrieve::Retriever;

/// Fixed-delay retry: one initial attempt plus `max_retries` more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UrlOutcome {
    pub url: String,
    pub attempts: u32,
    pub succeeded: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub outcomes: Vec<UrlOutcome>,
}

impl DownloadReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.succeeded).count()
    }

    pub fn failed_urls(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.succeeded)
            .map(|outcome| outcome.url.clone())
            .collect()
    }
}

pub struct Downloader<R: Retriever> {
    retriever: R,
    policy: RetryPolicy,
}

impl<R: Retriever> Downloader<R> {
    pub fn new(retriever: R, policy: RetryPolicy) -> Self {
        Self { retriever, policy }
    }

    pub fn retriever(&self) -> &R {
        &self.retriever
    }

    /// Fetches every URL into `destination`. Individual URL failures end up in
    /// the report; only an unusable destination directory is an error.
    pub fn download<U: AsRef<str>>(
        &self,
        urls: &[U],
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadReport, OzoneError> {
        match fs_util::prepare_dir(destination)? {
            Prepared::Created => sink.event(ProgressEvent::info(format!(
                "{} does not exist... created",
                destination.display()
            ))),
            Prepared::Cleaned { removed } => sink.event(ProgressEvent::info(format!(
                "cleaned download directory {} ({removed} stale files)",
                destination.display()
            ))),
        }

        let started = Instant::now();
        let outcomes = urls
            .iter()
            .map(|url| self.fetch_with_retries(url.as_ref(), destination, sink))
            .collect::<Vec<_>>();
        let report = DownloadReport { outcomes };

        sink.event(
            ProgressEvent::info(format!(
                "downloaded {} of {} files to {}",
                report.succeeded(),
                report.outcomes.len(),
                destination.display()
            ))
            .with_elapsed(started.elapsed()),
        );
        Ok(report)
    }

    fn fetch_with_retries(
        &self,
        url: &str,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> UrlOutcome {
        sink.event(ProgressEvent::debug(format!(
            "retrieving {url} to {}",
            destination.display()
        )));

        let mut attempts = 1;
        let mut result = self.retriever.retrieve(url, destination);
        while let Err(err) = &result {
            if attempts >= self.policy.max_attempts() {
                break;
            }
            sink.event(ProgressEvent::debug(format!("attempt {attempts} for {url} failed: {err}")));
            if !self.policy.delay.is_zero() {
                thread::sleep(self.policy.delay);
            }
            sink.event(ProgressEvent::info(format!(
                "retry {attempts} of {} for {url}",
                self.policy.max_retries
            )));
            attempts += 1;
            result = self.retriever.retrieve(url, destination);
        }

        match result {
            Ok(()) => UrlOutcome {
                url: url.to_string(),
                attempts,
                succeeded: true,
                error: None,
            },
            Err(err) => {
                sink.event(ProgressEvent::warn(format!(
                    "unsuccessful download of {url} after {attempts} attempts: {err}"
                )));
                UrlOutcome {
                    url: url.to_string(),
                    attempts,
                    succeeded: false,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}
