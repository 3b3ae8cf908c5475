use std::io::{self, Write};

use serde::Serialize;

use crate::app::{CampaignReport, EventLevel, ProgressEvent, ProgressSink};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_campaign(result: &CampaignReport) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Forwards progress events to the `tracing` subscriber.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        let elapsed = event.elapsed.map(|elapsed| format!("{elapsed:.1?}"));
        match (event.level, elapsed) {
            (EventLevel::Debug, _) => tracing::debug!("{}", event.message),
            (EventLevel::Info, Some(elapsed)) => tracing::info!(%elapsed, "{}", event.message),
            (EventLevel::Info, None) => tracing::info!("{}", event.message),
            (EventLevel::Warn, _) => tracing::warn!("{}", event.message),
        }
    }
}

pub fn print_summary(report: &CampaignReport) {
    println!(
        "ozone {}-{}: {} days converted, {} days skipped",
        report.start_year,
        report.end_year,
        report.converted_days(),
        report.skipped_days()
    );
    for outcome in &report.years {
        match &outcome.report {
            Some(year) => println!(
                "  {}: {} converted, {} skipped, {} downloads failed",
                outcome.year,
                year.converted.len(),
                year.skipped.len(),
                year.download.failed_urls().len()
            ),
            None => println!(
                "  {}: {}",
                outcome.year,
                outcome.error.as_deref().unwrap_or("not processed")
            ),
        }
    }
}
