use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::convert::Converter;
use crate::domain::START_YEAR;
use crate::error::OzoneError;
use crate::retrieve::Retriever;
use crate::year::{YearProcessor, YearReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub level: EventLevel,
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            elapsed: None,
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Debug, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Warn, message)
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }
}

/// Receives everything a run wants to say. Passed explicitly to each
/// component for the lifetime of one campaign.
pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSelection {
    Range { start: i32, end: i32 },
    /// The running year, plus the previous one during January.
    MostRecent,
    /// Everything from `START_YEAR` through the running year.
    FullRescan,
}

impl YearSelection {
    /// Most-recent wins over full rescan, which wins over an explicit range.
    pub fn from_flags(
        start: Option<i32>,
        end: Option<i32>,
        most_recent: bool,
        full_rescan: bool,
    ) -> Result<Self, OzoneError> {
        if most_recent {
            return Ok(YearSelection::MostRecent);
        }
        if full_rescan {
            return Ok(YearSelection::FullRescan);
        }
        match (start, end) {
            (Some(start), Some(end)) if start > 0 && end > 0 && start <= end => {
                Ok(YearSelection::Range { start, end })
            }
            (Some(start), Some(end)) => Err(OzoneError::InvalidSelection(format!(
                "start year {start} and end year {end} do not form a range"
            ))),
            _ => Err(OzoneError::InvalidSelection(
                "no years selected".to_string(),
            )),
        }
    }

    pub fn years(&self, today: NaiveDate) -> RangeInclusive<i32> {
        match *self {
            YearSelection::Range { start, end } => start..=end,
            YearSelection::MostRecent if today.ordinal() <= 31 => today.year() - 1..=today.year(),
            YearSelection::MostRecent => today.year()..=today.year(),
            YearSelection::FullRescan => START_YEAR..=today.year(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CampaignOptions {
    /// Remove a year's existing canonical files before reprocessing it.
    pub clean_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YearStatus {
    Processed,
    NoCoverage,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearOutcome {
    pub year: i32,
    pub status: YearStatus,
    pub report: Option<YearReport>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub start_year: i32,
    pub end_year: i32,
    pub years: Vec<YearOutcome>,
}

impl CampaignReport {
    pub fn converted_days(&self) -> usize {
        self.years
            .iter()
            .filter_map(|outcome| outcome.report.as_ref())
            .map(|report| report.converted.len())
            .sum()
    }

    pub fn skipped_days(&self) -> usize {
        self.years
            .iter()
            .filter_map(|outcome| outcome.report.as_ref())
            .map(|report| report.skipped.len())
            .sum()
    }
}

pub struct App<R: Retriever, C: Converter> {
    processor: YearProcessor<R, C>,
    options: CampaignOptions,
}

impl<R: Retriever, C: Converter> App<R, C> {
    pub fn new(processor: YearProcessor<R, C>, options: CampaignOptions) -> Self {
        Self { processor, options }
    }

    /// Processes each selected year in ascending order. A failed year is
    /// recorded and the campaign moves on.
    pub fn run(
        &self,
        selection: YearSelection,
        today: NaiveDate,
        sink: &dyn ProgressSink,
    ) -> CampaignReport {
        let started = Instant::now();
        let years = selection.years(today);
        let (start_year, end_year) = (*years.start(), *years.end());
        sink.event(ProgressEvent::info(format!(
            "processing ozone data for {start_year} - {end_year}"
        )));

        let mut outcomes = Vec::new();
        for year in years {
            sink.event(ProgressEvent::info(format!("processing year {year}")));
            if self.options.clean_target {
                match self.processor.store().clean_output_dir(year) {
                    Ok(removed) => sink.event(ProgressEvent::info(format!(
                        "cleaned {removed} files from {}",
                        self.processor.store().output_dir(year)
                    ))),
                    Err(err) => sink.event(ProgressEvent::warn(format!(
                        "could not clean output for year {year}: {err}"
                    ))),
                }
            }
            outcomes.push(self.run_year(year, today, sink));
        }

        sink.event(
            ProgressEvent::info("ozone processing complete").with_elapsed(started.elapsed()),
        );
        CampaignReport {
            start_year,
            end_year,
            years: outcomes,
        }
    }

    fn run_year(&self, year: i32, today: NaiveDate, sink: &dyn ProgressSink) -> YearOutcome {
        match self.processor.process(year, today, sink) {
            Ok(report) => YearOutcome {
                year,
                status: YearStatus::Processed,
                report: Some(report),
                error: None,
            },
            Err(err) => {
                sink.event(ProgressEvent::warn(format!(
                    "problems occurred while processing ozone data for year {year}: {err}; processing will continue"
                )));
                let status = match err {
                    OzoneError::NoCoverage(_) => YearStatus::NoCoverage,
                    _ => YearStatus::Failed,
                };
                YearOutcome {
                    year,
                    status,
                    report: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}
