use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::convert::Converter;
use crate::coverage;
use crate::domain::{Instrument, date_for_day, date_stamp, days_in_year};
use crate::download::{DownloadReport, Downloader};
use crate::error::OzoneError;
use crate::resolve::{self, StagedFile};
use crate::retrieve::Retriever;
use crate::store::AuxStore;
use crate::urls::{CandidateUrl, UrlBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YearState {
    Resolving,
    Downloading,
    PerDayConvert,
    Cleanup,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NoCandidates,
    Unresolved { candidates: Vec<String> },
    UnknownSource { file: String },
    ConversionFailed { file: String, message: String },
    Filesystem { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySkip {
    pub day_of_year: u32,
    pub date: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertedDay {
    pub day_of_year: u32,
    pub source: Instrument,
    pub input: String,
    pub output: String,
    pub replaced: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearReport {
    pub year: i32,
    pub instruments: Vec<Instrument>,
    pub through_day: u32,
    pub state: YearState,
    pub download: DownloadReport,
    pub converted: Vec<ConvertedDay>,
    pub skipped: Vec<DaySkip>,
    pub cleanup_error: Option<String>,
}

/// Last day-of-year to process: today for the running year, the whole year
/// otherwise.
pub fn day_bound(year: i32, today: NaiveDate) -> u32 {
    if year == today.year() {
        today.ordinal()
    } else {
        days_in_year(year)
    }
}

pub struct YearProcessor<R: Retriever, C: Converter> {
    store: AuxStore,
    urls: UrlBuilder,
    downloader: Downloader<R>,
    converter: C,
}

impl<R: Retriever, C: Converter> YearProcessor<R, C> {
    pub fn new(store: AuxStore, urls: UrlBuilder, downloader: Downloader<R>, converter: C) -> Self {
        Self {
            store,
            urls,
            downloader,
            converter,
        }
    }

    pub fn store(&self) -> &AuxStore {
        &self.store
    }

    pub fn process(
        &self,
        year: i32,
        today: NaiveDate,
        sink: &dyn ProgressSink,
    ) -> Result<YearReport, OzoneError> {
        let started = Instant::now();
        let mut state = YearState::Resolving;

        let Some(instruments) = coverage::resolve(year) else {
            transition(year, state, YearState::Failed, sink);
            sink.event(ProgressEvent::warn(format!(
                "could not resolve an ozone data source for year {year}"
            )));
            return Err(OzoneError::NoCoverage(year));
        };
        let through_day = day_bound(year, today);

        state = transition(year, state, YearState::Downloading, sink);
        let mut candidates: Vec<CandidateUrl> = Vec::new();
        for instrument in instruments {
            candidates.extend(self.urls.build_daily_urls(*instrument, year, through_day)?);
        }
        sink.event(ProgressEvent::info(format!(
            "downloading {} files for year {year} (days 1-{through_day}, sources {})",
            candidates.len(),
            instruments
                .iter()
                .map(|instrument| instrument.label())
                .collect::<Vec<_>>()
                .join(", ")
        )));
        let staging = self.store.staging_dir(year);
        let download = self
            .downloader
            .download(&candidates, staging.as_std_path(), sink)?;

        state = transition(year, state, YearState::PerDayConvert, sink);
        let converted = self.convert_days(year, through_day, sink);

        state = transition(year, state, YearState::Cleanup, sink);
        let cleanup_error = match self.store.clear_staging(year) {
            Ok(removed) => {
                sink.event(ProgressEvent::info(format!(
                    "removed {removed} downloaded files from {staging}"
                )));
                None
            }
            Err(err) => {
                sink.event(ProgressEvent::warn(format!(
                    "could not clean {staging}: {err}"
                )));
                Some(err.to_string())
            }
        };

        let (converted, skipped) = converted?;
        state = transition(year, state, YearState::Done, sink);
        sink.event(
            ProgressEvent::info(format!(
                "year {year}: converted {} of {through_day} days, skipped {}",
                converted.len(),
                skipped.len()
            ))
            .with_elapsed(started.elapsed()),
        );

        Ok(YearReport {
            year,
            instruments: instruments.to_vec(),
            through_day,
            state,
            download,
            converted,
            skipped,
            cleanup_error,
        })
    }

    fn convert_days(
        &self,
        year: i32,
        through_day: u32,
        sink: &dyn ProgressSink,
    ) -> Result<(Vec<ConvertedDay>, Vec<DaySkip>), OzoneError> {
        if self.store.ensure_output_dir(year)? {
            sink.event(ProgressEvent::info(format!(
                "{} does not exist... created",
                self.store.output_dir(year)
            )));
        }
        let staged = resolve::scan_staged(self.store.staging_dir(year).as_std_path())?;

        let mut converted = Vec::new();
        let mut skipped = Vec::new();
        for day_of_year in 1..=through_day {
            let date = date_for_day(year, day_of_year).ok_or(OzoneError::InvalidDayOfYear {
                year,
                day: day_of_year,
            })?;
            match self.convert_day(year, day_of_year, date, &staged, sink) {
                Ok(day) => converted.push(day),
                Err(reason) => {
                    sink.event(ProgressEvent::warn(format!(
                        "skipping year {year} doy {day_of_year} ({}): {}; processing will continue",
                        date_stamp(date),
                        describe(&reason)
                    )));
                    skipped.push(DaySkip {
                        day_of_year,
                        date: date_stamp(date),
                        reason,
                    });
                }
            }
        }
        Ok((converted, skipped))
    }

    fn convert_day(
        &self,
        year: i32,
        day_of_year: u32,
        date: NaiveDate,
        staged: &[StagedFile],
        sink: &dyn ProgressSink,
    ) -> Result<ConvertedDay, SkipReason> {
        let candidates = resolve::candidates_for(staged, date);
        if candidates.is_empty() {
            return Err(SkipReason::NoCandidates);
        }
        let chosen = resolve::resolve_day(&candidates).ok_or_else(|| SkipReason::Unresolved {
            candidates: candidates
                .iter()
                .map(|file| file.file_name().to_string())
                .collect(),
        })?;
        let source = chosen.instrument().ok_or_else(|| SkipReason::UnknownSource {
            file: chosen.file_name().to_string(),
        })?;

        let output = self.store.output_path(year, day_of_year);
        let replaced = self
            .store
            .remove_existing_output(year, day_of_year)
            .map_err(|err| SkipReason::Filesystem {
                message: err.to_string(),
            })?;

        sink.event(ProgressEvent::info(format!(
            "converting {} -> {output} ({})",
            chosen.file_name(),
            source.label()
        )));
        let log = self
            .converter
            .convert(chosen.path(), output.as_std_path(), source)
            .map_err(|err| SkipReason::ConversionFailed {
                file: chosen.file_name().to_string(),
                message: err.to_string(),
            })?;
        for captured in [log.stdout, log.stderr] {
            if !captured.is_empty() {
                sink.event(ProgressEvent::debug(captured));
            }
        }

        Ok(ConvertedDay {
            day_of_year,
            source,
            input: chosen.path().display().to_string(),
            output: output.to_string(),
            replaced,
        })
    }
}

fn transition(
    year: i32,
    from: YearState,
    to: YearState,
    sink: &dyn ProgressSink,
) -> YearState {
    sink.event(ProgressEvent::debug(format!(
        "year {year}: {from:?} -> {to:?}"
    )));
    to
}

fn describe(reason: &SkipReason) -> String {
    match reason {
        SkipReason::NoCandidates => "no ozone data available".to_string(),
        SkipReason::Unresolved { candidates } => {
            format!("could not resolve files {}", candidates.join(", "))
        }
        SkipReason::UnknownSource { file } => format!("unknown ozone source for {file}"),
        SkipReason::ConversionFailed { file, message } => {
            format!("conversion of {file} failed: {message}")
        }
        SkipReason::Filesystem { message } => message.clone(),
    }
}
