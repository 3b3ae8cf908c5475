use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// First year with any TOMS ozone coverage. Full rescans start here.
pub const START_YEAR: i32 = 1978;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Instrument {
    Nimbus7,
    Meteor3,
    EarthProbe,
    Omi,
}

impl Instrument {
    /// Highest priority first, used when several instruments cover one day.
    pub const PRIORITY: [Instrument; 4] = [
        Instrument::Omi,
        Instrument::EarthProbe,
        Instrument::Meteor3,
        Instrument::Nimbus7,
    ];

    /// Three-letter tag embedded in daily file names.
    pub fn code(self) -> &'static str {
        match self {
            Instrument::Nimbus7 => "n7t",
            Instrument::Meteor3 => "m3t",
            Instrument::EarthProbe => "epc",
            Instrument::Omi => "omi",
        }
    }

    /// Source label passed to the converter.
    pub fn label(self) -> &'static str {
        match self {
            Instrument::Nimbus7 => "NIMBUS7",
            Instrument::Meteor3 => "METEOR3",
            Instrument::EarthProbe => "EARTHPROBE",
            Instrument::Omi => "OMI",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|instrument| instrument.code() == code)
    }

    pub fn priority(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|instrument| *instrument == self)
            .unwrap_or(Self::PRIORITY.len())
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RetrieverKind {
    Wget,
    Http,
}

impl fmt::Display for RetrieverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrieverKind::Wget => write!(f, "wget"),
            RetrieverKind::Http => write!(f, "http"),
        }
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Calendar date for a 1-based day-of-year, `None` outside the year.
pub fn date_for_day(year: i32, day_of_year: u32) -> Option<NaiveDate> {
    if day_of_year == 0 || day_of_year > days_in_year(year) {
        return None;
    }
    NaiveDate::from_yo_opt(year, day_of_year)
}

/// `YYYYMMDD`, the date stamp used in archive file names.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
