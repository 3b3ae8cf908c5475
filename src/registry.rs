use chrono::NaiveDate;

use crate::domain::{Instrument, date_stamp};

pub const DEFAULT_SERVER_URL: &str = "https://acd-ext.gsfc.nasa.gov/anonftp/toms";
pub const FILE_PREFIX: &str = "L3_ozone";
pub const FILE_EXT: &str = "txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentInfo {
    pub instrument: Instrument,
    /// Server-relative directory; the year is appended directly (`.../Y2004/`).
    pub base_path: &'static str,
    pub first_year: i32,
    /// Last year with published data, `None` while the instrument is active.
    pub last_year: Option<i32>,
}

impl InstrumentInfo {
    pub fn is_active(&self, year: i32) -> bool {
        year >= self.first_year && self.last_year.is_none_or(|last| year <= last)
    }
}

static REGISTRY: [InstrumentInfo; 4] = [
    InstrumentInfo {
        instrument: Instrument::Nimbus7,
        base_path: "/nimbus7/data/ozone/Y",
        first_year: 1978,
        last_year: Some(1993),
    },
    InstrumentInfo {
        instrument: Instrument::Meteor3,
        base_path: "/meteor3/data/ozone/Y",
        first_year: 1991,
        last_year: Some(1994),
    },
    InstrumentInfo {
        instrument: Instrument::EarthProbe,
        base_path: "/eptoms/data/ozone/Y",
        first_year: 1996,
        last_year: Some(2005),
    },
    InstrumentInfo {
        instrument: Instrument::Omi,
        base_path: "/omi/data/ozone/Y",
        first_year: 2004,
        last_year: None,
    },
];

pub fn lookup(instrument: Instrument) -> &'static InstrumentInfo {
    match instrument {
        Instrument::Nimbus7 => &REGISTRY[0],
        Instrument::Meteor3 => &REGISTRY[1],
        Instrument::EarthProbe => &REGISTRY[2],
        Instrument::Omi => &REGISTRY[3],
    }
}

pub fn all() -> &'static [InstrumentInfo] {
    &REGISTRY
}

/// `L3_ozone_<code>_<YYYYMMDD>.txt`
pub fn daily_file_name(instrument: Instrument, date: NaiveDate) -> String {
    format!(
        "{FILE_PREFIX}_{}_{}.{FILE_EXT}",
        instrument.code(),
        date_stamp(date)
    )
}
