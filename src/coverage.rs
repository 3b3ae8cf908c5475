use crate::domain::Instrument;

/// A run of years served by the same instruments, primary first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageEntry {
    pub first_year: i32,
    /// Inclusive; `None` for the open-ended current entry.
    pub last_year: Option<i32>,
    pub instruments: &'static [Instrument],
}

impl CoverageEntry {
    pub fn contains(&self, year: i32) -> bool {
        year >= self.first_year && self.last_year.is_none_or(|last| year <= last)
    }

    pub fn primary(&self) -> Instrument {
        self.instruments[0]
    }

    pub fn backup(&self) -> Option<Instrument> {
        self.instruments.get(1).copied()
    }
}

// 1995 has no entry: no instrument published data that year.
static COVERAGE: [CoverageEntry; 6] = [
    CoverageEntry {
        first_year: 1978,
        last_year: Some(1990),
        instruments: &[Instrument::Nimbus7],
    },
    CoverageEntry {
        first_year: 1991,
        last_year: Some(1993),
        instruments: &[Instrument::Meteor3, Instrument::Nimbus7],
    },
    CoverageEntry {
        first_year: 1994,
        last_year: Some(1994),
        instruments: &[Instrument::Meteor3],
    },
    CoverageEntry {
        first_year: 1996,
        last_year: Some(2003),
        instruments: &[Instrument::EarthProbe],
    },
    CoverageEntry {
        first_year: 2004,
        last_year: Some(2005),
        instruments: &[Instrument::Omi, Instrument::EarthProbe],
    },
    CoverageEntry {
        first_year: 2006,
        last_year: None,
        instruments: &[Instrument::Omi],
    },
];

pub fn entries() -> &'static [CoverageEntry] {
    &COVERAGE
}

pub fn entry_for(year: i32) -> Option<&'static CoverageEntry> {
    COVERAGE.iter().find(|entry| entry.contains(year))
}

/// Instruments to fetch for `year`, primary first; `None` for gap years.
pub fn resolve(year: i32) -> Option<&'static [Instrument]> {
    entry_for(year).map(|entry| entry.instruments)
}
