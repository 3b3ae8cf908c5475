use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::domain::{Instrument, date_stamp};
use crate::error::OzoneError;
use crate::fs_util;
use crate::registry::FILE_EXT;

static DATE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(\d{{8}})\.{FILE_EXT}$")).unwrap());

/// A downloaded daily file. Date and instrument tag come from the file name
/// (`L3_ozone_<tag>_<YYYYMMDD>.txt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    path: PathBuf,
    file_name: String,
    date_stamp: String,
    tag: Option<String>,
}

impl StagedFile {
    /// `None` when the name carries no `<YYYYMMDD>.txt` suffix.
    pub fn parse(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let date_stamp = DATE_SUFFIX.captures(&file_name)?.get(1)?.as_str().to_string();
        let tag = file_name
            .split('_')
            .nth(2)
            .filter(|tag| !tag.is_empty())
            .map(|tag| tag.to_string());
        Some(Self {
            path: path.to_path_buf(),
            file_name,
            date_stamp,
            tag,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn date_stamp(&self) -> &str {
        &self.date_stamp
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn instrument(&self) -> Option<Instrument> {
        self.tag().and_then(Instrument::from_code)
    }

    pub fn is_for(&self, date: NaiveDate) -> bool {
        self.date_stamp == date_stamp(date)
    }
}

/// Regular files in `dir` that look like daily ozone files, sorted by name.
pub fn scan_staged(dir: &Path) -> Result<Vec<StagedFile>, OzoneError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    Ok(fs_util::list_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter_map(|path| StagedFile::parse(&path))
        .collect())
}

pub fn candidates_for(staged: &[StagedFile], date: NaiveDate) -> Vec<StagedFile> {
    staged
        .iter()
        .filter(|file| file.is_for(date))
        .cloned()
        .collect()
}

/// Picks the file to convert for one day. A lone candidate wins regardless of
/// its tag; otherwise the highest-priority recognized instrument wins, first
/// in list order on ties.
pub fn resolve_day(candidates: &[StagedFile]) -> Option<&StagedFile> {
    match candidates {
        [] => None,
        [only] => Some(only),
        _ => Instrument::PRIORITY.iter().find_map(|instrument| {
            candidates
                .iter()
                .find(|file| file.instrument() == Some(*instrument))
        }),
    }
}
