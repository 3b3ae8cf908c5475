use std::fs;

use camino::Utf8PathBuf;

use crate::error::OzoneError;
use crate::fs_util;

pub const DEFAULT_STAGING_ROOT: &str = "/tmp/ep_toms";

/// Layout of the ancillary archive and of the per-year download area.
///
/// ```text
/// <aux_root>/EP_TOMS/ozone_<YYYY>/TOMS_<YYYY><DDD>.hdf
/// <staging_root>/<YYYY>/L3_ozone_<code>_<YYYYMMDD>.txt
/// ```
#[derive(Debug, Clone)]
pub struct AuxStore {
    aux_root: Utf8PathBuf,
    staging_root: Utf8PathBuf,
}

impl AuxStore {
    pub fn new(aux_root: Utf8PathBuf, staging_root: Utf8PathBuf) -> Self {
        Self {
            aux_root,
            staging_root,
        }
    }

    pub fn output_dir(&self, year: i32) -> Utf8PathBuf {
        self.aux_root.join("EP_TOMS").join(format!("ozone_{year}"))
    }

    pub fn output_path(&self, year: i32, day_of_year: u32) -> Utf8PathBuf {
        self.output_dir(year)
            .join(format!("TOMS_{year}{day_of_year:03}.hdf"))
    }

    pub fn staging_dir(&self, year: i32) -> Utf8PathBuf {
        self.staging_root.join(year.to_string())
    }

    /// Returns `true` when the directory had to be created.
    pub fn ensure_output_dir(&self, year: i32) -> Result<bool, OzoneError> {
        let dir = self.output_dir(year);
        if dir.as_std_path().is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| OzoneError::Filesystem(format!("create {dir}: {err}")))?;
        Ok(true)
    }

    /// Deletes the canonical file for one day if present.
    pub fn remove_existing_output(&self, year: i32, day_of_year: u32) -> Result<bool, OzoneError> {
        let path = self.output_path(year, day_of_year);
        if !path.as_std_path().is_file() {
            return Ok(false);
        }
        fs::remove_file(path.as_std_path())
            .map_err(|err| OzoneError::Filesystem(format!("remove {path}: {err}")))?;
        Ok(true)
    }

    /// Deletes every `TOMS_<year>*.hdf` file from the year's output directory.
    pub fn clean_output_dir(&self, year: i32) -> Result<usize, OzoneError> {
        let dir = self.output_dir(year);
        if !dir.as_std_path().is_dir() {
            return Ok(0);
        }
        let prefix = format!("TOMS_{year}");
        fs_util::remove_files_matching(dir.as_std_path(), |name| {
            name.strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".hdf"))
                .map(|digits| digits.chars().all(|ch| ch.is_ascii_digit()))
                .unwrap_or(false)
        })
    }

    /// Empties the year's staging directory, leaving the directory in place.
    pub fn clear_staging(&self, year: i32) -> Result<usize, OzoneError> {
        fs_util::clear_dir(self.staging_dir(year).as_std_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(root: &std::path::Path) -> AuxStore {
        let root = Utf8PathBuf::from_path_buf(root.to_path_buf()).unwrap();
        AuxStore::new(root.join("aux"), root.join("staging"))
    }

    #[test]
    fn layout_paths() {
        let store = AuxStore::new("/data/aux".into(), DEFAULT_STAGING_ROOT.into());
        assert_eq!(
            store.output_path(2004, 7),
            Utf8PathBuf::from("/data/aux/EP_TOMS/ozone_2004/TOMS_2004007.hdf")
        );
        assert_eq!(store.staging_dir(1991), Utf8PathBuf::from("/tmp/ep_toms/1991"));
    }

    #[test]
    fn clean_output_only_touches_the_year() {
        let temp = tempfile::tempdir().unwrap();
        let store = store_in(temp.path());
        store.ensure_output_dir(2001).unwrap();
        let dir = store.output_dir(2001);
        fs::write(dir.join("TOMS_2001001.hdf"), b"x").unwrap();
        fs::write(dir.join("TOMS_2001002.hdf"), b"x").unwrap();
        fs::write(dir.join("TOMS_2002001.hdf"), b"x").unwrap();
        fs::write(dir.join("README"), b"x").unwrap();

        assert_eq!(store.clean_output_dir(2001).unwrap(), 2);
        assert!(dir.join("TOMS_2002001.hdf").exists());
        assert!(dir.join("README").exists());
    }

    #[test]
    fn remove_existing_output_reports_presence() {
        let temp = tempfile::tempdir().unwrap();
        let store = store_in(temp.path());
        assert!(store.ensure_output_dir(2010).unwrap());
        assert!(!store.ensure_output_dir(2010).unwrap());
        assert!(!store.remove_existing_output(2010, 1).unwrap());
        fs::write(store.output_path(2010, 1), b"old").unwrap();
        assert!(store.remove_existing_output(2010, 1).unwrap());
    }
}
