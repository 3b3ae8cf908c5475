use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use chrono::NaiveDate;

use ozone_aux::app::NoopSink;
use ozone_aux::convert::{ConversionLog, Converter};
use ozone_aux::domain::Instrument;
use ozone_aux::download::{Downloader, RetryPolicy};
use ozone_aux::error::OzoneError;
use ozone_aux::retrieve::{Retriever, file_name_from_url};
use ozone_aux::store::AuxStore;
use ozone_aux::urls::UrlBuilder;
use ozone_aux::year::{SkipReason, YearProcessor, YearState};

/// Serves only the file names it was seeded with. A seeded name can map to a
/// different name on disk, to simulate odd archive content.
#[derive(Default)]
struct MockArchive {
    files: HashMap<String, Vec<String>>,
    calls: Mutex<usize>,
}

impl MockArchive {
    fn serve(mut self, name: &str) -> Self {
        self.files.insert(name.to_string(), vec![name.to_string()]);
        self
    }

    fn serve_as(mut self, name: &str, written: &[&str]) -> Self {
        self.files.insert(
            name.to_string(),
            written.iter().map(|name| name.to_string()).collect(),
        );
        self
    }
}

impl Retriever for MockArchive {
    fn retrieve(&self, url: &str, destination_dir: &Path) -> Result<(), OzoneError> {
        *self.calls.lock().unwrap() += 1;
        let name = file_name_from_url(url).unwrap();
        let Some(written) = self.files.get(name) else {
            return Err(OzoneError::DownloadStatus {
                status: 404,
                message: "Not Found".to_string(),
            });
        };
        for file in written {
            fs::write(destination_dir.join(file), format!("ozone from {url}")).unwrap();
        }
        Ok(())
    }
}

#[derive(Default)]
struct MockConverter {
    calls: Mutex<Vec<(PathBuf, PathBuf, Instrument)>>,
    fail_on: Vec<String>,
    stamp: String,
}

impl Converter for MockConverter {
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        source: Instrument,
    ) -> Result<ConversionLog, OzoneError> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf(), source));
        let name = input.file_name().unwrap().to_string_lossy().to_string();
        if self.fail_on.contains(&name) {
            return Err(OzoneError::Conversion(format!("bad input {name}")));
        }
        assert!(!output.exists(), "output must be removed before conversion");
        fs::write(output, format!("{}:{}", self.stamp, source.label())).unwrap();
        Ok(ConversionLog::default())
    }
}

fn store_in(root: &Path) -> AuxStore {
    let root = Utf8PathBuf::from_path_buf(root.to_path_buf()).unwrap();
    AuxStore::new(root.join("ledaps_aux"), root.join("ep_toms"))
}

fn processor(
    store: AuxStore,
    archive: MockArchive,
    converter: MockConverter,
) -> YearProcessor<MockArchive, MockConverter> {
    YearProcessor::new(
        store,
        UrlBuilder::default(),
        Downloader::new(archive, RetryPolicy::immediate(0)),
        converter,
    )
}

fn mid_2024() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[test]
fn backup_instrument_fills_in_when_primary_missing() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let archive = MockArchive::default()
        .serve("L3_ozone_epc_20050110.txt")
        .serve("L3_ozone_epc_20050111.txt")
        .serve("L3_ozone_omi_20050111.txt");
    let converter = MockConverter {
        stamp: "new".to_string(),
        ..Default::default()
    };
    let processor = processor(store.clone(), archive, converter);

    let report = processor.process(2005, mid_2024(), &NoopSink).unwrap();

    assert_eq!(report.instruments, vec![Instrument::Omi, Instrument::EarthProbe]);
    assert_eq!(report.through_day, 365);
    assert_eq!(report.state, YearState::Done);
    assert_eq!(report.download.outcomes.len(), 730);
    assert_eq!(report.download.succeeded(), 3);

    assert_eq!(report.converted.len(), 2);
    assert_eq!(report.converted[0].day_of_year, 10);
    assert_eq!(report.converted[0].source, Instrument::EarthProbe);
    assert_eq!(report.converted[1].day_of_year, 11);
    assert_eq!(report.converted[1].source, Instrument::Omi);
    assert_eq!(report.skipped.len(), 363);
    assert!(
        report
            .skipped
            .iter()
            .all(|skip| skip.reason == SkipReason::NoCandidates)
    );

    let day_10 = store.output_path(2005, 10);
    assert_eq!(fs::read_to_string(&day_10).unwrap(), "new:EARTHPROBE");
    assert_eq!(
        fs::read_to_string(store.output_path(2005, 11)).unwrap(),
        "new:OMI"
    );

    let staging = store.staging_dir(2005);
    assert!(staging.as_std_path().is_dir());
    assert_eq!(fs::read_dir(staging.as_std_path()).unwrap().count(), 0);
}

#[test]
fn rerun_replaces_existing_output() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    store.ensure_output_dir(1999).unwrap();
    fs::write(store.output_path(1999, 32), "old").unwrap();

    let archive = MockArchive::default().serve("L3_ozone_epc_19990201.txt");
    let converter = MockConverter {
        stamp: "new".to_string(),
        ..Default::default()
    };
    let processor = processor(store.clone(), archive, converter);

    let report = processor.process(1999, mid_2024(), &NoopSink).unwrap();

    assert_eq!(report.converted.len(), 1);
    assert!(report.converted[0].replaced);
    assert_eq!(
        fs::read_to_string(store.output_path(1999, 32)).unwrap(),
        "new:EARTHPROBE"
    );
    let outputs = fs::read_dir(store.output_dir(1999).as_std_path())
        .unwrap()
        .count();
    assert_eq!(outputs, 1);
}

#[test]
fn current_year_stops_at_today() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let archive = MockArchive::default().serve("L3_ozone_omi_20240301.txt");
    let processor = processor(store, archive, MockConverter::default());

    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let report = processor.process(2024, today, &NoopSink).unwrap();

    assert_eq!(report.through_day, 61);
    assert_eq!(report.download.outcomes.len(), 61);
    assert_eq!(report.converted.len(), 1);
    assert_eq!(report.converted[0].day_of_year, 61);
}

#[test]
fn per_day_failures_do_not_stop_the_year() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let archive = MockArchive::default()
        .serve("L3_ozone_m3t_19920101.txt")
        .serve("L3_ozone_m3t_19920102.txt")
        .serve_as("L3_ozone_n7t_19920103.txt", &["L3_ozone_abc_19920103.txt"])
        .serve_as(
            "L3_ozone_m3t_19920104.txt",
            &["L3_ozone_abc_19920104.txt", "L3_ozone_xyz_19920104.txt"],
        )
        .serve("L3_ozone_n7t_19920105.txt");
    let converter = MockConverter {
        fail_on: vec!["L3_ozone_m3t_19920102.txt".to_string()],
        ..Default::default()
    };
    let processor = processor(store.clone(), archive, converter);

    let report = processor.process(1992, mid_2024(), &NoopSink).unwrap();

    let converted_days: Vec<u32> = report.converted.iter().map(|day| day.day_of_year).collect();
    assert_eq!(converted_days, vec![1, 5]);
    assert_eq!(report.converted[1].source, Instrument::Nimbus7);

    let reason_for = |day: u32| {
        report
            .skipped
            .iter()
            .find(|skip| skip.day_of_year == day)
            .map(|skip| skip.reason.clone())
            .unwrap()
    };
    assert_matches!(reason_for(2), SkipReason::ConversionFailed { .. });
    assert_matches!(reason_for(3), SkipReason::UnknownSource { file } if file == "L3_ozone_abc_19920103.txt");
    assert_matches!(reason_for(4), SkipReason::Unresolved { candidates } if candidates.len() == 2);
    assert_eq!(reason_for(6), SkipReason::NoCandidates);
    assert_eq!(report.state, YearState::Done);
}

#[test]
fn gap_year_fails_without_touching_disk() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let processor = processor(store.clone(), MockArchive::default(), MockConverter::default());

    let err = processor.process(1995, mid_2024(), &NoopSink).unwrap_err();

    assert_matches!(err, OzoneError::NoCoverage(1995));
    assert!(!store.staging_dir(1995).as_std_path().exists());
    assert!(!store.output_dir(1995).as_std_path().exists());
}
