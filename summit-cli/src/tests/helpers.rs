//! Test helpers for staging snapshots and configuration files on disk.

use super::*;
use crate::score::ViewCountFetcher;
use camino::{Utf8Path, Utf8PathBuf};
use geo::Point;
use std::cell::RefCell;
use std::fs;
use summit_core::test_support::square_area;
use summit_core::{Crs, Layer, Peak, RawSignals, Snapshot};
use tempfile::TempDir;

pub(super) const SERLES: Point<f64> = Point(geo::Coord { x: 11.38, y: 47.12 });

/// Temporary directory holding an input snapshot and run artefacts.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Write a snapshot with one named peak inside a class 4 area.
    pub(super) fn write_protected_peak(&self, name: &str, views: Option<i64>) -> Utf8PathBuf {
        let path = self.path("input.json");
        let peak = Peak::new(1, "Serles", SERLES).with_signals(RawSignals {
            view_count: views,
            ..RawSignals::default()
        });
        let mut snapshot = Snapshot::from_peaks(Layer::new("peaks", Some(Crs::Wgs84), vec![peak]));
        snapshot.protected_areas = Layer::new(
            "protected_areas",
            Some(Crs::Wgs84),
            vec![square_area(10, name, 4, SERLES, 0.05)],
        );
        summit_data::write_snapshot(&path, &snapshot).expect("write input snapshot");
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write file");
}

/// Fetcher that assigns a fixed count to every peak lacking one.
#[derive(Debug, Default)]
pub(super) struct StubFetcher {
    pub(super) views: i64,
    pub(super) calls: RefCell<Vec<String>>,
}

impl ViewCountFetcher for StubFetcher {
    fn fill_view_counts(
        &self,
        base_url: &str,
        peaks: &mut Layer<Peak>,
    ) -> Result<usize, CliError> {
        self.calls.borrow_mut().push(base_url.to_owned());
        let mut filled = 0;
        for peak in peaks.features_mut() {
            if peak.signals.view_count.is_none() {
                peak.signals.view_count = Some(self.views);
                filled += 1;
            }
        }
        Ok(filled)
    }
}
