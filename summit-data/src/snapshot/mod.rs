//! Multi-layer snapshot documents.
//!
//! A snapshot is a single JSON document holding named layers. Each layer pairs
//! a declared reference system with a GeoJSON feature collection:
//!
//! ```json
//! {
//!   "layers": {
//!     "peaks": {
//!       "crs": "EPSG:4326",
//!       "features": { "type": "FeatureCollection", "features": [] }
//!     }
//!   }
//! }
//! ```
//!
//! The `peaks` layer is required. Missing supporting layers are read as
//! empty, and a `null` or absent `crs` leaves the layer's reference system
//! undeclared so the scorer can decide what to do with it.

use std::collections::BTreeMap;
use std::io;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use summit_core::Snapshot;

mod decode;
mod encode;
mod error;

pub use error::SnapshotError;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    layers: BTreeMap<String, LayerDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayerDocument {
    #[serde(default)]
    crs: Option<String>,
    features: FeatureCollection,
}

/// Decode a snapshot from its JSON text.
///
/// # Errors
/// Returns [`SnapshotError`] when the text is not a snapshot document, the
/// peaks layer is missing, a layer declares an unsupported reference system,
/// or a feature carries the wrong geometry type.
///
/// # Examples
///
/// ```
/// use summit_data::parse_snapshot;
///
/// let snapshot = parse_snapshot(r#"{
///     "layers": {
///         "peaks": {
///             "crs": "EPSG:4326",
///             "features": {
///                 "type": "FeatureCollection",
///                 "features": [{
///                     "type": "Feature",
///                     "id": 7,
///                     "geometry": { "type": "Point", "coordinates": [11.31, 47.19] },
///                     "properties": { "name": "Nockspitze", "view_count": 420 }
///                 }]
///             }
///         }
///     }
/// }"#)?;
/// assert_eq!(snapshot.peaks.len(), 1);
/// assert!(snapshot.routes.is_empty());
/// # Ok::<(), summit_data::SnapshotError>(())
/// ```
pub fn parse_snapshot(json: &str) -> Result<Snapshot, SnapshotError> {
    let document: SnapshotDocument =
        serde_json::from_str(json).map_err(|source| SnapshotError::Decode { source })?;
    decode::decode(document)
}

/// Encode a snapshot as pretty-printed JSON text.
///
/// # Errors
/// Returns [`SnapshotError::Encode`] when serialisation fails.
pub fn snapshot_to_string(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    serde_json::to_string_pretty(&encode::encode(snapshot))
        .map_err(|source| SnapshotError::Encode { source })
}

/// Read and decode the snapshot stored at `path`.
///
/// # Errors
/// Returns [`SnapshotError::Read`] when the file cannot be read, or any
/// decoding error from [`parse_snapshot`].
pub fn read_snapshot(path: &Utf8Path) -> Result<Snapshot, SnapshotError> {
    let read_error = |source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    };
    let (dir, file_name) = open_dir_and_file(path).map_err(read_error)?;
    let json = dir.read_to_string(file_name.as_str()).map_err(read_error)?;
    let snapshot = parse_snapshot(&json)?;
    log::info!(
        "read snapshot {path}: {} peaks, {} protected areas, {} routes, {} webcams",
        snapshot.peaks.len(),
        snapshot.protected_areas.len(),
        snapshot.routes.len(),
        snapshot.webcams.len()
    );
    Ok(snapshot)
}

/// Encode `snapshot` and write it to `path`, creating parent directories.
///
/// # Errors
/// Returns [`SnapshotError::Write`] when the directory or file cannot be
/// written, or [`SnapshotError::Encode`] when serialisation fails.
pub fn write_snapshot(path: &Utf8Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let json = snapshot_to_string(snapshot)?;
    let write_error = |source| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };
    ensure_parent_dir(path).map_err(write_error)?;
    let (dir, file_name) = open_dir_and_file(path).map_err(write_error)?;
    dir.write(file_name.as_str(), json).map_err(write_error)?;
    log::info!("wrote snapshot {path}");
    Ok(())
}

fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("snapshot path should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }
    let (base, relative) = if parent.is_absolute() {
        ("/", parent.strip_prefix("/").unwrap_or(parent))
    } else {
        (".", parent)
    };
    fs_utf8::Dir::open_ambient_dir(base, ambient_authority())?.create_dir_all(relative)
}
