//! Core domain types for summit stress scoring.
//!
//! A stress run relates peaks to three supporting layers: protected areas,
//! activity route segments, and webcams. This crate owns the shared
//! vocabulary for that work:
//! - the feature types and the [`Layer`] container that carries a declared
//!   reference system,
//! - the [`crs`] module, which reprojects layers between WGS84, Web Mercator,
//!   and UTM,
//! - the [`join`] module, which relates peak regions to nearby features
//!   through an R*-tree,
//! - the [`SignalSource`] trait used to pull raw usage signals from outside
//!   services.
//!
//! # Examples
//!
//! ```
//! use geo::Point;
//! use summit_core::{Crs, Layer, Peak, Snapshot, crs};
//!
//! let peaks = Layer::new(
//!     "peaks",
//!     Some(Crs::Wgs84),
//!     vec![Peak::new(1, "Patscherkofel", Point::new(11.46, 47.21))],
//! );
//! let mut snapshot = Snapshot::from_peaks(peaks);
//! let metric = crs::to_metric(&mut snapshot.layers_mut())?;
//! assert_eq!(metric.epsg(), 32_632);
//! # Ok::<(), summit_core::ReferenceSystemError>(())
//! ```

#![forbid(unsafe_code)]

pub mod crs;
mod error;
mod features;
pub mod join;
mod layer;
mod peak;
mod signal;
mod snapshot;
pub mod source;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crs::{Crs, Hemisphere};
pub use error::{ConfigurationError, ReferenceSystemError};
pub use features::{ProtectedArea, RouteSegment, Webcam};
pub use join::{JoinGeometry, Predicate, Region};
pub use layer::{GeoLayer, Layer, SpatialFeature};
pub use peak::{DerivedScores, Peak, RawSignals};
pub use signal::{Signal, SignalMeasures};
pub use snapshot::{PEAKS_LAYER, PROTECTED_AREAS_LAYER, ROUTES_LAYER, Snapshot, WEBCAMS_LAYER};
pub use source::SignalSource;
