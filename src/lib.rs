//! Facade crate for the summit stress engine.
//!
//! This crate re-exports the core domain types and the scoring pipeline, and
//! exposes snapshot I/O and the page-view signal source behind the
//! `snapshot` feature.

#![forbid(unsafe_code)]

pub use summit_core::{
    ConfigurationError, Crs, DerivedScores, Layer, Peak, ProtectedArea, RawSignals,
    ReferenceSystemError, RouteSegment, Signal, SignalMeasures, SignalSource, Snapshot, Webcam,
};
pub use summit_scorer::{
    PipelineError, SignalWeights, StressConfig, StressPipeline, StressReport, ThresholdTable,
    TieBreak,
};

#[cfg(feature = "snapshot")]
pub use summit_data::pageviews::HttpPageviewSource;
#[cfg(feature = "snapshot")]
pub use summit_data::{SnapshotError, read_snapshot, write_snapshot};
