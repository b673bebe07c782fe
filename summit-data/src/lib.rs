//! Data access for the summit stress engine.
//!
//! Responsibilities:
//! - Read and write snapshot documents: four named GeoJSON layers with
//!   declared reference systems.
//! - Provide network-backed [`summit_core::SignalSource`] implementations,
//!   with bounded retry and request throttling.
//!
//! Boundaries:
//! - Do not encode scoring rules (live in `summit-scorer`).
//! - Keep network failures inside the signal source; a failed lookup is an
//!   undefined signal, never an error returned to the pipeline.
//!
//! Invariants:
//! - Snapshot decoding either yields typed layers or a [`SnapshotError`];
//!   unusable property values are dropped and logged, never guessed.
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod pageviews;
mod snapshot;

pub use snapshot::{
    SnapshotError, parse_snapshot, read_snapshot, snapshot_to_string, write_snapshot,
};
