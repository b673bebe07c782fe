//! Fatal error types shared by every stage of a stress run.
//!
//! Only problems that invalidate the whole computation live here. Bad data on
//! a single peak never surfaces as one of these errors; the affected field is
//! left undefined instead.

use thiserror::Error;

use crate::Signal;

/// Raised when geometry cannot be placed in a usable reference system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceSystemError {
    /// A layer carries no reference system and the caller supplied none.
    #[error("layer `{layer}` has no reference system and no target was supplied")]
    Undefined {
        /// Name of the offending layer.
        layer: String,
    },
    /// The EPSG code is not one of the supported systems.
    #[error("unsupported reference system EPSG:{code}")]
    Unsupported {
        /// Numeric EPSG code.
        code: u32,
    },
    /// The reference system identifier could not be parsed.
    #[error("malformed reference system identifier `{value}`")]
    Malformed {
        /// Raw identifier as supplied.
        value: String,
    },
    /// No coordinates were available to choose a metric projection from.
    #[error("cannot choose a metric projection for an empty geometry set")]
    EmptyGeometry,
}

/// Raised when the scoring configuration is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A signal weight was negative or not finite.
    #[error("weight {weight} for signal `{signal}` must be finite and non-negative")]
    InvalidWeight {
        /// Signal the weight applies to.
        signal: Signal,
        /// Rejected value.
        weight: f64,
    },
    /// A configured signal weight was zero.
    #[error("weight for signal `{signal}` is zero; omit the signal to exclude it")]
    ZeroWeight {
        /// Signal carrying the zero weight.
        signal: Signal,
    },
    /// The weights over a set of present signals sum to zero.
    #[error("signal weights sum to zero over {signals:?}")]
    ZeroWeightSum {
        /// Signals whose weights were all zero.
        signals: Vec<Signal>,
    },
    /// A protection threshold was not finite.
    #[error("threshold {threshold} for protection class {class} must be finite")]
    InvalidThreshold {
        /// Protection class code.
        class: i64,
        /// Rejected value.
        threshold: f64,
    },
    /// The buffer radius was not a positive finite distance.
    #[error("buffer radius {radius} m must be finite and positive")]
    InvalidRadius {
        /// Rejected radius in metres.
        radius: f64,
    },
}
