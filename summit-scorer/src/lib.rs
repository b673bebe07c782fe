//! Stress scoring for summit peaks.
//!
//! The crate turns a [`Snapshot`](summit_core::Snapshot) into per-peak
//! stress scores in five stages:
//! - **Signal normalisation** maps each raw usage signal onto `0.0..=1.0`
//!   relative to the busiest peak, treating zero as "not observed" and
//!   log-scaling the heavily skewed signals.
//! - **Weighted aggregation** averages the measures a peak actually has,
//!   renormalising the configured weights over them.
//! - **Protection classification** finds the protected area each peak lies
//!   in and looks up its threshold.
//! - **Stress scoring** subtracts that threshold from the aggregate.
//! - The [`StressPipeline`] wires the stages together with the reference
//!   system normaliser and the spatial joins from `summit-core`.
//!
//! # Examples
//!
//! ```
//! use summit_core::{Signal, SignalMeasures};
//! use summit_scorer::{SignalWeights, Transform, aggregate, normalise, score};
//!
//! let wiki = normalise(&[Some(100.0), Some(50.0), None], Transform::NaturalLog);
//! let weights = SignalWeights::new([(Signal::PageViews, 1.0)]);
//! let measures = SignalMeasures { wiki: wiki[1], ..SignalMeasures::default() };
//! let popularity = aggregate(&measures, &weights)?;
//! let stress = score(popularity, Some(0.9)).unwrap();
//! assert!((stress + 0.051).abs() < 1e-3);
//! # Ok::<(), summit_core::ConfigurationError>(())
//! ```

#![forbid(unsafe_code)]

mod aggregate;
mod config;
mod error;
mod normalise;
mod pipeline;
mod protection;
mod stress;

pub use aggregate::aggregate;
pub use config::{SignalWeights, StressConfig, ThresholdTable, TieBreak};
pub use error::PipelineError;
pub use normalise::{Transform, normalise};
pub use pipeline::{StressPipeline, StressReport};
pub use protection::{classify, classify_all, threshold};
pub use stress::score;
