//! Scoring configuration threaded through every pipeline stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use summit_core::{ConfigurationError, Crs, Signal};

const DEFAULT_BUFFER_RADIUS_METERS: f64 = 5_000.0;

/// Non-negative weight per signal used by the aggregator.
///
/// Signals without an entry take no part in aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalWeights(BTreeMap<Signal, f64>);

impl SignalWeights {
    /// Build weights from `(signal, weight)` pairs.
    pub fn new(weights: impl IntoIterator<Item = (Signal, f64)>) -> Self {
        Self(weights.into_iter().collect())
    }

    /// Weight for `signal`, if it takes part in aggregation.
    #[must_use]
    pub fn get(&self, signal: Signal) -> Option<f64> {
        self.0.get(&signal).copied()
    }

    /// Iterate over the configured weights.
    pub fn iter(&self) -> impl Iterator<Item = (Signal, f64)> + '_ {
        self.0.iter().map(|(signal, weight)| (*signal, *weight))
    }

    /// Check every weight is finite and positive.
    ///
    /// A zero entry would let the sum vanish over some subset of present
    /// signals, so signals meant to be ignored must be omitted instead.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidWeight`] for a negative or
    /// non-finite weight, [`ConfigurationError::ZeroWeightSum`] when every
    /// weight is zero and [`ConfigurationError::ZeroWeight`] for any other
    /// zero entry.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some((signal, weight)) = self
            .iter()
            .find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
        {
            return Err(ConfigurationError::InvalidWeight { signal, weight });
        }
        if self.iter().all(|(_, weight)| weight == 0.0) {
            return Err(ConfigurationError::ZeroWeightSum {
                signals: self.0.keys().copied().collect(),
            });
        }
        if let Some((signal, _)) = self.iter().find(|(_, weight)| *weight == 0.0) {
            return Err(ConfigurationError::ZeroWeight { signal });
        }
        Ok(())
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self::new(Signal::ALL.map(|signal| (signal, 1.0)))
    }
}

/// Lookup table from protection class code to stress threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable(BTreeMap<i64, f64>);

impl ThresholdTable {
    /// Build a table from `(class, threshold)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (i64, f64)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Threshold mapped to `class`, if any.
    #[must_use]
    pub fn get(&self, class: i64) -> Option<f64> {
        self.0.get(&class).copied()
    }

    /// Check every threshold is finite.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidThreshold`] for the first
    /// non-finite entry.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.0.iter().find(|(_, threshold)| !threshold.is_finite()) {
            Some((class, threshold)) => Err(ConfigurationError::InvalidThreshold {
                class: *class,
                threshold: *threshold,
            }),
            None => Ok(()),
        }
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::new([(0, 0.9), (4, 0.7), (5, 0.6)])
    }
}

/// Rule picking one class when a peak lies in several protected areas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the highest numeric class code.
    #[default]
    HighestClass,
    /// Keep the lowest numeric class code.
    LowestClass,
}

/// Every tunable of a stress run.
///
/// # Examples
///
/// ```
/// use summit_scorer::StressConfig;
///
/// let config = StressConfig::default();
/// assert_eq!(config.buffer_radius_meters, 5_000.0);
/// assert_eq!(config.protection_class_to_threshold.get(0), Some(0.9));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StressConfig {
    /// Radius of the buffer drawn around each peak, in metres.
    pub buffer_radius_meters: f64,
    /// Aggregation weight per signal.
    pub signal_weights: SignalWeights,
    /// Threshold per protection class.
    pub protection_class_to_threshold: ThresholdTable,
    /// Working reference system; `None` uses the peaks layer's own system.
    pub reference_system: Option<Crs>,
    /// Overlap resolution between protected areas.
    pub tie_break: TieBreak,
    /// Class assigned to peaks outside every protected area.
    pub unprotected_class: Option<i64>,
    /// Signal whose malformed input removes a peak from the output.
    pub key_signal: Option<Signal>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            buffer_radius_meters: DEFAULT_BUFFER_RADIUS_METERS,
            signal_weights: SignalWeights::default(),
            protection_class_to_threshold: ThresholdTable::default(),
            reference_system: Some(Crs::Wgs84),
            tie_break: TieBreak::default(),
            unprotected_class: None,
            key_signal: Some(Signal::PageViews),
        }
    }
}

impl StressConfig {
    /// Reject configurations that would invalidate a whole run.
    ///
    /// # Errors
    /// Returns the first [`ConfigurationError`] found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let radius = self.buffer_radius_meters;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigurationError::InvalidRadius { radius });
        }
        self.signal_weights.validate()?;
        self.protection_class_to_threshold.validate()
    }
}
