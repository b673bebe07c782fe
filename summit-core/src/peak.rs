//! Peaks with their raw usage signals and derived scores.

use std::collections::BTreeSet;

use geo::Point;

use crate::{Signal, SignalMeasures};

/// Raw usage signals observed for a peak.
///
/// Values are carried exactly as observed. Negative counts are kept here and
/// rejected by the normaliser, so the peak itself is never discarded for them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawSignals {
    /// Total encyclopedia page views over the observation window.
    pub view_count: Option<i64>,
    /// Mean route traffic per year across nearby route segments.
    pub route_traffic_rate: Option<f64>,
    /// Total pedestrians detected by nearby webcams.
    pub pedestrian_count: Option<i64>,
}

impl RawSignals {
    /// Read a raw signal as a float, whatever its stored type.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "counts far beyond 2^53 are not meaningful usage figures"
    )]
    pub fn value(&self, signal: Signal) -> Option<f64> {
        match signal {
            Signal::PageViews => self.view_count.map(|count| count as f64),
            Signal::RouteTraffic => self.route_traffic_rate,
            Signal::Pedestrians => self.pedestrian_count.map(|count| count as f64),
        }
    }
}

/// Fields derived by the scoring stages.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedScores {
    /// Normalised per-signal measures.
    pub measures: SignalMeasures,
    /// Weighted mean of the defined measures.
    pub aggregate_popularity: Option<f64>,
    /// Class code of the resolved protection area.
    pub protection_class: Option<i64>,
    /// Threshold looked up for the protection class.
    pub protection_threshold: Option<f64>,
    /// Aggregate popularity minus protection threshold.
    pub stress_score: Option<f64>,
}

/// A mountain peak scored for environmental stress.
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use summit_core::Peak;
///
/// let peak = Peak::new(1, "Zugspitze", Point::new(10.98, 47.42)).with_elevation(2962.0);
/// assert_eq!(peak.elevation, Some(2962.0));
/// assert!(peak.derived.stress_score.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    /// Stable identifier.
    pub id: u64,
    /// Display name, also used to look up page views.
    pub name: String,
    /// Summit position.
    pub location: Point<f64>,
    /// Elevation in metres, when known.
    pub elevation: Option<f64>,
    /// Raw usage signals.
    pub signals: RawSignals,
    /// Signals whose raw input value was present but not a number.
    pub malformed: BTreeSet<Signal>,
    /// Scoring output.
    pub derived: DerivedScores,
}

impl Peak {
    /// Construct a peak with no signals.
    pub fn new(id: u64, name: impl Into<String>, location: Point<f64>) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            elevation: None,
            signals: RawSignals::default(),
            malformed: BTreeSet::new(),
            derived: DerivedScores::default(),
        }
    }

    /// Attach an elevation.
    #[must_use]
    pub const fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// Attach raw signals.
    #[must_use]
    pub const fn with_signals(mut self, signals: RawSignals) -> Self {
        self.signals = signals;
        self
    }
}
