//! Usage signals and their normalised popularity measures.

use std::fmt;

/// One independently collected usage signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signal {
    /// Encyclopedia page-view counts.
    #[cfg_attr(feature = "serde", serde(rename = "wiki"))]
    PageViews,
    /// Crowd-sourced activity-route traffic per year.
    #[cfg_attr(feature = "serde", serde(rename = "strava"))]
    RouteTraffic,
    /// Webcam-derived pedestrian counts.
    #[cfg_attr(feature = "serde", serde(rename = "webcam"))]
    Pedestrians,
}

impl Signal {
    /// Every signal, in a stable order.
    pub const ALL: [Self; 3] = [Self::PageViews, Self::RouteTraffic, Self::Pedestrians];

    /// Short name used in configuration keys and output field suffixes.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PageViews => "wiki",
            Self::RouteTraffic => "strava",
            Self::Pedestrians => "webcam",
        }
    }

    /// Resolve a signal from its short name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|signal| signal.name() == name)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-signal popularity measures for one peak.
///
/// Each defined measure lies in `0.0..=1.0`; `None` marks a signal with no
/// usable observation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalMeasures {
    /// Measure derived from page views.
    pub wiki: Option<f64>,
    /// Measure derived from route traffic.
    pub strava: Option<f64>,
    /// Measure derived from webcam pedestrian counts.
    pub webcam: Option<f64>,
}

impl SignalMeasures {
    /// Read the measure for `signal`.
    #[must_use]
    pub const fn get(&self, signal: Signal) -> Option<f64> {
        match signal {
            Signal::PageViews => self.wiki,
            Signal::RouteTraffic => self.strava,
            Signal::Pedestrians => self.webcam,
        }
    }

    /// Overwrite the measure for `signal`.
    pub const fn set(&mut self, signal: Signal, value: Option<f64>) {
        match signal {
            Signal::PageViews => self.wiki = value,
            Signal::RouteTraffic => self.strava = value,
            Signal::Pedestrians => self.webcam = value,
        }
    }

    /// Iterate over the defined measures only.
    pub fn defined(&self) -> impl Iterator<Item = (Signal, f64)> + '_ {
        Signal::ALL
            .into_iter()
            .filter_map(|signal| self.get(signal).map(|value| (signal, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("wiki", Some(Signal::PageViews))]
    #[case("strava", Some(Signal::RouteTraffic))]
    #[case("webcam", Some(Signal::Pedestrians))]
    #[case("google", None)]
    fn resolves_signal_names(#[case] name: &str, #[case] expected: Option<Signal>) {
        assert_eq!(Signal::from_name(name), expected);
    }

    #[rstest]
    fn defined_skips_missing_measures() {
        let measures = SignalMeasures {
            wiki: Some(0.8),
            strava: None,
            webcam: Some(0.1),
        };
        let defined: Vec<_> = measures.defined().collect();
        assert_eq!(
            defined,
            vec![(Signal::PageViews, 0.8), (Signal::Pedestrians, 0.1)]
        );
    }
}
