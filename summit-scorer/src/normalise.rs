//! Turn raw per-peak signals into popularity measures in `0.0..=1.0`.
#![expect(
    clippy::float_arithmetic,
    reason = "normalisation scales values by the population maximum"
)]

use summit_core::Signal;

/// Transform applied to raw values before max-scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Use raw values as-is.
    Identity,
    /// Natural logarithm, floored at zero.
    NaturalLog,
}

impl Transform {
    /// Transform conventionally used for `signal`.
    ///
    /// Page views and route traffic are heavily right-skewed and are
    /// log-scaled; pedestrian counts are not.
    #[must_use]
    pub const fn for_signal(signal: Signal) -> Self {
        match signal {
            Signal::PageViews | Signal::RouteTraffic => Self::NaturalLog,
            Signal::Pedestrians => Self::Identity,
        }
    }

    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Identity => value,
            Self::NaturalLog => value.ln().max(0.0),
        }
    }
}

/// Normalise one signal across a population of peaks.
///
/// Zero and absent values are undefined. Negative or non-finite values are
/// domain violations: they are logged and become undefined without affecting
/// other entries. Remaining values are transformed and divided by the largest
/// transformed value. When that maximum is not positive, every measure is
/// undefined.
///
/// # Examples
///
/// ```
/// use summit_scorer::{Transform, normalise};
///
/// let measures = normalise(&[Some(100.0), Some(50.0), None], Transform::NaturalLog);
/// assert_eq!(measures[0], Some(1.0));
/// assert!((measures[1].unwrap() - 0.849).abs() < 1e-3);
/// assert_eq!(measures[2], None);
/// ```
#[must_use]
pub fn normalise(raw: &[Option<f64>], transform: Transform) -> Vec<Option<f64>> {
    let transformed: Vec<Option<f64>> = raw
        .iter()
        .enumerate()
        .map(|(position, value)| match *value {
            Some(observed) if !observed.is_finite() || observed < 0.0 => {
                log::warn!("discarding out-of-domain raw value {observed} at position {position}");
                None
            }
            Some(observed) if observed == 0.0 => None,
            Some(observed) => Some(transform.apply(observed)),
            None => None,
        })
        .collect();

    let max = transformed.iter().flatten().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        log::debug!("no positive observations across {} entries", raw.len());
        return vec![None; raw.len()];
    }
    transformed
        .into_iter()
        .map(|value| value.map(|scaled| scaled / max))
        .collect()
}
