//! Weighted combination of the popularity measures defined for one peak.

use summit_core::{ConfigurationError, Signal, SignalMeasures};

use crate::SignalWeights;

/// Combine the defined measures into one aggregate popularity.
///
/// Weights are renormalised over exactly the signals that are both weighted
/// and defined for this peak, so a peak observed through a single signal
/// scores that signal's measure. Returns `Ok(None)` when no weighted signal
/// is defined.
///
/// # Errors
/// Returns [`ConfigurationError::InvalidWeight`] for a negative or
/// non-finite weight and [`ConfigurationError::ZeroWeightSum`] when the
/// weights of the present signals sum to zero.
///
/// # Examples
///
/// ```
/// use summit_core::{Signal, SignalMeasures};
/// use summit_scorer::{SignalWeights, aggregate};
///
/// let weights = SignalWeights::new([(Signal::PageViews, 0.5), (Signal::RouteTraffic, 0.5)]);
/// let measures = SignalMeasures { wiki: Some(0.8), ..SignalMeasures::default() };
/// assert_eq!(aggregate(&measures, &weights)?, Some(0.8));
/// # Ok::<(), summit_core::ConfigurationError>(())
/// ```
#[expect(
    clippy::float_arithmetic,
    reason = "weighted means need floating-point sums and ratios"
)]
pub fn aggregate(
    measures: &SignalMeasures,
    weights: &SignalWeights,
) -> Result<Option<f64>, ConfigurationError> {
    let mut present: Vec<(Signal, f64, f64)> = Vec::with_capacity(Signal::ALL.len());
    for (signal, measure) in measures.defined() {
        let Some(weight) = weights.get(signal) else {
            continue;
        };
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigurationError::InvalidWeight { signal, weight });
        }
        present.push((signal, weight, measure));
    }
    if present.is_empty() {
        return Ok(None);
    }

    let total: f64 = present.iter().map(|(_, weight, _)| weight).sum();
    if total <= 0.0 {
        return Err(ConfigurationError::ZeroWeightSum {
            signals: present.iter().map(|(signal, _, _)| *signal).collect(),
        });
    }
    let combined: f64 = present
        .iter()
        .map(|(_, weight, measure)| weight / total * measure)
        .sum();
    Ok(Some(combined))
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare against an epsilon"
)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn equal_weights() -> SignalWeights {
        SignalWeights::default()
    }

    fn measures(wiki: Option<f64>, strava: Option<f64>, webcam: Option<f64>) -> SignalMeasures {
        SignalMeasures {
            wiki,
            strava,
            webcam,
        }
    }

    #[rstest]
    fn no_defined_measure_is_undefined(equal_weights: SignalWeights) {
        let result = aggregate(&SignalMeasures::default(), &equal_weights);
        assert_eq!(result, Ok(None));
    }

    #[rstest]
    fn renormalises_over_present_signals(equal_weights: SignalWeights) {
        let result = aggregate(&measures(Some(0.9), None, Some(0.3)), &equal_weights)
            .expect("valid weights")
            .expect("defined");
        assert!((result - (0.9 + 0.3) / 2.0).abs() < 1e-12, "got {result}");
    }

    #[rstest]
    fn unequal_weights_shift_the_mean() {
        let weights = SignalWeights::new([
            (Signal::PageViews, 3.0),
            (Signal::RouteTraffic, 1.0),
            (Signal::Pedestrians, 1.0),
        ]);
        let result = aggregate(&measures(Some(1.0), Some(0.0), None), &weights)
            .expect("valid weights")
            .expect("defined");
        assert!((result - 0.75).abs() < 1e-12, "got {result}");
    }

    #[rstest]
    fn unweighted_signals_are_ignored() {
        let weights = SignalWeights::new([(Signal::PageViews, 1.0)]);
        let result = aggregate(&measures(None, Some(0.4), Some(0.2)), &weights);
        assert_eq!(result, Ok(None));
    }

    #[rstest]
    fn zero_weights_over_present_signals_fail() {
        let weights = SignalWeights::new([(Signal::PageViews, 1.0), (Signal::Pedestrians, 0.0)]);
        let result = aggregate(&measures(None, None, Some(0.5)), &weights);
        assert_eq!(
            result,
            Err(ConfigurationError::ZeroWeightSum {
                signals: vec![Signal::Pedestrians]
            })
        );
    }

    #[rstest]
    fn negative_weight_fails() {
        let weights = SignalWeights::new([(Signal::PageViews, -1.0)]);
        let result = aggregate(&measures(Some(0.5), None, None), &weights);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidWeight { .. })
        ));
    }
}
