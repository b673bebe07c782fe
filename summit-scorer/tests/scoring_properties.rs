//! Property-based tests for the normaliser, aggregator and score.
//!
//! # Invariants tested
//!
//! - **Measure range:** every defined measure lies in `0.0..=1.0`.
//! - **Zero is unobserved:** a raw zero never yields a defined measure.
//! - **Aggregate range:** aggregates of in-range measures stay in range.
//! - **Exact difference:** the score equals aggregate minus threshold.
#![expect(
    clippy::float_arithmetic,
    reason = "properties compare floats against an epsilon"
)]

use proptest::prelude::*;
use summit_core::{Signal, SignalMeasures};
use summit_scorer::{SignalWeights, Transform, aggregate, normalise, score};

fn raw_values() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(
        prop_oneof![
            Just(None),
            Just(Some(0.0)),
            (0.0_f64..1e9).prop_map(Some),
            (-1e3_f64..0.0).prop_map(Some),
        ],
        0..40,
    )
}

fn transform() -> impl Strategy<Value = Transform> {
    prop_oneof![Just(Transform::Identity), Just(Transform::NaturalLog)]
}

fn measure() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![Just(None), (0.0_f64..=1.0).prop_map(Some)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn measures_stay_in_unit_interval(raw in raw_values(), transform in transform()) {
        let measures = normalise(&raw, transform);
        prop_assert_eq!(measures.len(), raw.len());
        for (value, measure) in raw.iter().zip(&measures) {
            if let Some(defined) = measure {
                prop_assert!((0.0..=1.0).contains(defined), "{defined}");
            }
            if matches!(value, Some(observed) if *observed <= 0.0) {
                prop_assert!(measure.is_none());
            }
        }
    }

    #[test]
    fn aggregates_stay_in_unit_interval(
        wiki in measure(),
        strava in measure(),
        webcam in measure(),
        weights in prop::array::uniform3(0.01_f64..10.0),
    ) {
        let [wiki_weight, strava_weight, webcam_weight] = weights;
        let weights = SignalWeights::new([
            (Signal::PageViews, wiki_weight),
            (Signal::RouteTraffic, strava_weight),
            (Signal::Pedestrians, webcam_weight),
        ]);
        let measures = SignalMeasures { wiki, strava, webcam };
        let result = aggregate(&measures, &weights).expect("positive weights");
        let any_defined = wiki.is_some() || strava.is_some() || webcam.is_some();
        prop_assert_eq!(result.is_some(), any_defined);
        if let Some(value) = result {
            prop_assert!((-1e-12..=1.0 + 1e-12).contains(&value), "{value}");
        }
    }

    #[test]
    fn score_is_the_exact_difference(aggregate in 0.0_f64..=1.0, threshold in -2.0_f64..2.0) {
        prop_assert_eq!(score(Some(aggregate), Some(threshold)), Some(aggregate - threshold));
    }
}
