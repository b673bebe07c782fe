//! Behavioural tests for the stress scoring stages.
#![expect(
    clippy::float_arithmetic,
    reason = "assertions compare floats against an epsilon"
)]

use std::cell::RefCell;

use geo::Point;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use summit_core::test_support::square_area;
use summit_core::{Crs, Layer, Peak, RawSignals, Signal, SignalMeasures, Snapshot};
use summit_scorer::{SignalWeights, StressConfig, StressPipeline, aggregate};

const EPSILON: f64 = 1e-3;

#[fixture]
fn snapshot() -> RefCell<Option<Snapshot>> {
    RefCell::new(None)
}

#[fixture]
fn scored() -> RefCell<Option<Snapshot>> {
    RefCell::new(None)
}

#[fixture]
fn weights() -> RefCell<Option<SignalWeights>> {
    RefCell::new(None)
}

#[fixture]
fn measures() -> RefCell<SignalMeasures> {
    RefCell::new(SignalMeasures::default())
}

#[fixture]
fn popularity() -> RefCell<Option<f64>> {
    RefCell::new(None)
}

fn peak(id: u64, x: f64, y: f64, view_count: Option<i64>) -> Peak {
    Peak::new(id, format!("peak {id}"), Point::new(x, y)).with_signals(RawSignals {
        view_count,
        ..RawSignals::default()
    })
}

fn assert_close(actual: Option<f64>, expected: Option<f64>) {
    match (actual, expected) {
        (Some(got), Some(want)) => assert!((got - want).abs() < EPSILON, "got {got}, want {want}"),
        (got, want) => assert_eq!(got, want),
    }
}

fn collect(scored: &RefCell<Option<Snapshot>>, field: impl Fn(&Peak) -> Option<f64>) -> Vec<Option<f64>> {
    scored
        .borrow()
        .as_ref()
        .expect("pipeline ran")
        .peaks
        .features()
        .iter()
        .map(field)
        .collect()
}

#[given("three protected peaks with page views 100, 50 and unknown")]
fn given_three_peaks(#[from(snapshot)] snapshot: &RefCell<Option<Snapshot>>) {
    let peaks = Layer::new(
        "peaks",
        Some(Crs::Wgs84),
        vec![
            peak(1, 11.0, 47.0, Some(100)),
            peak(2, 11.2, 47.1, Some(50)),
            peak(3, 11.4, 47.2, None),
        ],
    );
    let mut built = Snapshot::from_peaks(peaks);
    built.protected_areas = Layer::new(
        "protected_areas",
        Some(Crs::Wgs84),
        vec![square_area(1, "Tirol", 0, Point::new(11.2, 47.1), 1.0)],
    );
    *snapshot.borrow_mut() = Some(built);
}

#[given("a peak inside overlapping protected areas of class 4 and class 6")]
fn given_overlapping_areas(#[from(snapshot)] snapshot: &RefCell<Option<Snapshot>>) {
    let peaks = Layer::new("peaks", Some(Crs::Wgs84), vec![peak(1, 11.25, 47.05, Some(10))]);
    let mut built = Snapshot::from_peaks(peaks);
    built.protected_areas = Layer::new(
        "protected_areas",
        Some(Crs::Wgs84),
        vec![
            square_area(1, "Stubai", 4, Point::new(11.2, 47.0), 0.5),
            square_area(2, "Kalkkögel", 6, Point::new(11.3, 47.1), 0.5),
        ],
    );
    *snapshot.borrow_mut() = Some(built);
}

#[given("weights of 0.5 for page views and route traffic")]
fn given_half_weights(#[from(weights)] weights: &RefCell<Option<SignalWeights>>) {
    *weights.borrow_mut() = Some(SignalWeights::new([
        (Signal::PageViews, 0.5),
        (Signal::RouteTraffic, 0.5),
    ]));
}

#[given("a peak whose only measure is a page-view measure of 0.8")]
fn given_sole_measure(#[from(measures)] measures: &RefCell<SignalMeasures>) {
    measures.borrow_mut().set(Signal::PageViews, Some(0.8));
}

#[when("I run the stress pipeline")]
fn when_run(
    #[from(snapshot)] snapshot: &RefCell<Option<Snapshot>>,
    #[from(scored)] scored: &RefCell<Option<Snapshot>>,
) {
    let input = snapshot.borrow_mut().take().expect("snapshot configured");
    let pipeline = StressPipeline::new(StressConfig::default()).expect("valid configuration");
    let (output, _) = pipeline.run(input).expect("run succeeds");
    *scored.borrow_mut() = Some(output);
}

#[when("I aggregate its popularity")]
fn when_aggregate(
    #[from(weights)] weights: &RefCell<Option<SignalWeights>>,
    #[from(measures)] measures: &RefCell<SignalMeasures>,
    #[from(popularity)] popularity: &RefCell<Option<f64>>,
) {
    let borrowed = weights.borrow();
    let configured = borrowed.as_ref().expect("weights configured");
    *popularity.borrow_mut() = aggregate(&measures.borrow(), configured).expect("valid weights");
}

#[then("the popularity measures are 1.0, 0.849 and undefined")]
fn then_measures(#[from(scored)] scored: &RefCell<Option<Snapshot>>) {
    let wiki = collect(scored, |peak| peak.derived.measures.wiki);
    for (actual, expected) in wiki.into_iter().zip([Some(1.0), Some(0.849), None]) {
        assert_close(actual, expected);
    }
}

#[then("the stress scores are 0.1, -0.051 and undefined")]
fn then_scores(#[from(scored)] scored: &RefCell<Option<Snapshot>>) {
    let stress = collect(scored, |peak| peak.derived.stress_score);
    for (actual, expected) in stress.into_iter().zip([Some(0.1), Some(-0.051), None]) {
        assert_close(actual, expected);
    }
}

#[then("the aggregate popularity is 0.8")]
fn then_popularity(#[from(popularity)] popularity: &RefCell<Option<f64>>) {
    assert_close(*popularity.borrow(), Some(0.8));
}

#[then("the peak is assigned protection class 6")]
fn then_class(#[from(scored)] scored: &RefCell<Option<Snapshot>>) {
    let borrowed = scored.borrow();
    let peak = borrowed
        .as_ref()
        .expect("pipeline ran")
        .peaks
        .features()
        .first()
        .cloned()
        .expect("peak kept");
    assert_eq!(peak.derived.protection_class, Some(6));
}

#[scenario(path = "tests/features/stress_score.feature", index = 0)]
fn scenario_end_to_end(snapshot: RefCell<Option<Snapshot>>, scored: RefCell<Option<Snapshot>>) {
    let _ = (snapshot, scored);
}

#[scenario(path = "tests/features/stress_score.feature", index = 1)]
fn scenario_sole_signal(
    weights: RefCell<Option<SignalWeights>>,
    measures: RefCell<SignalMeasures>,
    popularity: RefCell<Option<f64>>,
) {
    let _ = (weights, measures, popularity);
}

#[scenario(path = "tests/features/stress_score.feature", index = 2)]
fn scenario_overlap(snapshot: RefCell<Option<Snapshot>>, scored: RefCell<Option<Snapshot>>) {
    let _ = (snapshot, scored);
}
