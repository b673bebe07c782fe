//! Resolve each peak's protection class and its stress threshold.

use std::collections::{BTreeMap, HashMap};

use geo::Point;
use summit_core::join::join;
use summit_core::{Layer, Predicate, ProtectedArea, Region};

use crate::{ThresholdTable, TieBreak};

/// Protection class of the area `point` lies strictly inside.
///
/// Overlapping areas sharing a name count once, with their highest class.
/// Among distinct areas, `tie_break` picks the class. Returns `None` when no
/// area contains the point.
///
/// `point` and `areas` must share a reference system.
#[must_use]
pub fn classify(
    point: Point<f64>,
    areas: &Layer<ProtectedArea>,
    tie_break: TieBreak,
) -> Option<i64> {
    classify_all(&[(0, point)], areas, tie_break)
        .remove(&0)
        .flatten()
}

/// Classify many points against one area layer, reusing a single index.
///
/// Results are keyed by each point's key, which should be unique.
#[must_use]
pub fn classify_all<K: Ord + Copy>(
    points: &[(K, Point<f64>)],
    areas: &Layer<ProtectedArea>,
    tie_break: TieBreak,
) -> BTreeMap<K, Option<i64>> {
    let regions: Vec<(K, Region)> = points
        .iter()
        .map(|(id, point)| (*id, Region::Point(*point)))
        .collect();
    join(&regions, areas, Predicate::Within)
        .into_iter()
        .map(|(id, matches)| (id, resolve(&matches, tie_break)))
        .collect()
}

fn resolve(matches: &[&ProtectedArea], tie_break: TieBreak) -> Option<i64> {
    let mut by_name: HashMap<&str, i64> = HashMap::new();
    for area in matches {
        by_name
            .entry(area.name.as_str())
            .and_modify(|class| *class = (*class).max(area.protection_class))
            .or_insert(area.protection_class);
    }
    let classes = by_name.into_values();
    match tie_break {
        TieBreak::HighestClass => classes.max(),
        TieBreak::LowestClass => classes.min(),
    }
}

/// Threshold mapped to `class`.
///
/// An unmapped class is not an error: it is logged and the threshold is
/// undefined.
#[must_use]
pub fn threshold(class: i64, table: &ThresholdTable) -> Option<f64> {
    let mapped = table.get(class);
    if mapped.is_none() {
        log::warn!("protection class {class} has no configured threshold");
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use summit_core::Crs;
    use summit_core::test_support::square_area;

    #[fixture]
    fn overlapping() -> Layer<ProtectedArea> {
        Layer::new(
            "protected_areas",
            Some(Crs::Wgs84),
            vec![
                square_area(1, "Stubai", 4, Point::new(11.2, 47.0), 0.5),
                square_area(2, "Kalkkögel", 6, Point::new(11.3, 47.1), 0.5),
                square_area(3, "Stubai", 2, Point::new(11.25, 47.05), 0.2),
            ],
        )
    }

    #[rstest]
    fn highest_class_wins_overlap(overlapping: Layer<ProtectedArea>) {
        let class = classify(Point::new(11.25, 47.05), &overlapping, TieBreak::HighestClass);
        assert_eq!(class, Some(6));
    }

    #[rstest]
    fn lowest_class_uses_each_names_highest_class(overlapping: Layer<ProtectedArea>) {
        let class = classify(Point::new(11.25, 47.05), &overlapping, TieBreak::LowestClass);
        assert_eq!(class, Some(4));
    }

    #[rstest]
    fn outside_every_area_is_undefined(overlapping: Layer<ProtectedArea>) {
        let class = classify(Point::new(14.0, 40.0), &overlapping, TieBreak::HighestClass);
        assert_eq!(class, None);
    }

    #[rstest]
    fn classify_all_covers_every_point(overlapping: Layer<ProtectedArea>) {
        let classes = classify_all(
            &[(1, Point::new(10.8, 46.6)), (2, Point::new(0.0, 0.0))],
            &overlapping,
            TieBreak::HighestClass,
        );
        assert_eq!(classes.get(&1), Some(&Some(4)));
        assert_eq!(classes.get(&2), Some(&None));
    }

    #[rstest]
    #[case(0, Some(0.9))]
    #[case(5, Some(0.6))]
    #[case(6, None)]
    fn thresholds_come_from_the_table(#[case] class: i64, #[case] expected: Option<f64>) {
        assert_eq!(threshold(class, &ThresholdTable::default()), expected);
    }
}
