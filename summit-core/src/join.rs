//! Spatial joins between peak regions and feature layers.
//!
//! Candidate features are found through an R*-tree over their bounding
//! boxes and then confirmed with an exact predicate. Every region appears in
//! the result, mapped to an empty list when nothing matches.

use std::collections::BTreeMap;

use geo::{
    BoundingRect, Contains, Distance, Euclidean, Intersects, LineString, MultiPolygon, Point, Rect,
};
use rstar::{AABB, RTree, RTreeObject};

use crate::{Layer, SpatialFeature};

/// Slack, in metres, allowed on buffer boundaries.
///
/// Sized to cover the UTM round-trip error, so a feature lying exactly on
/// the circle in geographic input still matches once projected.
pub const BOUNDARY_TOLERANCE: f64 = 1e-3;

/// A query region attached to one peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    /// Closed disk of `radius` metres around `centre`.
    Disk {
        /// Disk centre.
        centre: Point<f64>,
        /// Radius in the units of the working system.
        radius: f64,
    },
    /// A single position.
    Point(Point<f64>),
}

/// Spatial relation a feature must satisfy to be joined to a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// The region lies strictly inside the feature.
    Within,
    /// The region and the feature share at least one point.
    Intersects,
}

/// Build the closed disk of `radius` metres around `point`.
///
/// The caller must supply `point` in a metric system.
#[must_use]
pub const fn buffer(point: Point<f64>, radius: f64) -> Region {
    Region::Disk {
        centre: point,
        radius,
    }
}

/// Exact geometric tests needed by [`join`].
pub trait JoinGeometry {
    /// Bounding box, or `None` for an empty geometry.
    fn envelope(&self) -> Option<AABB<[f64; 2]>>;

    /// Shortest distance from `point` to the geometry; zero when inside.
    fn distance_to(&self, point: Point<f64>) -> f64;

    /// Report whether `point` touches the geometry, boundary included.
    fn touches_point(&self, point: Point<f64>) -> bool;

    /// Report whether the closed disk lies in the geometry's interior.
    ///
    /// A zero radius tests strict containment of the centre.
    fn contains_disk(&self, centre: Point<f64>, radius: f64) -> bool;
}

fn rect_envelope(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(rect.min().into(), rect.max().into())
}

impl JoinGeometry for Point<f64> {
    fn envelope(&self) -> Option<AABB<[f64; 2]>> {
        Some(AABB::from_point(self.0.into()))
    }

    fn distance_to(&self, point: Point<f64>) -> f64 {
        Euclidean.distance(*self, point)
    }

    fn touches_point(&self, point: Point<f64>) -> bool {
        self.intersects(&point)
    }

    fn contains_disk(&self, centre: Point<f64>, radius: f64) -> bool {
        radius <= 0.0 && self.contains(&centre)
    }
}

impl JoinGeometry for LineString<f64> {
    fn envelope(&self) -> Option<AABB<[f64; 2]>> {
        self.bounding_rect().map(rect_envelope)
    }

    fn distance_to(&self, point: Point<f64>) -> f64 {
        Euclidean.distance(&point, self)
    }

    fn touches_point(&self, point: Point<f64>) -> bool {
        self.intersects(&point)
    }

    fn contains_disk(&self, centre: Point<f64>, radius: f64) -> bool {
        radius <= 0.0 && self.contains(&centre)
    }
}

impl JoinGeometry for MultiPolygon<f64> {
    fn envelope(&self) -> Option<AABB<[f64; 2]>> {
        self.bounding_rect().map(rect_envelope)
    }

    fn distance_to(&self, point: Point<f64>) -> f64 {
        if self.intersects(&point) {
            0.0
        } else {
            boundary_distance(self, point)
        }
    }

    fn touches_point(&self, point: Point<f64>) -> bool {
        self.intersects(&point)
    }

    fn contains_disk(&self, centre: Point<f64>, radius: f64) -> bool {
        self.contains(&centre) && (radius <= 0.0 || boundary_distance(self, centre) >= radius)
    }
}

fn boundary_distance(area: &MultiPolygon<f64>, point: Point<f64>) -> f64 {
    area.iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .map(|ring| Euclidean.distance(&point, ring))
        .fold(f64::INFINITY, f64::min)
}

impl Region {
    #[expect(
        clippy::float_arithmetic,
        reason = "envelope corners are offset by the disk radius"
    )]
    fn envelope(&self) -> AABB<[f64; 2]> {
        match *self {
            Self::Disk { centre, radius } => {
                let reach = radius + BOUNDARY_TOLERANCE;
                AABB::from_corners(
                    [centre.x() - reach, centre.y() - reach],
                    [centre.x() + reach, centre.y() + reach],
                )
            }
            Self::Point(point) => AABB::from_point(point.0.into()),
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "closed-disk test adds the boundary tolerance"
    )]
    fn matches<G: JoinGeometry>(&self, geometry: &G, predicate: Predicate) -> bool {
        match (predicate, *self) {
            (Predicate::Intersects, Self::Disk { centre, radius }) => {
                geometry.distance_to(centre) <= radius + BOUNDARY_TOLERANCE
            }
            (Predicate::Intersects, Self::Point(point)) => geometry.touches_point(point),
            (Predicate::Within, Self::Disk { centre, radius }) => {
                geometry.contains_disk(centre, radius)
            }
            (Predicate::Within, Self::Point(point)) => geometry.contains_disk(point, 0.0),
        }
    }
}

/// Bounding box of one feature, remembering its position in the layer.
struct IndexedEnvelope {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R*-tree over a borrowed layer.
struct FeatureIndex<'a, T> {
    features: &'a [T],
    tree: RTree<IndexedEnvelope>,
}

impl<'a, T: SpatialFeature> FeatureIndex<'a, T> {
    fn build(features: &'a [T]) -> Self {
        let entries = features
            .iter()
            .enumerate()
            .filter_map(|(position, feature)| {
                feature
                    .geometry()
                    .envelope()
                    .map(|envelope| IndexedEnvelope { position, envelope })
            })
            .collect();
        Self {
            features,
            tree: RTree::bulk_load(entries),
        }
    }

    fn query(&self, region: &Region, predicate: Predicate) -> Vec<&'a T> {
        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&region.envelope())
            .map(|entry| entry.position)
            .collect();
        positions.sort_unstable();
        positions
            .into_iter()
            .filter_map(|position| self.features.get(position))
            .filter(|feature| region.matches(feature.geometry(), predicate))
            .collect()
    }
}

/// Relate each region to the features of `layer` satisfying `predicate`.
///
/// Regions and layer must share a reference system; disk radii are read in
/// that system's units. Matches are listed in layer order. Region keys
/// should be unique; when one repeats, the last region wins.
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use summit_core::{Crs, Layer, Predicate, Webcam, join::{buffer, join}};
///
/// let webcams = Layer::new(
///     "webcams",
///     Some(Crs::WebMercator),
///     vec![Webcam { id: 1, location: Point::new(300.0, 400.0), pedestrian_count: 12 }],
/// );
/// let regions = [(7, buffer(Point::new(0.0, 0.0), 500.0))];
/// let joined = join(&regions, &webcams, Predicate::Intersects);
/// assert_eq!(joined.get(&7).map(Vec::len), Some(1));
/// ```
pub fn join<'a, K: Ord + Copy, T: SpatialFeature>(
    regions: &[(K, Region)],
    layer: &'a Layer<T>,
    predicate: Predicate,
) -> BTreeMap<K, Vec<&'a T>> {
    let index = FeatureIndex::build(layer.features());
    regions
        .iter()
        .map(|(id, region)| (*id, index.query(region, predicate)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Crs, ProtectedArea, Webcam};
    use geo::{Polygon, polygon};
    use rstest::{fixture, rstest};

    fn matched<T: SpatialFeature>(regions: &[(u64, Region)], layer: &Layer<T>) -> Vec<u64> {
        join(regions, layer, Predicate::Intersects)
            .remove(&1)
            .expect("region present")
            .iter()
            .map(|feature| feature.feature_id())
            .collect()
    }

    fn webcam(id: u64, x: f64, y: f64) -> Webcam {
        Webcam {
            id,
            location: Point::new(x, y),
            pedestrian_count: 1,
        }
    }

    #[fixture]
    fn webcams() -> Layer<Webcam> {
        Layer::new(
            "webcams",
            Some(Crs::WebMercator),
            vec![
                webcam(1, 5_000.0, 0.0),
                webcam(2, 5_001.0, 0.0),
                webcam(3, 0.0, -3_000.0),
            ],
        )
    }

    #[rstest]
    fn disk_boundary_is_inclusive(webcams: Layer<Webcam>) {
        let regions = [(1, buffer(Point::new(0.0, 0.0), 5_000.0))];
        assert_eq!(matched(&regions, &webcams), vec![1, 3]);
    }

    #[rstest]
    fn unmatched_regions_map_to_empty_lists(webcams: Layer<Webcam>) {
        let regions = [(4, buffer(Point::new(90_000.0, 90_000.0), 10.0))];
        let joined = join(&regions, &webcams, Predicate::Intersects);
        assert_eq!(joined.get(&4).map(Vec::len), Some(0));
    }

    fn area(id: u64, ring: Polygon<f64>) -> ProtectedArea {
        ProtectedArea {
            id,
            name: format!("area {id}"),
            protection_class: 2,
            boundary: MultiPolygon::new(vec![ring]),
        }
    }

    #[rstest]
    #[case(Point::new(5.0, 5.0), true)]
    #[case(Point::new(10.0, 5.0), false)]
    #[case(Point::new(12.0, 5.0), false)]
    fn within_requires_strict_interior(#[case] point: Point<f64>, #[case] expected: bool) {
        let square = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        let areas = Layer::new("areas", Some(Crs::Wgs84), vec![area(1, square)]);
        let joined = join(&[(1, Region::Point(point))], &areas, Predicate::Within);
        let hits = joined.get(&1).expect("region present");
        assert_eq!(!hits.is_empty(), expected);
    }

    #[rstest]
    fn disk_intersects_polygon_edge() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        let areas = Layer::new("areas", Some(Crs::WebMercator), vec![area(1, square)]);
        let near = [(1, buffer(Point::new(13.0, 5.0), 3.0))];
        let far = [(1, buffer(Point::new(13.0, 5.0), 2.5))];
        assert_eq!(matched(&near, &areas), vec![1]);
        assert!(matched(&far, &areas).is_empty());
    }

    #[rstest]
    fn route_within_buffer_is_found() {
        let path = LineString::from(vec![(-10_000.0, 4_000.0), (10_000.0, 4_000.0)]);
        let segment = crate::RouteSegment {
            id: 5,
            path,
            traffic_count: 10,
            created_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            updated_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
        };
        let routes = Layer::new("routes", Some(Crs::WebMercator), vec![segment]);
        let inside = [(1, buffer(Point::new(0.0, 0.0), 4_000.0))];
        let outside = [(1, buffer(Point::new(0.0, 0.0), 3_999.0))];
        assert_eq!(matched(&inside, &routes), vec![5]);
        assert!(matched(&outside, &routes).is_empty());
    }
}
