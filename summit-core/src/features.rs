//! Supporting layers joined against peaks.

use chrono::{DateTime, Utc};
use geo::{LineString, MultiPolygon, Point};

const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0;
const MIN_TIMESPAN_YEARS: f64 = 1.0 / 365.25;

/// A legally protected area.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectedArea {
    /// Stable identifier.
    pub id: u64,
    /// Area name; overlapping duplicates are collapsed by name.
    pub name: String,
    /// Ordinal protection class code.
    pub protection_class: i64,
    /// Area outline.
    pub boundary: MultiPolygon<f64>,
}

/// A crowd-sourced activity route segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    /// Stable identifier.
    pub id: u64,
    /// Segment path.
    pub path: LineString<f64>,
    /// Raw number of recorded traversals.
    pub traffic_count: i64,
    /// When the segment was first published.
    pub created_at: DateTime<Utc>,
    /// When the segment statistics were last refreshed.
    pub updated_at: DateTime<Utc>,
}

impl RouteSegment {
    /// Elapsed time between creation and last update, in years.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "converting whole seconds into fractional years"
    )]
    pub fn timespan_years(&self) -> f64 {
        let seconds = (self.updated_at - self.created_at).num_seconds();
        seconds as f64 / SECONDS_PER_YEAR
    }

    /// Traversals per year, flooring the timespan at one day.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use geo::LineString;
    /// use summit_core::RouteSegment;
    ///
    /// let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// let segment = RouteSegment {
    ///     id: 1,
    ///     path: LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]),
    ///     traffic_count: 10,
    ///     created_at: stamp,
    ///     updated_at: stamp,
    /// };
    /// assert!((segment.traffic_count_per_year() - 3652.5).abs() < 1e-9);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "rates are fractional by definition"
    )]
    pub fn traffic_count_per_year(&self) -> f64 {
        self.traffic_count as f64 / self.timespan_years().max(MIN_TIMESPAN_YEARS)
    }
}

/// A webcam with an aggregated pedestrian detection count.
#[derive(Debug, Clone, PartialEq)]
pub struct Webcam {
    /// Stable identifier.
    pub id: u64,
    /// Camera position.
    pub location: Point<f64>,
    /// Pedestrians detected over the observation window.
    pub pedestrian_count: i64,
}
