//! Coordinate reference systems and the layer normaliser.
//!
//! Geometry is stored at rest in WGS84 degrees (`x = longitude`,
//! `y = latitude`). Anything that needs true distances runs in a UTM zone
//! picked from the centroid of the working set and is projected back
//! afterwards.

use std::fmt;
use std::str::FromStr;

use geo::Coord;

use crate::ReferenceSystemError;

mod mercator;
mod normalise;
mod utm;

pub use normalise::{metric_projection_for, to_canonical, to_common, to_metric};

const EPSG_WGS84: u32 = 4326;
const EPSG_WEB_MERCATOR: u32 = 3857;
const EPSG_UTM_NORTH_BASE: u32 = 32_600;
const EPSG_UTM_SOUTH_BASE: u32 = 32_700;
const UTM_ZONES: u8 = 60;

/// Hemisphere of a UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    /// Northings measured from the equator.
    North,
    /// Northings offset by the 10 000 km false northing.
    South,
}

/// A supported coordinate reference system.
///
/// Systems are identified by EPSG code and round-trip through the
/// `EPSG:<code>` string form.
///
/// # Examples
///
/// ```
/// use summit_core::{Crs, Hemisphere};
///
/// let crs: Crs = "EPSG:32632".parse()?;
/// assert_eq!(crs, Crs::Utm { zone: 32, hemisphere: Hemisphere::North });
/// assert_eq!(crs.to_string(), "EPSG:32632");
/// # Ok::<(), summit_core::ReferenceSystemError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Crs {
    /// Geographic WGS84 degrees, the canonical system.
    #[default]
    Wgs84,
    /// Spherical Web Mercator in metres.
    WebMercator,
    /// WGS84 / UTM in metres.
    Utm {
        /// Zone number in `1..=60`.
        zone: u8,
        /// Hemisphere the zone's northings refer to.
        hemisphere: Hemisphere,
    },
}

impl Crs {
    /// Resolve an EPSG code.
    ///
    /// # Errors
    /// Returns [`ReferenceSystemError::Unsupported`] for codes outside the
    /// supported set.
    pub fn from_epsg(code: u32) -> Result<Self, ReferenceSystemError> {
        match code {
            EPSG_WGS84 => Ok(Self::Wgs84),
            EPSG_WEB_MERCATOR => Ok(Self::WebMercator),
            _ => Self::utm_from_epsg(code).ok_or(ReferenceSystemError::Unsupported { code }),
        }
    }

    fn utm_from_epsg(code: u32) -> Option<Self> {
        let (base, hemisphere) = if code > EPSG_UTM_SOUTH_BASE {
            (EPSG_UTM_SOUTH_BASE, Hemisphere::South)
        } else if code > EPSG_UTM_NORTH_BASE {
            (EPSG_UTM_NORTH_BASE, Hemisphere::North)
        } else {
            return None;
        };
        let zone = u8::try_from(code - base).ok()?;
        (1..=UTM_ZONES)
            .contains(&zone)
            .then_some(Self::Utm { zone, hemisphere })
    }

    /// EPSG code identifying this system.
    #[must_use]
    pub fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => EPSG_WGS84,
            Self::WebMercator => EPSG_WEB_MERCATOR,
            Self::Utm {
                zone,
                hemisphere: Hemisphere::North,
            } => EPSG_UTM_NORTH_BASE + u32::from(zone),
            Self::Utm {
                zone,
                hemisphere: Hemisphere::South,
            } => EPSG_UTM_SOUTH_BASE + u32::from(zone),
        }
    }

    /// Report whether coordinates are angular degrees rather than metres.
    #[must_use]
    pub const fn is_geographic(self) -> bool {
        matches!(self, Self::Wgs84)
    }

    /// Select the UTM zone covering `longitude` (degrees).
    ///
    /// Applies `zone = floor((longitude + 180) / 6) + 1`, clamping the
    /// antimeridian itself into zone 60.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "zone index is a bounded floor of a degree offset"
    )]
    pub fn utm_zone_for_longitude(longitude: f64) -> u8 {
        let offset = ((longitude + 180.0) / 6.0).floor().clamp(0.0, 59.0);
        offset as u8 + 1
    }

    /// Transform a single coordinate from `self` into `target`.
    ///
    /// Every transform pivots through WGS84 degrees. Transforming into the
    /// same system returns the coordinate unchanged.
    #[must_use]
    pub fn transform(self, coord: Coord<f64>, target: Self) -> Coord<f64> {
        if self == target {
            return coord;
        }
        target.project(self.unproject(coord))
    }

    fn unproject(self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Wgs84 => coord,
            Self::WebMercator => mercator::inverse(coord),
            Self::Utm { zone, hemisphere } => utm::inverse(coord, zone, hemisphere),
        }
    }

    fn project(self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Wgs84 => coord,
            Self::WebMercator => mercator::forward(coord),
            Self::Utm { zone, hemisphere } => utm::forward(coord, zone, hemisphere),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = ReferenceSystemError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);
        let code = digits
            .parse::<u32>()
            .map_err(|_| ReferenceSystemError::Malformed {
                value: value.to_owned(),
            })?;
        Self::from_epsg(code)
    }
}

impl TryFrom<String> for Crs {
    type Error = ReferenceSystemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare coordinates against a tolerance"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("EPSG:4326", Crs::Wgs84)]
    #[case("epsg:3857", Crs::WebMercator)]
    #[case("32632", Crs::Utm { zone: 32, hemisphere: Hemisphere::North })]
    #[case("EPSG:32719", Crs::Utm { zone: 19, hemisphere: Hemisphere::South })]
    fn parses_supported_codes(#[case] raw: &str, #[case] expected: Crs) {
        assert_eq!(raw.parse::<Crs>(), Ok(expected));
    }

    #[rstest]
    #[case("EPSG:32600")]
    #[case("EPSG:32661")]
    #[case("EPSG:2154")]
    fn rejects_unsupported_codes(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<Crs>(),
            Err(ReferenceSystemError::Unsupported { .. })
        ));
    }

    #[rstest]
    fn rejects_malformed_identifier() {
        assert!(matches!(
            "WGS84".parse::<Crs>(),
            Err(ReferenceSystemError::Malformed { .. })
        ));
    }

    #[rstest]
    #[case(-180.0, 1)]
    #[case(0.0, 31)]
    #[case(11.39, 32)]
    #[case(12.0, 33)]
    #[case(179.9, 60)]
    #[case(180.0, 60)]
    fn selects_utm_zone_from_longitude(#[case] longitude: f64, #[case] zone: u8) {
        assert_eq!(Crs::utm_zone_for_longitude(longitude), zone);
    }

    #[rstest]
    fn transform_between_metric_systems_pivots_through_wgs84() {
        let utm = Crs::Utm {
            zone: 32,
            hemisphere: Hemisphere::North,
        };
        let coord = Coord { x: 11.4, y: 47.3 };
        let projected = Crs::Wgs84.transform(coord, utm);
        let mercator = utm.transform(projected, Crs::WebMercator);
        let back = Crs::WebMercator.transform(mercator, Crs::Wgs84);
        assert!((back.x - coord.x).abs() < 1e-6);
        assert!((back.y - coord.y).abs() < 1e-6);
    }
}
