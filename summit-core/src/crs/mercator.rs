//! Spherical Web Mercator (`EPSG:3857`).
#![expect(
    clippy::float_arithmetic,
    reason = "map projection formulas are floating-point by nature"
)]

use std::f64::consts::FRAC_PI_4;

use geo::Coord;

const EARTH_RADIUS: f64 = 6_378_137.0;

pub(crate) fn forward(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: EARTH_RADIUS * coord.x.to_radians(),
        y: EARTH_RADIUS * (FRAC_PI_4 + coord.y.to_radians() / 2.0).tan().ln(),
    }
}

pub(crate) fn inverse(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (coord.y / EARTH_RADIUS).exp().atan() - 2.0 * FRAC_PI_4).to_degrees(),
    }
}
