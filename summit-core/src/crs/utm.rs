//! Universal Transverse Mercator on the WGS84 ellipsoid.
//!
//! Uses the third-order Krüger series, which keeps errors at the millimetre
//! level within a few thousand kilometres of the central meridian.
#![expect(
    clippy::float_arithmetic,
    reason = "map projection formulas are floating-point by nature"
)]

use geo::Coord;

use super::Hemisphere;

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Series coefficients derived from the ellipsoid's third flattening.
struct Series {
    rectifying_radius: f64,
    eccentricity: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl Series {
    fn wgs84() -> Self {
        let n = FLATTENING / (2.0 - FLATTENING);
        let n2 = n * n;
        let n3 = n2 * n;
        Self {
            rectifying_radius: SEMI_MAJOR_AXIS / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            eccentricity: 2.0 * n.sqrt() / (1.0 + n),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }
}

/// Central meridian of a zone in degrees.
pub(crate) fn central_meridian(zone: u8) -> f64 {
    f64::from(zone) * 6.0 - 183.0
}

const fn false_northing(hemisphere: Hemisphere) -> f64 {
    match hemisphere {
        Hemisphere::North => 0.0,
        Hemisphere::South => FALSE_NORTHING_SOUTH,
    }
}

/// Project a `(longitude, latitude)` coordinate in degrees to easting and
/// northing in metres.
pub(crate) fn forward(coord: Coord<f64>, zone: u8, hemisphere: Hemisphere) -> Coord<f64> {
    let series = Series::wgs84();
    let phi = coord.y.to_radians();
    let lambda = (coord.x - central_meridian(zone)).to_radians();
    let e = series.eccentricity;

    let t = (phi.sin().atanh() - e * (e * phi.sin()).atanh()).sinh();
    let xi_prime = t.atan2(lambda.cos());
    let eta_prime = (lambda.sin() / (1.0 + t * t).sqrt()).atanh();

    let mut xi = xi_prime;
    let mut eta = eta_prime;
    for (j, alpha) in (1_u8..).zip(series.alpha) {
        let k = 2.0 * f64::from(j);
        xi += alpha * (k * xi_prime).sin() * (k * eta_prime).cosh();
        eta += alpha * (k * xi_prime).cos() * (k * eta_prime).sinh();
    }

    let scale = SCALE_FACTOR * series.rectifying_radius;
    Coord {
        x: FALSE_EASTING + scale * eta,
        y: false_northing(hemisphere) + scale * xi,
    }
}

/// Invert [`forward`], returning `(longitude, latitude)` in degrees.
pub(crate) fn inverse(coord: Coord<f64>, zone: u8, hemisphere: Hemisphere) -> Coord<f64> {
    let series = Series::wgs84();
    let scale = SCALE_FACTOR * series.rectifying_radius;
    let xi = (coord.y - false_northing(hemisphere)) / scale;
    let eta = (coord.x - FALSE_EASTING) / scale;

    let mut xi_prime = xi;
    let mut eta_prime = eta;
    for (j, beta) in (1_u8..).zip(series.beta) {
        let k = 2.0 * f64::from(j);
        xi_prime -= beta * (k * xi).sin() * (k * eta).cosh();
        eta_prime -= beta * (k * xi).cos() * (k * eta).sinh();
    }

    let chi = (xi_prime.sin() / eta_prime.cosh()).asin();
    let mut phi = chi;
    for (j, delta) in (1_u8..).zip(series.delta) {
        phi += delta * (2.0 * f64::from(j) * chi).sin();
    }
    let lambda = eta_prime.sinh().atan2(xi_prime.cos());

    Coord {
        x: central_meridian(zone) + lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn central_meridian_maps_to_false_easting() {
        let projected = forward(Coord { x: 9.0, y: 47.0 }, 32, Hemisphere::North);
        assert!((projected.x - FALSE_EASTING).abs() < 1e-6);
    }

    #[rstest]
    fn equator_on_central_meridian_is_origin() {
        let projected = forward(Coord { x: 15.0, y: 0.0 }, 33, Hemisphere::North);
        assert!((projected.x - FALSE_EASTING).abs() < 1e-6);
        assert!(projected.y.abs() < 1e-6);
    }

    #[rstest]
    fn innsbruck_matches_reference_easting_northing() {
        // Innsbruck in zone 32N: roughly E 681 000, N 5 237 000.
        let projected = forward(Coord { x: 11.3933, y: 47.2683 }, 32, Hemisphere::North);
        assert!((projected.x - 681_000.0).abs() < 2_000.0, "{projected:?}");
        assert!((projected.y - 5_237_000.0).abs() < 2_000.0, "{projected:?}");
    }

    #[rstest]
    #[case(Coord { x: 11.39, y: 47.27 }, 32, Hemisphere::North)]
    #[case(Coord { x: -70.6, y: -33.4 }, 19, Hemisphere::South)]
    #[case(Coord { x: 174.8, y: -41.3 }, 60, Hemisphere::South)]
    fn inverse_undoes_forward(
        #[case] coord: Coord<f64>,
        #[case] zone: u8,
        #[case] hemisphere: Hemisphere,
    ) {
        let back = inverse(forward(coord, zone, hemisphere), zone, hemisphere);
        assert!((back.x - coord.x).abs() < 1e-7, "{back:?}");
        assert!((back.y - coord.y).abs() < 1e-7, "{back:?}");
    }
}
