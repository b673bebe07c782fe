//! Bring sets of layers into a shared reference system.
//!
//! The first layer handed to [`to_common`] is the primary layer: its system
//! becomes the working system unless the caller names one explicitly.

use geo::{Centroid, GeometryCollection, MapCoordsInPlace};

use super::{Crs, Hemisphere};
use crate::{GeoLayer, ReferenceSystemError};

/// Reproject every layer into one reference system.
///
/// The working system is `target` when given, otherwise the primary layer's
/// declared system. A layer without a declared system is assumed to already
/// be in the working system when `target` is given and is rejected
/// otherwise.
///
/// # Errors
/// Returns [`ReferenceSystemError::Undefined`] when the working system cannot
/// be resolved or a layer lacks a system and no target was supplied.
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use summit_core::{Crs, GeoLayer, Layer, Peak, crs::to_common};
///
/// let mut peaks = Layer::new(
///     "peaks",
///     Some(Crs::WebMercator),
///     vec![Peak::new(1, "Origin", Point::new(0.0, 0.0))],
/// );
/// let mut webcams = Layer::<summit_core::Webcam>::new("webcams", None, Vec::new());
/// let common = to_common(&mut [&mut peaks, &mut webcams], Some(Crs::Wgs84))?;
/// assert_eq!(common, Crs::Wgs84);
/// assert_eq!(webcams.layer_crs(), Some(Crs::Wgs84));
/// # Ok::<(), summit_core::ReferenceSystemError>(())
/// ```
pub fn to_common(
    layers: &mut [&mut dyn GeoLayer],
    target: Option<Crs>,
) -> Result<Crs, ReferenceSystemError> {
    let common = match (target, layers.first()) {
        (Some(crs), _) => crs,
        (None, None) => Crs::Wgs84,
        (None, Some(primary)) => {
            primary
                .layer_crs()
                .ok_or_else(|| ReferenceSystemError::Undefined {
                    layer: primary.layer_name().to_owned(),
                })?
        }
    };
    for layer in layers.iter_mut() {
        if layer.layer_crs().is_none() {
            if target.is_none() {
                return Err(ReferenceSystemError::Undefined {
                    layer: layer.layer_name().to_owned(),
                });
            }
            log::warn!(
                "layer {} declares no reference system; assuming {common}",
                layer.layer_name()
            );
            layer.assign_crs(common);
        }
        layer.reproject(common)?;
    }
    Ok(common)
}

/// Pick the UTM zone covering the centroid of every geometry in `layers`.
///
/// The centroid is taken in WGS84 degrees; layers in other systems are
/// unprojected first. The hemisphere follows the sign of the centroid
/// latitude.
///
/// # Errors
/// Returns [`ReferenceSystemError::Undefined`] for a layer without a declared
/// system and [`ReferenceSystemError::EmptyGeometry`] when there is nothing
/// to take a centroid of.
pub fn metric_projection_for<'a>(
    layers: impl IntoIterator<Item = &'a dyn GeoLayer>,
) -> Result<Crs, ReferenceSystemError> {
    let mut geometries = Vec::new();
    for layer in layers {
        let crs = layer
            .layer_crs()
            .ok_or_else(|| ReferenceSystemError::Undefined {
                layer: layer.layer_name().to_owned(),
            })?;
        geometries.extend(layer.collect_geometries().into_iter().map(|mut geometry| {
            geometry.map_coords_in_place(move |coord| crs.transform(coord, Crs::Wgs84));
            geometry
        }));
    }
    let centroid = geometries
        .into_iter()
        .collect::<GeometryCollection<f64>>()
        .centroid()
        .ok_or(ReferenceSystemError::EmptyGeometry)?;
    let hemisphere = if centroid.y() < 0.0 {
        Hemisphere::South
    } else {
        Hemisphere::North
    };
    Ok(Crs::Utm {
        zone: Crs::utm_zone_for_longitude(centroid.x()),
        hemisphere,
    })
}

/// Reproject every layer into the metric system chosen by
/// [`metric_projection_for`].
///
/// # Errors
/// Propagates [`metric_projection_for`] and reprojection errors.
pub fn to_metric(layers: &mut [&mut dyn GeoLayer]) -> Result<Crs, ReferenceSystemError> {
    let metric = metric_projection_for(layers.iter().map(|layer| &**layer as &dyn GeoLayer))?;
    log::info!("projecting {} layers into {metric}", layers.len());
    for layer in layers.iter_mut() {
        layer.reproject(metric)?;
    }
    Ok(metric)
}

/// Reproject every layer back into canonical WGS84.
///
/// Layers already in WGS84 are left untouched, so repeated calls are
/// idempotent.
///
/// # Errors
/// Returns [`ReferenceSystemError::Undefined`] for a layer without a declared
/// system.
pub fn to_canonical(layers: &mut [&mut dyn GeoLayer]) -> Result<(), ReferenceSystemError> {
    for layer in layers.iter_mut() {
        layer.reproject(Crs::Wgs84)?;
    }
    Ok(())
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare coordinates against a tolerance"
)]
mod tests {
    use super::*;
    use crate::{Layer, Peak, Webcam};
    use geo::Point;
    use rstest::{fixture, rstest};

    #[fixture]
    fn peaks() -> Layer<Peak> {
        Layer::new(
            "peaks",
            Some(Crs::Wgs84),
            vec![
                Peak::new(1, "Habicht", Point::new(11.288, 47.043)),
                Peak::new(2, "Serles", Point::new(11.383, 47.118)),
            ],
        )
    }

    #[rstest]
    fn layer_without_crs_is_rejected_without_target(mut peaks: Layer<Peak>) {
        let mut webcams = Layer::<Webcam>::new("webcams", None, Vec::new());
        let err = to_common(&mut [&mut peaks, &mut webcams], None).expect_err("undefined");
        assert_eq!(
            err,
            ReferenceSystemError::Undefined {
                layer: "webcams".to_owned()
            }
        );
    }

    #[rstest]
    fn primary_layer_sets_the_working_system(mut peaks: Layer<Peak>) {
        let mut webcams = Layer::new(
            "webcams",
            Some(Crs::WebMercator),
            vec![Webcam {
                id: 9,
                location: Point::new(1_267_000.0, 5_955_000.0),
                pedestrian_count: 3,
            }],
        );
        let common = to_common(&mut [&mut peaks, &mut webcams], None).expect("normalised");
        assert_eq!(common, Crs::Wgs84);
        let location = webcams.features().first().expect("webcam").location;
        assert!((location.x() - 11.38).abs() < 0.01, "{location:?}");
        assert!((location.y() - 47.1).abs() < 0.1, "{location:?}");
    }

    #[rstest]
    fn metric_round_trip_preserves_coordinates(mut peaks: Layer<Peak>) {
        let original = peaks.clone();
        let metric = to_metric(&mut [&mut peaks]).expect("metric");
        assert_eq!(
            metric,
            Crs::Utm {
                zone: 32,
                hemisphere: Hemisphere::North
            }
        );
        assert!(peaks.features().iter().all(|peak| peak.location.x() > 1_000.0));
        to_canonical(&mut [&mut peaks]).expect("canonical");
        for (back, before) in peaks.features().iter().zip(original.features()) {
            assert!((back.location.x() - before.location.x()).abs() < 1e-6);
            assert!((back.location.y() - before.location.y()).abs() < 1e-6);
        }
    }

    #[rstest]
    fn southern_centroid_selects_southern_zone() {
        let mut peaks = Layer::new(
            "peaks",
            Some(Crs::Wgs84),
            vec![Peak::new(1, "Aconcagua", Point::new(-70.011, -32.653))],
        );
        let metric = to_metric(&mut [&mut peaks]).expect("metric");
        assert_eq!(metric.epsg(), 32_719);
    }

    #[rstest]
    fn empty_layers_have_no_metric_projection() {
        let mut peaks = Layer::<Peak>::empty("peaks");
        assert_eq!(
            to_metric(&mut [&mut peaks]),
            Err(ReferenceSystemError::EmptyGeometry)
        );
    }

    #[rstest]
    fn canonicalising_twice_is_a_no_op(mut peaks: Layer<Peak>) {
        to_canonical(&mut [&mut peaks]).expect("first pass");
        let once = peaks.clone();
        to_canonical(&mut [&mut peaks]).expect("second pass");
        assert_eq!(peaks, once);
    }
}
