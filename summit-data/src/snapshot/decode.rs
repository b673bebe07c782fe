//! Translate snapshot documents into typed layers.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use geo::{Geometry, MultiPolygon};
use geojson::feature::Id;
use geojson::{Feature, JsonObject, JsonValue};
use summit_core::{
    Crs, Layer, PEAKS_LAYER, PROTECTED_AREAS_LAYER, Peak, ProtectedArea, ROUTES_LAYER,
    RawSignals, RouteSegment, Signal, Snapshot, WEBCAMS_LAYER, Webcam,
};

use super::{LayerDocument, SnapshotDocument, SnapshotError};

const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub(super) fn decode(document: SnapshotDocument) -> Result<Snapshot, SnapshotError> {
    let mut layers = document.layers;
    let peaks = layers
        .remove(PEAKS_LAYER)
        .ok_or(SnapshotError::MissingLayer { layer: PEAKS_LAYER })?;
    let snapshot = Snapshot {
        peaks: decode_layer(PEAKS_LAYER, peaks, decode_peak)?,
        protected_areas: decode_optional(&mut layers, PROTECTED_AREAS_LAYER, decode_area)?,
        routes: decode_optional(&mut layers, ROUTES_LAYER, decode_route)?,
        webcams: decode_optional(&mut layers, WEBCAMS_LAYER, decode_webcam)?,
    };
    for name in layers.keys() {
        log::warn!("ignoring unrecognised snapshot layer `{name}`");
    }
    Ok(snapshot)
}

type Decoder<T> = fn(&FeatureContext<'_>, Feature) -> Result<Option<T>, SnapshotError>;

fn decode_optional<T>(
    layers: &mut BTreeMap<String, LayerDocument>,
    name: &'static str,
    decoder: Decoder<T>,
) -> Result<Layer<T>, SnapshotError> {
    layers.remove(name).map_or_else(
        || {
            log::debug!("snapshot has no `{name}` layer; treating it as empty");
            Ok(Layer::empty(name))
        },
        |document| decode_layer(name, document, decoder),
    )
}

fn decode_layer<T>(
    name: &str,
    document: LayerDocument,
    decoder: Decoder<T>,
) -> Result<Layer<T>, SnapshotError> {
    let crs = document
        .crs
        .as_deref()
        .map(str::parse::<Crs>)
        .transpose()
        .map_err(|source| SnapshotError::ReferenceSystem {
            layer: name.to_owned(),
            source,
        })?;
    let mut features = Vec::with_capacity(document.features.features.len());
    for (index, feature) in document.features.features.into_iter().enumerate() {
        let context = FeatureContext { layer: name, index };
        if let Some(decoded) = decoder(&context, feature)? {
            features.push(decoded);
        }
    }
    Ok(Layer::new(name, crs, features))
}

/// Position of a feature, used to build diagnostics.
struct FeatureContext<'a> {
    layer: &'a str,
    index: usize,
}

impl FeatureContext<'_> {
    fn malformed(&self, reason: impl Into<String>) -> SnapshotError {
        SnapshotError::MalformedFeature {
            layer: self.layer.to_owned(),
            index: self.index,
            reason: reason.into(),
        }
    }

    fn id(&self, feature: &Feature) -> Result<u64, SnapshotError> {
        match &feature.id {
            None => u64::try_from(self.index)
                .map_err(|_| self.malformed("feature position does not fit an identifier")),
            Some(Id::Number(number)) => number
                .as_u64()
                .ok_or_else(|| self.malformed(format!("identifier {number} is not a u64"))),
            Some(Id::String(text)) => text
                .parse()
                .map_err(|_| self.malformed(format!("identifier `{text}` is not a u64"))),
        }
    }

    fn geometry(&self, feature: &mut Feature) -> Result<Geometry<f64>, SnapshotError> {
        let geometry = feature
            .geometry
            .take()
            .ok_or_else(|| self.malformed("feature has no geometry"))?;
        Geometry::try_from(geometry).map_err(|err| self.malformed(err.to_string()))
    }

    fn wrong_geometry(&self, expected: &str, found: &Geometry<f64>) -> SnapshotError {
        self.malformed(format!(
            "expected {expected} geometry, found {}",
            geometry_kind(found)
        ))
    }
}

const fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Outcome of reading one numeric property.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field<T> {
    Absent,
    Present(T),
    Malformed,
}

impl<T> Field<T> {
    fn present(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Malformed => None,
        }
    }
}

/// Read a number, accepting numeric strings as written by spreadsheet and
/// database exports. Null and blank strings are absent.
fn float_field(properties: &JsonObject, key: &str) -> Field<f64> {
    match properties.get(key) {
        None | Some(JsonValue::Null) => Field::Absent,
        Some(JsonValue::Number(number)) => number.as_f64().map_or(Field::Malformed, Field::Present),
        Some(JsonValue::String(text)) if text.trim().is_empty() => Field::Absent,
        Some(JsonValue::String(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map_or(Field::Malformed, Field::Present),
        Some(_) => Field::Malformed,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "fractional counts round to the nearest whole count, saturating"
)]
fn integer_field(properties: &JsonObject, key: &str) -> Field<i64> {
    if let Some(JsonValue::Number(number)) = properties.get(key)
        && let Some(value) = number.as_i64()
    {
        return Field::Present(value);
    }
    match float_field(properties, key) {
        Field::Present(value) => Field::Present(value.round() as i64),
        Field::Absent => Field::Absent,
        Field::Malformed => Field::Malformed,
    }
}

fn string_field(properties: &JsonObject, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
}

fn timestamp_field(properties: &JsonObject, key: &str) -> Option<DateTime<Utc>> {
    let text = properties.get(key).and_then(JsonValue::as_str)?.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Property carrying the raw value of `signal` on a peak.
pub(super) const fn raw_signal_key(signal: Signal) -> &'static str {
    match signal {
        Signal::PageViews => "view_count",
        Signal::RouteTraffic => "route_traffic_rate",
        Signal::Pedestrians => "pedestrian_count",
    }
}

fn decode_peak(
    context: &FeatureContext<'_>,
    mut feature: Feature,
) -> Result<Option<Peak>, SnapshotError> {
    let id = context.id(&feature)?;
    let location = match context.geometry(&mut feature)? {
        Geometry::Point(point) => point,
        other => return Err(context.wrong_geometry("Point", &other)),
    };
    let properties = feature.properties.unwrap_or_default();
    let name = string_field(&properties, "name").unwrap_or_default();
    let mut peak = Peak::new(id, name, location);

    match float_field(&properties, "elevation") {
        Field::Present(elevation) => peak.elevation = Some(elevation),
        Field::Malformed => log::warn!("peak {id}: ignoring non-numeric elevation"),
        Field::Absent => {}
    }

    let mut signals = RawSignals::default();
    for signal in Signal::ALL {
        let key = raw_signal_key(signal);
        let malformed = match signal {
            Signal::RouteTraffic => {
                let field = float_field(&properties, key);
                signals.route_traffic_rate = field.present();
                field == Field::Malformed
            }
            Signal::PageViews => {
                let field = integer_field(&properties, key);
                signals.view_count = field.present();
                field == Field::Malformed
            }
            Signal::Pedestrians => {
                let field = integer_field(&properties, key);
                signals.pedestrian_count = field.present();
                field == Field::Malformed
            }
        };
        if malformed {
            log::warn!("peak {id} ({}): `{key}` is not a number", peak.name);
            peak.malformed.insert(signal);
        }
    }
    Ok(Some(peak.with_signals(signals)))
}

fn decode_area(
    context: &FeatureContext<'_>,
    mut feature: Feature,
) -> Result<Option<ProtectedArea>, SnapshotError> {
    let id = context.id(&feature)?;
    let boundary = match context.geometry(&mut feature)? {
        Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
        Geometry::MultiPolygon(polygons) => polygons,
        other => return Err(context.wrong_geometry("Polygon or MultiPolygon", &other)),
    };
    let properties = feature.properties.unwrap_or_default();
    let Field::Present(protection_class) = integer_field(&properties, "protect_class") else {
        log::warn!("protected area {id}: no usable `protect_class`; skipping");
        return Ok(None);
    };
    Ok(Some(ProtectedArea {
        id,
        name: string_field(&properties, "name").unwrap_or_default(),
        protection_class,
        boundary,
    }))
}

fn decode_route(
    context: &FeatureContext<'_>,
    mut feature: Feature,
) -> Result<Option<RouteSegment>, SnapshotError> {
    let id = context.id(&feature)?;
    let path = match context.geometry(&mut feature)? {
        Geometry::LineString(path) => path,
        other => return Err(context.wrong_geometry("LineString", &other)),
    };
    let properties = feature.properties.unwrap_or_default();
    let Field::Present(traffic_count) = integer_field(&properties, "traffic_count") else {
        log::warn!("route {id}: no usable `traffic_count`; skipping");
        return Ok(None);
    };
    let (Some(created_at), Some(updated_at)) = (
        timestamp_field(&properties, "created_at"),
        timestamp_field(&properties, "updated_at"),
    ) else {
        log::warn!("route {id}: unreadable `created_at` or `updated_at`; skipping");
        return Ok(None);
    };
    Ok(Some(RouteSegment {
        id,
        path,
        traffic_count,
        created_at,
        updated_at,
    }))
}

fn decode_webcam(
    context: &FeatureContext<'_>,
    mut feature: Feature,
) -> Result<Option<Webcam>, SnapshotError> {
    let id = context.id(&feature)?;
    let location = match context.geometry(&mut feature)? {
        Geometry::Point(point) => point,
        other => return Err(context.wrong_geometry("Point", &other)),
    };
    let properties = feature.properties.unwrap_or_default();
    let Field::Present(pedestrian_count) = integer_field(&properties, "pedestrian_count") else {
        log::warn!("webcam {id}: no usable `pedestrian_count`; skipping");
        return Ok(None);
    };
    Ok(Some(Webcam {
        id,
        location,
        pedestrian_count,
    }))
}
