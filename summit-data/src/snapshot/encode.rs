//! Translate typed layers back into a snapshot document.

use std::collections::BTreeMap;

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use serde_json::json;
use summit_core::{Layer, Peak, ProtectedArea, RouteSegment, Signal, Snapshot, Webcam};

use super::decode::raw_signal_key;
use super::{LayerDocument, SnapshotDocument};

pub(super) fn encode(snapshot: &Snapshot) -> SnapshotDocument {
    let layers = BTreeMap::from([
        encode_layer(&snapshot.peaks, peak_feature),
        encode_layer(&snapshot.protected_areas, area_feature),
        encode_layer(&snapshot.routes, route_feature),
        encode_layer(&snapshot.webcams, webcam_feature),
    ]);
    SnapshotDocument { layers }
}

fn encode_layer<T>(layer: &Layer<T>, encode: fn(&T) -> Feature) -> (String, LayerDocument) {
    let features = FeatureCollection {
        bbox: None,
        features: layer.features().iter().map(encode).collect(),
        foreign_members: None,
    };
    let document = LayerDocument {
        crs: layer.crs().map(|crs| crs.to_string()),
        features,
    };
    (layer.name().to_owned(), document)
}

fn feature(id: u64, geometry: geojson::Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geometry)),
        id: Some(Id::Number(id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn object(value: JsonValue) -> JsonObject {
    match value {
        JsonValue::Object(map) => map,
        _ => JsonObject::new(),
    }
}

fn peak_feature(peak: &Peak) -> Feature {
    let derived = &peak.derived;
    let mut properties = object(json!({
        "name": peak.name,
        "elevation": peak.elevation,
        "aggregate_popularity": derived.aggregate_popularity,
        "protection_class": derived.protection_class,
        "protection_threshold": derived.protection_threshold,
        "stress_score": derived.stress_score,
    }));
    properties.insert(
        raw_signal_key(Signal::PageViews).to_owned(),
        json!(peak.signals.view_count),
    );
    properties.insert(
        raw_signal_key(Signal::RouteTraffic).to_owned(),
        json!(peak.signals.route_traffic_rate),
    );
    properties.insert(
        raw_signal_key(Signal::Pedestrians).to_owned(),
        json!(peak.signals.pedestrian_count),
    );
    for signal in Signal::ALL {
        properties.insert(
            format!("popularity_measure_{signal}"),
            json!(derived.measures.get(signal)),
        );
    }
    feature(peak.id, geojson::Value::from(&peak.location), properties)
}

fn area_feature(area: &ProtectedArea) -> Feature {
    let properties = object(json!({
        "name": area.name,
        "protect_class": area.protection_class,
    }));
    feature(area.id, geojson::Value::from(&area.boundary), properties)
}

fn route_feature(route: &RouteSegment) -> Feature {
    let properties = object(json!({
        "traffic_count": route.traffic_count,
        "created_at": route.created_at.to_rfc3339(),
        "updated_at": route.updated_at.to_rfc3339(),
        "traffic_count_per_year": route.traffic_count_per_year(),
    }));
    feature(route.id, geojson::Value::from(&route.path), properties)
}

fn webcam_feature(webcam: &Webcam) -> Feature {
    let properties = object(json!({ "pedestrian_count": webcam.pedestrian_count }));
    feature(webcam.id, geojson::Value::from(&webcam.location), properties)
}
