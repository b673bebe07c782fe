//! Builders and in-memory doubles shared by unit and behaviour tests.

use std::collections::HashMap;

use geo::{MultiPolygon, Point, polygon};

use crate::{Peak, ProtectedArea, Signal, SignalSource};

/// `SignalSource` answering from a fixed table keyed by peak identifier.
#[derive(Debug, Clone)]
pub struct StaticSignalSource {
    signal: Signal,
    values: HashMap<u64, f64>,
}

impl StaticSignalSource {
    /// Create an empty source for `signal`.
    #[must_use]
    pub fn new(signal: Signal) -> Self {
        Self {
            signal,
            values: HashMap::new(),
        }
    }

    /// Register the value returned for peak `id`.
    #[must_use]
    pub fn with_value(mut self, id: u64, value: f64) -> Self {
        self.values.insert(id, value);
        self
    }
}

impl SignalSource for StaticSignalSource {
    fn signal(&self) -> Signal {
        self.signal
    }

    fn fetch_raw_signal(&self, peak: &Peak) -> Option<f64> {
        self.values.get(&peak.id).copied()
    }
}

/// Axis-aligned square protected area centred on `centre` in WGS84 degrees.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "square corners are offsets from the centre"
)]
pub fn square_area(
    id: u64,
    name: &str,
    protection_class: i64,
    centre: Point<f64>,
    half_side: f64,
) -> ProtectedArea {
    let (x, y) = centre.x_y();
    let ring = polygon![
        (x: x - half_side, y: y - half_side),
        (x: x + half_side, y: y - half_side),
        (x: x + half_side, y: y + half_side),
        (x: x - half_side, y: y + half_side),
    ];
    ProtectedArea {
        id,
        name: name.to_owned(),
        protection_class,
        boundary: MultiPolygon::new(vec![ring]),
    }
}
