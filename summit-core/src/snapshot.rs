use crate::{GeoLayer, Layer, Peak, ProtectedArea, RouteSegment, Webcam};

/// Layer name used for peaks.
pub const PEAKS_LAYER: &str = "peaks";
/// Layer name used for protected areas.
pub const PROTECTED_AREAS_LAYER: &str = "protected_areas";
/// Layer name used for route segments.
pub const ROUTES_LAYER: &str = "routes";
/// Layer name used for webcams.
pub const WEBCAMS_LAYER: &str = "webcams";

/// Every layer a stress run reads or writes.
///
/// Peaks are the primary layer: their reference system is the working
/// system unless the caller overrides it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Peaks to score.
    pub peaks: Layer<Peak>,
    /// Protected areas used for classification.
    pub protected_areas: Layer<ProtectedArea>,
    /// Activity route segments.
    pub routes: Layer<RouteSegment>,
    /// Webcams with pedestrian counts.
    pub webcams: Layer<Webcam>,
}

impl Snapshot {
    /// Build a snapshot holding only `peaks`; supporting layers start empty.
    #[must_use]
    pub fn from_peaks(peaks: Layer<Peak>) -> Self {
        Self {
            peaks,
            protected_areas: Layer::empty(PROTECTED_AREAS_LAYER),
            routes: Layer::empty(ROUTES_LAYER),
            webcams: Layer::empty(WEBCAMS_LAYER),
        }
    }

    /// Borrow every layer for reprojection, primary layer first.
    pub fn layers_mut(&mut self) -> [&mut dyn GeoLayer; 4] {
        [
            &mut self.peaks,
            &mut self.protected_areas,
            &mut self.routes,
            &mut self.webcams,
        ]
    }
}
