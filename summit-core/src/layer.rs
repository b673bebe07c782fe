//! Named collections of geometry-bearing features.

use geo::{Geometry, LineString, MapCoordsInPlace, MultiPolygon, Point};

use crate::{Crs, JoinGeometry, Peak, ProtectedArea, ReferenceSystemError, RouteSegment, Webcam};

/// A feature carrying a single geometry that can be joined and reprojected.
pub trait SpatialFeature {
    /// Geometry type owned by the feature.
    type Geometry: JoinGeometry + MapCoordsInPlace<f64> + Clone + Into<Geometry<f64>>;

    /// Stable identifier of the feature.
    fn feature_id(&self) -> u64;

    /// Borrow the feature's geometry.
    fn geometry(&self) -> &Self::Geometry;

    /// Mutably borrow the feature's geometry.
    fn geometry_mut(&mut self) -> &mut Self::Geometry;
}

impl SpatialFeature for Peak {
    type Geometry = Point<f64>;

    fn feature_id(&self) -> u64 {
        self.id
    }

    fn geometry(&self) -> &Self::Geometry {
        &self.location
    }

    fn geometry_mut(&mut self) -> &mut Self::Geometry {
        &mut self.location
    }
}

impl SpatialFeature for ProtectedArea {
    type Geometry = MultiPolygon<f64>;

    fn feature_id(&self) -> u64 {
        self.id
    }

    fn geometry(&self) -> &Self::Geometry {
        &self.boundary
    }

    fn geometry_mut(&mut self) -> &mut Self::Geometry {
        &mut self.boundary
    }
}

impl SpatialFeature for RouteSegment {
    type Geometry = LineString<f64>;

    fn feature_id(&self) -> u64 {
        self.id
    }

    fn geometry(&self) -> &Self::Geometry {
        &self.path
    }

    fn geometry_mut(&mut self) -> &mut Self::Geometry {
        &mut self.path
    }
}

impl SpatialFeature for Webcam {
    type Geometry = Point<f64>;

    fn feature_id(&self) -> u64 {
        self.id
    }

    fn geometry(&self) -> &Self::Geometry {
        &self.location
    }

    fn geometry_mut(&mut self) -> &mut Self::Geometry {
        &mut self.location
    }
}

/// A named, homogeneous collection of features in one reference system.
///
/// A layer whose reference system is `None` has not declared one; the
/// normaliser either assigns it the working system or rejects it.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<T> {
    name: String,
    crs: Option<Crs>,
    features: Vec<T>,
}

impl<T> Layer<T> {
    /// Build a layer from its parts.
    pub fn new(name: impl Into<String>, crs: Option<Crs>, features: Vec<T>) -> Self {
        Self {
            name: name.into(),
            crs,
            features,
        }
    }

    /// Build an empty layer in WGS84.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Some(Crs::Wgs84), Vec::new())
    }

    /// Layer name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Declared reference system, if any.
    #[must_use]
    pub const fn crs(&self) -> Option<Crs> {
        self.crs
    }

    /// Borrow the features.
    #[must_use]
    pub const fn features(&self) -> &[T] {
        self.features.as_slice()
    }

    /// Mutably borrow the features.
    pub fn features_mut(&mut self) -> &mut [T] {
        &mut self.features
    }

    /// Keep only the features matching `keep`, returning how many were
    /// removed.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.features.len();
        self.features.retain(keep);
        before.saturating_sub(self.features.len())
    }

    /// Consume the layer, yielding its features.
    #[must_use]
    pub fn into_features(self) -> Vec<T> {
        self.features
    }

    /// Number of features.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.features.len()
    }

    /// Report whether the layer has no features.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Object-safe view over a layer used by the reference-system normaliser.
pub trait GeoLayer {
    /// Layer name used in diagnostics.
    fn layer_name(&self) -> &str;

    /// Declared reference system, if any.
    fn layer_crs(&self) -> Option<Crs>;

    /// Declare the layer's reference system without touching coordinates.
    fn assign_crs(&mut self, crs: Crs);

    /// Transform every coordinate into `target`.
    ///
    /// # Errors
    /// Returns [`ReferenceSystemError::Undefined`] when the layer has not
    /// declared a reference system.
    fn reproject(&mut self, target: Crs) -> Result<(), ReferenceSystemError>;

    /// Clone every geometry, for centroid calculations.
    fn collect_geometries(&self) -> Vec<Geometry<f64>>;
}

impl<T: SpatialFeature> GeoLayer for Layer<T> {
    fn layer_name(&self) -> &str {
        &self.name
    }

    fn layer_crs(&self) -> Option<Crs> {
        self.crs
    }

    fn assign_crs(&mut self, crs: Crs) {
        self.crs = Some(crs);
    }

    fn reproject(&mut self, target: Crs) -> Result<(), ReferenceSystemError> {
        let source = self.crs.ok_or_else(|| ReferenceSystemError::Undefined {
            layer: self.name.clone(),
        })?;
        if source != target {
            log::debug!(
                "reprojecting {} features of layer {} from {source} to {target}",
                self.features.len(),
                self.name
            );
            for feature in &mut self.features {
                feature
                    .geometry_mut()
                    .map_coords_in_place(move |coord| source.transform(coord, target));
            }
        }
        self.crs = Some(target);
        Ok(())
    }

    fn collect_geometries(&self) -> Vec<Geometry<f64>> {
        self.features
            .iter()
            .map(|feature| feature.geometry().clone().into())
            .collect()
    }
}
