//! Batch stress computation over one snapshot.

use std::collections::BTreeMap;

use geo::Point;
use summit_core::join::{buffer, join};
use summit_core::{
    ConfigurationError, Crs, Layer, Peak, Predicate, Region, RouteSegment, Signal, Snapshot, Webcam,
    crs,
};

use crate::{
    PipelineError, StressConfig, Transform, aggregate, classify_all, normalise, score, threshold,
};

/// Outcome counts of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StressReport {
    /// Peaks with a defined stress score.
    pub scored: usize,
    /// Peaks kept in the output without a stress score.
    pub unscored: usize,
    /// Peaks dropped because their key signal was malformed.
    pub filtered: usize,
    /// Metric system the joins ran in; `None` when there were no peaks.
    pub metric_projection: Option<Crs>,
}

/// Computes stress scores for every peak in a snapshot.
///
/// A run is a pure function of the snapshot and configuration. Layers are
/// normalised into the working system, joined in a UTM zone chosen from
/// their centroid, returned to WGS84, and then scored.
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use summit_core::{Crs, Layer, Peak, RawSignals, Snapshot};
/// use summit_scorer::{StressConfig, StressPipeline};
///
/// let peak = Peak::new(1, "Nockspitze", Point::new(11.31, 47.19)).with_signals(RawSignals {
///     view_count: Some(100),
///     ..RawSignals::default()
/// });
/// let snapshot = Snapshot::from_peaks(Layer::new("peaks", Some(Crs::Wgs84), vec![peak]));
/// let pipeline = StressPipeline::new(StressConfig::default())?;
/// let (scored, report) = pipeline.run(snapshot)?;
/// assert_eq!(report.scored, 0, "no protected area, so no threshold");
/// assert_eq!(scored.peaks.features()[0].derived.aggregate_popularity, Some(1.0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct StressPipeline {
    config: StressConfig,
}

impl StressPipeline {
    /// Validate `config` and build a pipeline around it.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] when the configuration is unusable.
    pub fn new(config: StressConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration the pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &StressConfig {
        &self.config
    }

    /// Score every peak in `snapshot`.
    ///
    /// The returned snapshot holds all four layers in WGS84 with derived
    /// fields filled in on the peaks.
    ///
    /// # Errors
    /// Returns [`PipelineError`] when a layer has no usable reference system
    /// or the weights cannot be renormalised for some peak.
    pub fn run(&self, mut snapshot: Snapshot) -> Result<(Snapshot, StressReport), PipelineError> {
        let working = crs::to_common(&mut snapshot.layers_mut(), self.config.reference_system)?;
        log::info!(
            "scoring {} peaks against {} protected areas, {} routes, {} webcams in {working}",
            snapshot.peaks.len(),
            snapshot.protected_areas.len(),
            snapshot.routes.len(),
            snapshot.webcams.len()
        );

        let metric_projection = if snapshot.peaks.is_empty() {
            None
        } else {
            let metric = crs::to_metric(&mut snapshot.layers_mut())?;
            self.join_signals(&mut snapshot);
            self.classify(&mut snapshot);
            Some(metric)
        };
        crs::to_canonical(&mut snapshot.layers_mut())?;

        normalise_peaks(&mut snapshot.peaks);
        self.score_peaks(&mut snapshot.peaks)?;
        let filtered = self.filter_malformed(&mut snapshot.peaks);

        let scored = snapshot
            .peaks
            .features()
            .iter()
            .filter(|peak| peak.derived.stress_score.is_some())
            .count();
        let report = StressReport {
            scored,
            unscored: snapshot.peaks.len().saturating_sub(scored),
            filtered,
            metric_projection,
        };
        log::info!(
            "scored {} peaks, {} without a score, {} filtered",
            report.scored,
            report.unscored,
            report.filtered
        );
        Ok((snapshot, report))
    }

    /// Attach route traffic and pedestrian counts found inside each buffer.
    ///
    /// Peaks are keyed by position, so repeated identifiers never share
    /// results. A supporting layer with no features leaves the peaks' own
    /// raw values in place.
    fn join_signals(&self, snapshot: &mut Snapshot) {
        let radius = self.config.buffer_radius_meters;
        let regions: Vec<(usize, Region)> = snapshot
            .peaks
            .features()
            .iter()
            .enumerate()
            .map(|(position, peak)| (position, buffer(peak.location, radius)))
            .collect();

        let route_rates = (!snapshot.routes.is_empty()).then(|| {
            join(&regions, &snapshot.routes, Predicate::Intersects)
                .into_iter()
                .map(|(position, segments)| (position, mean_traffic_rate(&segments)))
                .collect::<BTreeMap<_, _>>()
        });
        let pedestrians = (!snapshot.webcams.is_empty()).then(|| {
            join(&regions, &snapshot.webcams, Predicate::Intersects)
                .into_iter()
                .map(|(position, webcams)| (position, total_pedestrians(&webcams)))
                .collect::<BTreeMap<_, _>>()
        });

        for (position, peak) in snapshot.peaks.features_mut().iter_mut().enumerate() {
            if let Some(rates) = &route_rates {
                peak.signals.route_traffic_rate = rates.get(&position).copied().flatten();
            }
            if let Some(counts) = &pedestrians {
                peak.signals.pedestrian_count = counts.get(&position).copied().flatten();
            }
            log::debug!(
                "peak {} ({}): route rate {:?}, pedestrians {:?}",
                peak.id,
                peak.name,
                peak.signals.route_traffic_rate,
                peak.signals.pedestrian_count
            );
        }
    }

    fn classify(&self, snapshot: &mut Snapshot) {
        let points: Vec<(usize, Point<f64>)> = snapshot
            .peaks
            .features()
            .iter()
            .map(|peak| peak.location)
            .enumerate()
            .collect();
        let classes = classify_all(&points, &snapshot.protected_areas, self.config.tie_break);
        for (position, peak) in snapshot.peaks.features_mut().iter_mut().enumerate() {
            peak.derived.protection_class = classes
                .get(&position)
                .copied()
                .flatten()
                .or(self.config.unprotected_class);
        }
    }

    fn score_peaks(&self, peaks: &mut Layer<Peak>) -> Result<(), ConfigurationError> {
        let table = &self.config.protection_class_to_threshold;
        for peak in peaks.features_mut() {
            let derived = &mut peak.derived;
            derived.aggregate_popularity = aggregate(&derived.measures, &self.config.signal_weights)?;
            derived.protection_threshold = derived
                .protection_class
                .and_then(|class| threshold(class, table));
            derived.stress_score = score(derived.aggregate_popularity, derived.protection_threshold);
            if derived.stress_score.is_none() {
                log::debug!("peak {} ({}) has no stress score", peak.id, peak.name);
            }
        }
        Ok(())
    }

    fn filter_malformed(&self, peaks: &mut Layer<Peak>) -> usize {
        let Some(key) = self.config.key_signal else {
            return 0;
        };
        let removed = peaks.retain(|peak| !peak.malformed.contains(&key));
        if removed > 0 {
            log::info!("dropped {removed} peaks with a malformed {key} signal");
        }
        removed
    }
}

/// Replace every peak's measures with the population-normalised values.
fn normalise_peaks(peaks: &mut Layer<Peak>) {
    for signal in Signal::ALL {
        let raw: Vec<Option<f64>> = peaks
            .features()
            .iter()
            .map(|peak| peak.signals.value(signal))
            .collect();
        let measures = normalise(&raw, Transform::for_signal(signal));
        for (peak, measure) in peaks.features_mut().iter_mut().zip(measures) {
            peak.derived.measures.set(signal, measure);
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "mean of per-segment yearly rates"
)]
fn mean_traffic_rate(segments: &[&RouteSegment]) -> Option<f64> {
    if segments.is_empty() {
        return None;
    }
    let total: f64 = segments
        .iter()
        .map(|segment| segment.traffic_count_per_year())
        .sum();
    Some(total / segments.len() as f64)
}

fn total_pedestrians(webcams: &[&Webcam]) -> Option<i64> {
    if webcams.is_empty() {
        return None;
    }
    Some(
        webcams
            .iter()
            .map(|webcam| webcam.pedestrian_count)
            .fold(0, i64::saturating_add),
    )
}
