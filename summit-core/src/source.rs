//! Fetch raw usage signals from external services.
//!
//! A [`SignalSource`] turns a peak into a single raw observation. Sources
//! never fail a run: network errors, missing pages, and exhausted retries all
//! surface as `None` so the peak simply lacks that signal.

use crate::{Layer, Peak, Signal};

/// Retrieve one raw usage signal per peak.
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use summit_core::{Peak, Signal, SignalSource};
///
/// struct NameLength;
///
/// impl SignalSource for NameLength {
///     fn signal(&self) -> Signal {
///         Signal::PageViews
///     }
///
///     fn fetch_raw_signal(&self, peak: &Peak) -> Option<f64> {
///         u32::try_from(peak.name.len()).ok().map(f64::from)
///     }
/// }
///
/// let peak = Peak::new(1, "Ortler", Point::new(10.54, 46.51));
/// assert_eq!(NameLength.fetch_raw_signal(&peak), Some(6.0));
/// ```
pub trait SignalSource: Send + Sync {
    /// Signal this source observes.
    fn signal(&self) -> Signal;

    /// Fetch the raw observation for `peak`, or `None` when unavailable.
    fn fetch_raw_signal(&self, peak: &Peak) -> Option<f64>;
}

/// Fill missing raw signals on every peak from `source`.
///
/// Peaks that already carry the signal, or whose input value was malformed,
/// are left untouched. Returns how many peaks received a value.
#[expect(
    clippy::cast_possible_truncation,
    reason = "page-view and pedestrian sources report whole counts"
)]
pub fn enrich(peaks: &mut Layer<Peak>, source: &dyn SignalSource) -> usize {
    let signal = source.signal();
    let mut filled = 0;
    for peak in peaks.features_mut() {
        if peak.signals.value(signal).is_some() || peak.malformed.contains(&signal) {
            continue;
        }
        let Some(value) = source.fetch_raw_signal(peak) else {
            log::debug!("no {signal} signal for peak {} ({})", peak.id, peak.name);
            continue;
        };
        match signal {
            Signal::PageViews => peak.signals.view_count = Some(value.round() as i64),
            Signal::RouteTraffic => peak.signals.route_traffic_rate = Some(value),
            Signal::Pedestrians => peak.signals.pedestrian_count = Some(value.round() as i64),
        }
        filled += 1;
    }
    log::info!("{signal} source filled {filled} of {} peaks", peaks.len());
    filled
}
