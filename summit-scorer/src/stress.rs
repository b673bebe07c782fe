/// Stress score: aggregate popularity minus protection threshold.
///
/// Defined only when both operands are. The difference is not clamped, so
/// unusual weights or thresholds show through unchanged.
///
/// # Examples
///
/// ```
/// use summit_scorer::score;
///
/// assert_eq!(score(Some(1.0), Some(0.9)).map(|s| (s * 10.0).round()), Some(1.0));
/// assert_eq!(score(None, Some(0.9)), None);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the score is a plain difference"
)]
pub fn score(aggregate_popularity: Option<f64>, protection_threshold: Option<f64>) -> Option<f64> {
    Some(aggregate_popularity? - protection_threshold?)
}
