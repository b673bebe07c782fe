//! Response types for the Wikimedia per-article page-view API.
//!
//! See: <https://doc.wikimedia.org/generated-data-platform/aqs/analytics-api/reference/page-views.html>

use serde::Deserialize;

/// Daily page-view series for one article.
#[derive(Debug, Deserialize)]
pub struct PageviewResponse {
    /// One entry per day in the requested range.
    #[serde(default)]
    pub items: Vec<PageviewItem>,
}

/// Views recorded for one article on one day.
#[derive(Debug, Deserialize)]
pub struct PageviewItem {
    /// Views on the day.
    pub views: u64,
}

impl PageviewResponse {
    /// Total views across the series, or `None` for an empty series.
    #[must_use]
    pub fn total_views(&self) -> Option<u64> {
        if self.items.is_empty() {
            return None;
        }
        Some(
            self.items
                .iter()
                .map(|item| item.views)
                .fold(0, u64::saturating_add),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_daily_views() {
        let json = r#"{
            "items": [
                {"project": "de.wikipedia", "article": "Serles", "timestamp": "2025010100", "views": 40},
                {"project": "de.wikipedia", "article": "Serles", "timestamp": "2025010200", "views": 2}
            ]
        }"#;

        let response: PageviewResponse = serde_json::from_str(json).expect("should deserialise");

        assert_eq!(response.total_views(), Some(42));
    }

    #[test]
    fn empty_series_has_no_total() {
        let response: PageviewResponse =
            serde_json::from_str(r#"{"items": []}"#).expect("should deserialise");

        assert_eq!(response.total_views(), None);
    }

    #[test]
    fn missing_items_deserialise_as_empty() {
        let response: PageviewResponse = serde_json::from_str("{}").expect("should deserialise");

        assert!(response.items.is_empty());
    }
}
