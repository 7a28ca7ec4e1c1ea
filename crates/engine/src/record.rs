// ABOUTME: EventRecord struct holding one extracted event with sentinel-filled fields.
// ABOUTME: Field order is fixed; records own their strings and keep no tree references.

use serde::{Deserialize, Serialize};

/// Value of any field that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

/// Default label for a date that carried no explicit clock time.
pub const TIME_UNAVAILABLE: &str = "Open link for time";

/// Column names in output order.
pub const COLUMNS: [&str; 11] = [
    "title",
    "url",
    "date",
    "time",
    "end_time",
    "image_url",
    "location",
    "recurrence",
    "category",
    "details",
    "source_id",
];

/// One event extracted from one item node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub url: String,
    /// `MM-DD`.
    pub date: String,
    /// `hh:mm AM/PM`, the time-unavailable label, or `N/A`.
    pub time: String,
    pub end_time: String,
    pub image_url: String,
    pub location: String,
    pub recurrence: String,
    pub category: Vec<String>,
    pub details: String,
    pub source_id: String,
}

impl EventRecord {
    /// A record with every field set to the sentinel.
    pub fn empty(source_id: impl Into<String>) -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            url: NOT_AVAILABLE.to_string(),
            date: NOT_AVAILABLE.to_string(),
            time: NOT_AVAILABLE.to_string(),
            end_time: NOT_AVAILABLE.to_string(),
            image_url: NOT_AVAILABLE.to_string(),
            location: NOT_AVAILABLE.to_string(),
            recurrence: NOT_AVAILABLE.to_string(),
            category: vec![NOT_AVAILABLE.to_string()],
            details: NOT_AVAILABLE.to_string(),
            source_id: source_id.into(),
        }
    }

    /// Field values in [`COLUMNS`] order; categories are joined with `", "`.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.url.clone(),
            self.date.clone(),
            self.time.clone(),
            self.end_time.clone(),
            self.image_url.clone(),
            self.location.clone(),
            self.recurrence.clone(),
            self.category.join(", "),
            self.details.clone(),
            self.source_id.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_is_all_sentinels() {
        let record = EventRecord::empty("pulse");
        assert_eq!(record.source_id, "pulse");
        assert_eq!(record.url, NOT_AVAILABLE);
        assert_eq!(record.image_url, NOT_AVAILABLE);
        assert_eq!(record.date, NOT_AVAILABLE);
        assert_eq!(record.category, vec![NOT_AVAILABLE]);
        assert!(record.to_row()[..10].iter().all(|v| v == NOT_AVAILABLE));
    }

    #[test]
    fn row_matches_column_order() {
        let mut record = EventRecord::empty("cha-guide");
        record.title = "Jazz Night".to_string();
        record.category = vec!["Music".to_string(), "Nightlife".to_string()];
        let row = record.to_row();
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[0], "Jazz Night");
        assert_eq!(row[8], "Music, Nightlife");
        assert_eq!(row[10], "cha-guide");
    }

    #[test]
    fn json_keeps_field_order() {
        let json = serde_json::to_string(&EventRecord::empty("x")).expect("serialize");
        let positions: Vec<usize> = COLUMNS
            .iter()
            .map(|c| json.find(&format!("\"{}\"", c)).expect("column present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
