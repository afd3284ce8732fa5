use serde::Deserialize;
use serde::Serialize;

use std::sync::Arc;

/// A single logged study session as it is stored in the remote table. The table might carry
/// additional columns (surrogate keys, timestamps), those are ignored during deserialization.
#[derive(PartialEq, PartialOrd, Debug, Serialize, Deserialize, Clone)]
pub struct StudyRecord {
    pub title: Arc<str>,
    /// Duration in hours.
    pub time: f64,
}

impl StudyRecord {
    pub fn new(title: impl Into<Arc<str>>, time: f64) -> Self {
        Self {
            title: title.into(),
            time,
        }
    }

    /// Records have no identity of their own in the remote table, two records are treated as the
    /// same one when both title and time are equal.
    pub fn matches(&self, title: &str, time: f64) -> bool {
        &*self.title == title && self.time == time
    }
}

/// Sums durations of the provided records.
pub fn total_time<'a>(records: impl IntoIterator<Item = &'a StudyRecord>) -> f64 {
    records.into_iter().map(|v| v.time).sum()
}

#[cfg(test)]
mod tests {
    use super::{total_time, StudyRecord};

    #[test]
    fn test_deserialize_ignores_store_columns() {
        let row = r#"{"id": 7, "title": "Math", "time": 3, "created_at": "2024-01-01T00:00:00Z"}"#;
        let record: StudyRecord = serde_json::from_str(row).unwrap();
        assert_eq!(record, StudyRecord::new("Math", 3.));
    }

    #[test]
    fn test_matches_requires_both_fields() {
        let record = StudyRecord::new("Math", 3.);
        assert!(record.matches("Math", 3.));
        assert!(!record.matches("Math", 3.5));
        assert!(!record.matches("Physics", 3.));
    }

    #[test]
    fn test_total_time() {
        let records = [StudyRecord::new("A", 2.), StudyRecord::new("B", 3.)];
        assert_eq!(total_time(&records), 5.);
        assert_eq!(total_time(std::iter::empty()), 0.);
    }
}
