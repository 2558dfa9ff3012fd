use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A past prediction as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub url: String,
    pub prediction: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl HistoryEntry {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        prediction: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            prediction: prediction.into(),
            timestamp,
            batch_id: None,
        }
    }

    /// Case-insensitive substring match against the URL or the predicted topic.
    ///
    /// `needle` must already be lowercased; an empty needle matches everything.
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.url.to_lowercase().contains(needle)
            || self.prediction.to_lowercase().contains(needle)
    }
}

// The backend emits naive ISO-8601 timestamps (no offset); those are UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}
