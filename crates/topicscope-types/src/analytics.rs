use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregate usage over a trailing window, as returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    #[serde(default)]
    pub topic_distribution: Vec<TopicCount>,
    #[serde(default)]
    pub daily_activity: Vec<DailyCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    #[serde(rename = "_id")]
    pub topic: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    #[serde(rename = "_id")]
    pub date: NaiveDate,
    pub count: u64,
}

/// A topic's share of all predictions in the window
#[derive(Debug, Clone, PartialEq)]
pub struct TopicShare {
    pub topic: String,
    pub count: u64,
    pub percentage: f64,
}

impl AnalyticsSummary {
    pub fn total_predictions(&self) -> u64 {
        self.topic_distribution.iter().map(|t| t.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_aggregation_output() {
        let json = r#"{
            "topic_distribution": [{"_id": "Sports", "count": 3}, {"_id": "Tech", "count": 1}],
            "daily_activity": [{"_id": "2024-03-02", "count": 2}, {"_id": "2024-03-01", "count": 2}]
        }"#;
        let summary: AnalyticsSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.total_predictions(), 4);
        assert_eq!(
            summary.daily_activity[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }
}
