mod common;

use chrono::{Days, Utc};
use common::{identity, Call, ScriptedBackend};
use topicscope_gateway::{ErrorKind, GatewayError};
use topicscope_session::{AnalyticsAggregator, AnalyticsState};
use topicscope_types::{AnalyticsSummary, DailyCount, TopicCount};

#[tokio::test]
async fn test_load_and_reshape() {
    let today = Utc::now().date_naive();
    let backend = ScriptedBackend::new();
    backend.push_analytics(Ok(AnalyticsSummary {
        topic_distribution: vec![
            TopicCount { topic: "Tech".into(), count: 1 },
            TopicCount { topic: "Sports".into(), count: 1 },
        ],
        daily_activity: vec![
            DailyCount { date: today, count: 1 },
            DailyCount { date: today.checked_sub_days(Days::new(2)).unwrap(), count: 1 },
        ],
    }));
    let aggregator = AnalyticsAggregator::new(backend.clone(), identity()).with_days(3);

    let summary = aggregator.load().await.applied().unwrap().unwrap();

    assert_eq!(summary.total_predictions(), 2);
    assert_eq!(backend.calls(), vec![Call::FetchAnalytics(3)]);

    let shares = aggregator.topic_shares().await;
    assert_eq!(shares.len(), 2);
    assert!(shares.iter().all(|s| (s.percentage - 50.0).abs() < f64::EPSILON));

    let series = aggregator.activity_series().await;
    let counts: Vec<u64> = series.iter().map(|d| d.count).collect();
    assert_eq!(counts, vec![1, 0, 1]);
    assert_eq!(series.last().unwrap().date, today);
}

#[tokio::test]
async fn test_empty_summary_reports_nothing() {
    let backend = ScriptedBackend::new();
    backend.push_analytics(Ok(AnalyticsSummary::default()));
    let aggregator = AnalyticsAggregator::new(backend.clone(), identity());

    aggregator.load().await;

    assert!(aggregator.topic_shares().await.is_empty());
    let series = aggregator.activity_series().await;
    assert_eq!(series.len(), 7);
    assert!(series.iter().all(|d| d.count == 0));
}

#[tokio::test]
async fn test_failure_sets_failed_state() {
    let backend = ScriptedBackend::new();
    backend.push_analytics(Err(GatewayError::server("aggregation failed")));
    let aggregator = AnalyticsAggregator::new(backend.clone(), identity());

    let err = aggregator.load().await.applied().unwrap().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert!(matches!(aggregator.state().await, AnalyticsState::Failed(_)));
    assert!(aggregator.topic_shares().await.is_empty());
    assert!(aggregator.activity_series().await.is_empty());
}
