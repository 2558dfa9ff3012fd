use crate::sequence::{Completion, Sequenced};
use chrono::{Days, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use topicscope_gateway::{Backend, GatewayError};
use topicscope_types::{AnalyticsSummary, DailyCount, Identity, TopicShare};

/// Trailing window the backend aggregates over unless told otherwise
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnalyticsState {
    #[default]
    Idle,
    Loading,
    Loaded(AnalyticsSummary),
    Failed(GatewayError),
}

impl AnalyticsState {
    pub fn summary(&self) -> Option<&AnalyticsSummary> {
        match self {
            Self::Loaded(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Fetches usage summaries and reshapes them for display
pub struct AnalyticsAggregator {
    backend: Arc<dyn Backend>,
    identity: Identity,
    days: u32,
    inner: RwLock<Sequenced<AnalyticsState>>,
}

impl AnalyticsAggregator {
    pub fn new(backend: Arc<dyn Backend>, identity: Identity) -> Self {
        Self {
            backend,
            identity,
            days: DEFAULT_WINDOW_DAYS,
            inner: RwLock::new(Sequenced::new(AnalyticsState::Idle)),
        }
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days.max(1);
        self
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub async fn state(&self) -> AnalyticsState {
        self.inner.read().await.state().clone()
    }

    pub async fn load(&self) -> Completion<Result<AnalyticsSummary, GatewayError>> {
        let ticket = self.inner.write().await.begin(AnalyticsState::Loading);

        let outcome = self
            .backend
            .fetch_analytics(Some(&self.identity), self.days)
            .await;

        let next = match &outcome {
            Ok(summary) => AnalyticsState::Loaded(summary.clone()),
            Err(error) => AnalyticsState::Failed(error.clone()),
        };

        if self.inner.write().await.settle(ticket, next) {
            Completion::Applied(outcome)
        } else {
            Completion::Superseded
        }
    }

    /// Topic shares of the loaded summary, empty until one is loaded
    pub async fn topic_shares(&self) -> Vec<TopicShare> {
        self.state()
            .await
            .summary()
            .map(topic_shares)
            .unwrap_or_default()
    }

    /// Contiguous activity series ending today (UTC)
    pub async fn activity_series(&self) -> Vec<DailyCount> {
        let today = Utc::now().date_naive();
        self.state()
            .await
            .summary()
            .map(|summary| activity_series(summary, today, self.days))
            .unwrap_or_default()
    }
}

/// Percentage of all predictions per topic, in the summary's order.
/// A zero total reports 0% for every topic.
pub fn topic_shares(summary: &AnalyticsSummary) -> Vec<TopicShare> {
    let total = summary.total_predictions();
    summary
        .topic_distribution
        .iter()
        .map(|entry| TopicShare {
            topic: entry.topic.clone(),
            count: entry.count,
            percentage: if total == 0 {
                0.0
            } else {
                entry.count as f64 * 100.0 / total as f64
            },
        })
        .collect()
}

/// Date-ascending series of exactly `days` entries ending at `end`.
///
/// The backend only reports days that had predictions, so missing days are
/// filled with zero counts. Days outside the window are dropped.
pub fn activity_series(summary: &AnalyticsSummary, end: NaiveDate, days: u32) -> Vec<DailyCount> {
    let counts: HashMap<NaiveDate, u64> = summary
        .daily_activity
        .iter()
        .fold(HashMap::new(), |mut acc, day| {
            *acc.entry(day.date).or_insert(0) += day.count;
            acc
        });

    (0..days)
        .rev()
        .filter_map(|back| end.checked_sub_days(Days::new(back.into())))
        .map(|date| DailyCount {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}
