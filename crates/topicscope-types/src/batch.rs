use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-URL result of a batch prediction.
///
/// The success/failure union is carried by [`BatchOutcome`], so an item can
/// never hold both a topic and an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBatchItem", into = "RawBatchItem")]
pub struct BatchResultItem {
    pub url: String,
    pub outcome: BatchOutcome,
    pub from_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Predicted(String),
    Failed(String),
}

impl BatchResultItem {
    pub fn predicted(url: impl Into<String>, topic: impl Into<String>, from_cache: bool) -> Self {
        Self {
            url: url.into(),
            outcome: BatchOutcome::Predicted(topic.into()),
            from_cache,
        }
    }

    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: BatchOutcome::Failed(error.into()),
            from_cache: false,
        }
    }

    pub fn predicted_topic(&self) -> Option<&str> {
        match &self.outcome {
            BatchOutcome::Predicted(topic) => Some(topic),
            BatchOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            BatchOutcome::Predicted(_) => None,
            BatchOutcome::Failed(error) => Some(error),
        }
    }
}

/// Wire shape: `{url, predicted_topic?, error?, from_cache?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBatchItem {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    predicted_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default)]
    from_cache: bool,
}

impl TryFrom<RawBatchItem> for BatchResultItem {
    type Error = String;

    fn try_from(raw: RawBatchItem) -> Result<Self, Self::Error> {
        let outcome = match (raw.predicted_topic, raw.error) {
            (Some(topic), None) => BatchOutcome::Predicted(topic),
            (None, Some(error)) => BatchOutcome::Failed(error),
            (Some(_), Some(_)) => {
                return Err(format!(
                    "batch item for {} has both predicted_topic and error",
                    raw.url
                ))
            }
            (None, None) => {
                return Err(format!(
                    "batch item for {} has neither predicted_topic nor error",
                    raw.url
                ))
            }
        };

        Ok(Self {
            url: raw.url,
            outcome,
            from_cache: raw.from_cache,
        })
    }
}

impl From<BatchResultItem> for RawBatchItem {
    fn from(item: BatchResultItem) -> Self {
        let (predicted_topic, error) = match item.outcome {
            BatchOutcome::Predicted(topic) => (Some(topic), None),
            BatchOutcome::Failed(error) => (None, Some(error)),
        };
        Self {
            url: item.url,
            predicted_topic,
            error,
            from_cache: item.from_cache,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicGroup {
    pub topic: String,
    pub urls: Vec<String>,
}

/// Topic -> URLs grouping derived from one batch response.
///
/// Topics iterate in order of first appearance in the response; failed items
/// are excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicGroups {
    groups: Vec<TopicGroup>,
    index: HashMap<String, usize>,
}

impl TopicGroups {
    pub fn from_items(items: &[BatchResultItem]) -> Self {
        let mut grouped = Self::default();
        for item in items {
            if let Some(topic) = item.predicted_topic() {
                grouped.push(topic, &item.url);
            }
        }
        grouped
    }

    fn push(&mut self, topic: &str, url: &str) {
        match self.index.get(topic) {
            Some(&slot) => self.groups[slot].urls.push(url.to_string()),
            None => {
                self.index.insert(topic.to_string(), self.groups.len());
                self.groups.push(TopicGroup {
                    topic: topic.to_string(),
                    urls: vec![url.to_string()],
                });
            }
        }
    }

    pub fn get(&self, topic: &str) -> Option<&[String]> {
        self.index
            .get(topic)
            .map(|&slot| self.groups[slot].urls.as_slice())
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.topic.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TopicGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a> IntoIterator for &'a TopicGroups {
    type Item = &'a TopicGroup;
    type IntoIter = std::slice::Iter<'a, TopicGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
