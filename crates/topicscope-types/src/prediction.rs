use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a single-URL prediction.
///
/// Replaced wholesale by the next prediction; never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(rename = "predicted_topic")]
    pub topic: String,
    #[serde(default)]
    pub word_frequencies: BTreeMap<String, u64>,
    #[serde(default)]
    pub from_cache: bool,
}

/// One entry of a word-frequency ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

impl PredictionResult {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            word_frequencies: BTreeMap::new(),
            from_cache: false,
        }
    }

    pub fn with_frequencies<I, S>(mut self, frequencies: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        self.word_frequencies = frequencies
            .into_iter()
            .map(|(word, count)| (word.into(), count))
            .collect();
        self
    }

    pub fn cached(mut self, from_cache: bool) -> Self {
        self.from_cache = from_cache;
        self
    }

    /// The `n` most frequent words, highest count first, ties broken alphabetically
    pub fn top_words(&self, n: usize) -> Vec<WordCount> {
        let mut words: Vec<WordCount> = self
            .word_frequencies
            .iter()
            .map(|(word, count)| WordCount {
                word: word.clone(),
                count: *count,
            })
            .collect();
        words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
        words.truncate(n);
        words
    }
}
