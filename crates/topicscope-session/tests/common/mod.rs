//! In-memory stand-in for the classification backend

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use topicscope_gateway::{
    Backend, BatchResponse, GatewayError, Result, RetrainOutcome, SavedContent,
};
use topicscope_types::{AnalyticsSummary, HistoryEntry, Identity, PredictionResult, UploadFile};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Predict(String),
    BatchPredict(String),
    SaveContent(String),
    Retrain(Vec<String>),
    FetchHistory(usize),
    FetchAnalytics(u32),
    Delete(String),
}

/// Holds one scripted call open until the test releases it
#[derive(Clone, Default)]
pub struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once the gated call has reached the backend
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

async fn pass(gate: Option<Gate>) {
    if let Some(gate) = gate {
        gate.pass().await;
    }
}

struct Scripted<T> {
    response: Result<T>,
    gate: Option<Gate>,
}

impl<T> Scripted<T> {
    fn open(response: Result<T>) -> Self {
        Self { response, gate: None }
    }
}

/// Records every call and answers from scripted queues.
///
/// History and deletes behave like a tiny server: deleting an id removes it
/// from the stored list, and deleting it again reports "not found".
#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<(Call, Option<String>)>>,
    predictions: Mutex<VecDeque<Scripted<PredictionResult>>>,
    batches: Mutex<VecDeque<Scripted<BatchResponse>>>,
    saves: Mutex<VecDeque<Result<SavedContent>>>,
    retrains: Mutex<VecDeque<Scripted<RetrainOutcome>>>,
    analytics: Mutex<VecDeque<Result<AnalyticsSummary>>>,
    history: Mutex<Vec<HistoryEntry>>,
    history_failures: Mutex<VecDeque<GatewayError>>,
    history_gates: Mutex<VecDeque<Gate>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_prediction(&self, response: Result<PredictionResult>) {
        self.predictions.lock().unwrap().push_back(Scripted::open(response));
    }

    /// Queue a prediction that is only answered once `gate` is released
    pub fn push_gated_prediction(&self, response: Result<PredictionResult>, gate: Gate) {
        self.predictions
            .lock()
            .unwrap()
            .push_back(Scripted { response, gate: Some(gate) });
    }

    pub fn push_batch(&self, response: Result<BatchResponse>) {
        self.batches.lock().unwrap().push_back(Scripted::open(response));
    }

    pub fn push_gated_batch(&self, response: Result<BatchResponse>, gate: Gate) {
        self.batches
            .lock()
            .unwrap()
            .push_back(Scripted { response, gate: Some(gate) });
    }

    pub fn push_save(&self, response: Result<SavedContent>) {
        self.saves.lock().unwrap().push_back(response);
    }

    pub fn push_retrain(&self, response: Result<RetrainOutcome>) {
        self.retrains.lock().unwrap().push_back(Scripted::open(response));
    }

    pub fn push_gated_retrain(&self, response: Result<RetrainOutcome>, gate: Gate) {
        self.retrains
            .lock()
            .unwrap()
            .push_back(Scripted { response, gate: Some(gate) });
    }

    pub fn push_analytics(&self, response: Result<AnalyticsSummary>) {
        self.analytics.lock().unwrap().push_back(response);
    }

    pub fn fail_next_history(&self, error: GatewayError) {
        self.history_failures.lock().unwrap().push_back(error);
    }

    /// Hold the next history fetch open; it answers with the list as it was
    /// when the fetch arrived
    pub fn gate_next_history(&self, gate: Gate) {
        self.history_gates.lock().unwrap().push_back(gate);
    }

    pub fn set_history(&self, entries: Vec<HistoryEntry>) {
        *self.history.lock().unwrap() = entries;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn user_ids(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().iter().map(|(_, u)| u.clone()).collect()
    }

    fn record(&self, call: Call, identity: Option<&Identity>) {
        self.calls
            .lock()
            .unwrap()
            .push((call, identity.map(|i| i.as_str().to_string())));
    }
}

fn unscripted(operation: &str) -> GatewayError {
    GatewayError::Unknown(format!("no scripted response for {}", operation))
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn predict(&self, url: &str, identity: Option<&Identity>) -> Result<PredictionResult> {
        self.record(Call::Predict(url.to_string()), identity);
        let scripted = self.predictions.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            return Err(unscripted("predict"));
        };
        pass(scripted.gate).await;
        scripted.response
    }

    async fn batch_predict(
        &self,
        file: &UploadFile,
        identity: Option<&Identity>,
    ) -> Result<BatchResponse> {
        self.record(Call::BatchPredict(file.name.clone()), identity);
        let scripted = self.batches.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            return Err(unscripted("batch_predict"));
        };
        pass(scripted.gate).await;
        scripted.response
    }

    async fn save_content(&self, url: &str, identity: Option<&Identity>) -> Result<SavedContent> {
        self.record(Call::SaveContent(url.to_string()), identity);
        let next = self.saves.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted("save_content")))
    }

    async fn retrain(&self, urls: &[String], identity: Option<&Identity>) -> Result<RetrainOutcome> {
        self.record(Call::Retrain(urls.to_vec()), identity);
        let scripted = self.retrains.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            return Ok(RetrainOutcome {
                message: "Model retrained".to_string(),
            });
        };
        pass(scripted.gate).await;
        scripted.response
    }

    async fn fetch_history(
        &self,
        identity: Option<&Identity>,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>> {
        self.record(Call::FetchHistory(limit), identity);
        if let Some(error) = self.history_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        let snapshot: Vec<HistoryEntry> =
            self.history.lock().unwrap().iter().take(limit).cloned().collect();
        let gate = self.history_gates.lock().unwrap().pop_front();
        pass(gate).await;
        Ok(snapshot)
    }

    async fn fetch_analytics(
        &self,
        identity: Option<&Identity>,
        days: u32,
    ) -> Result<AnalyticsSummary> {
        self.record(Call::FetchAnalytics(days), identity);
        let next = self.analytics.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted("fetch_analytics")))
    }

    async fn delete_history_entry(
        &self,
        entry_id: &str,
        identity: Option<&Identity>,
    ) -> Result<String> {
        self.record(Call::Delete(entry_id.to_string()), identity);
        let mut history = self.history.lock().unwrap();
        match history.iter().position(|e| e.id == entry_id) {
            Some(pos) => {
                history.remove(pos);
                Ok("Entry deleted".to_string())
            }
            None => Err(GatewayError::validation("Entry not found")),
        }
    }
}

pub fn identity() -> Identity {
    Identity::from("test-user")
}

pub fn entry(id: &str, url: &str, prediction: &str, minute: u32) -> HistoryEntry {
    HistoryEntry::new(
        id,
        url,
        prediction,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap(),
    )
}
