mod common;

use common::{identity, Call, Gate, ScriptedBackend};
use std::sync::Arc;
use topicscope_gateway::{ErrorKind, GatewayError, SavedContent};
use topicscope_session::{Completion, PredictionSession, PredictionState};
use topicscope_types::PredictionResult;

#[tokio::test]
async fn test_submit_success_stores_result() {
    let backend = ScriptedBackend::new();
    backend.push_prediction(Ok(PredictionResult::new("Sports")
        .with_frequencies([("goal", 4)])
        .cached(true)));
    let session = PredictionSession::new(backend.clone(), identity());

    let completion = session.submit("http://a.com").await;

    let result = completion.applied().unwrap().unwrap();
    assert_eq!(result.topic, "Sports");
    let state = session.state().await;
    assert_eq!(state.result(), Some(&result));
    assert!(state.error().is_none());
    assert!(state.result().unwrap().from_cache);
    assert_eq!(backend.calls(), vec![Call::Predict("http://a.com".into())]);
    assert_eq!(backend.user_ids(), vec![Some("test-user".to_string())]);
}

#[tokio::test]
async fn test_empty_url_never_reaches_backend() {
    let backend = ScriptedBackend::new();
    let session = PredictionSession::new(backend.clone(), identity());

    let completion = session.submit("   ").await;

    let err = completion.applied().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(backend.calls().is_empty());
    assert_eq!(session.state().await.error().map(|e| e.kind()), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn test_implausible_url_never_reaches_backend() {
    let backend = ScriptedBackend::new();
    let session = PredictionSession::new(backend.clone(), identity());

    let err = session.submit("not-a-url").await.applied().unwrap().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_failure_discards_previous_result() {
    let backend = ScriptedBackend::new();
    backend.push_prediction(Ok(PredictionResult::new("Tech")));
    backend.push_prediction(Err(GatewayError::server("model missing")));
    let session = PredictionSession::new(backend.clone(), identity());

    session.submit("http://a.com").await;
    session.submit("http://b.com").await;

    let state = session.state().await;
    assert!(state.result().is_none());
    assert_eq!(state.error(), Some(&GatewayError::server("model missing")));
    assert_eq!(state.url(), Some("http://b.com"));
}

#[tokio::test]
async fn test_new_success_replaces_result_entirely() {
    let backend = ScriptedBackend::new();
    backend.push_prediction(Ok(PredictionResult::new("Tech").with_frequencies([("rust", 9)])));
    backend.push_prediction(Ok(PredictionResult::new("Sports")));
    let session = PredictionSession::new(backend.clone(), identity());

    session.submit("http://a.com").await;
    session.submit("http://b.com").await;

    let state = session.state().await;
    let result = state.result().unwrap();
    assert_eq!(result.topic, "Sports");
    assert!(result.word_frequencies.is_empty());
}

#[tokio::test]
async fn test_superseded_response_is_discarded() {
    let backend = ScriptedBackend::new();
    let gate = Gate::new();
    backend.push_gated_prediction(Ok(PredictionResult::new("Old")), gate.clone());
    backend.push_prediction(Ok(PredictionResult::new("New")));
    let session = Arc::new(PredictionSession::new(backend.clone(), identity()));

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit("http://old.com").await }
    });
    gate.wait_entered().await;
    assert!(session.state().await.is_submitting());

    let second = session.submit("http://new.com").await;
    gate.release();
    let first = first.await.unwrap();

    assert!(first.is_superseded());
    assert_eq!(second.applied().unwrap().unwrap().topic, "New");
    let state = session.state().await;
    assert_eq!(state.result().unwrap().topic, "New");
    assert_eq!(state.url(), Some("http://new.com"));
}

#[tokio::test]
async fn test_clear_resets_and_drops_in_flight_response() {
    let backend = ScriptedBackend::new();
    let gate = Gate::new();
    backend.push_gated_prediction(Ok(PredictionResult::new("Late")), gate.clone());
    let session = Arc::new(PredictionSession::new(backend.clone(), identity()));

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.submit("http://a.com").await }
    });
    gate.wait_entered().await;

    session.clear().await;
    gate.release();

    assert_eq!(pending.await.unwrap(), Completion::Superseded);
    assert_eq!(session.state().await, PredictionState::Idle);
}

#[tokio::test]
async fn test_save_content_writes_download() {
    let backend = ScriptedBackend::new();
    backend.push_prediction(Ok(PredictionResult::new("Tech")));
    backend.push_save(Ok(SavedContent {
        filename: "http_a.com.txt".to_string(),
        bytes: b"page text".to_vec(),
    }));
    let session = PredictionSession::new(backend.clone(), identity());
    let dir = tempfile::tempdir().unwrap();

    session.submit("http://a.com").await;
    let path = session.save_content(dir.path()).await.unwrap();

    assert_eq!(path, dir.path().join("http_a.com.txt"));
    assert_eq!(std::fs::read(&path).unwrap(), b"page text");
    assert_eq!(backend.calls()[1], Call::SaveContent("http://a.com".into()));
}

#[tokio::test]
async fn test_save_content_without_url_is_rejected() {
    let backend = ScriptedBackend::new();
    let session = PredictionSession::new(backend.clone(), identity());
    let dir = tempfile::tempdir().unwrap();

    let err = session.save_content(dir.path()).await.unwrap_err();

    let gateway = err.downcast_ref::<GatewayError>().unwrap();
    assert_eq!(gateway.kind(), ErrorKind::Validation);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_save_content_after_rejected_submit_never_reaches_backend() {
    let backend = ScriptedBackend::new();
    let session = PredictionSession::new(backend.clone(), identity());
    let dir = tempfile::tempdir().unwrap();

    session.submit("").await;
    let empty = session.save_content(dir.path()).await.unwrap_err();

    session.submit("not-a-url").await;
    let implausible = session.save_content(dir.path()).await.unwrap_err();

    for err in [empty, implausible] {
        let gateway = err.downcast_ref::<GatewayError>().unwrap();
        assert_eq!(gateway.kind(), ErrorKind::Validation);
    }
    assert!(backend.calls().is_empty());
}
