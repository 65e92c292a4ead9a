//! Dispatcher-level tests: cache path selection, fragment ordering,
//! completion handoff, cancellation and failure handling.

use futures::stream::{self, StreamExt};
use pocket_engine::{EngineError, FragmentStream, GenerationEngine, MockEngine};
use pocket_server::*;
use pocket_store::{MemoryStore, MessageStore, Role};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    dispatcher: Dispatcher,
    store: Arc<MemoryStore>,
}

fn harness_with(engine: Arc<dyn GenerationEngine>, config: ServerConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let writer = PersistenceWriter::spawn(store.clone());
    Harness {
        dispatcher: Dispatcher::new(engine, writer, &config),
        store,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(MockEngine::instant()), ServerConfig::default())
}

fn request(prompt: &str, session_id: &str, max_tokens: i64, temperature: f64) -> GenerationRequest {
    GenerationRequest {
        prompt: prompt.to_string(),
        max_tokens,
        temperature,
        session_id: session_id.to_string(),
    }
}

async fn run(dispatcher: &Dispatcher, req: GenerationRequest) -> Vec<StreamEvent> {
    dispatcher
        .dispatch(req)
        .expect("slot available")
        .map(|item| item.expect("engine ok"))
        .collect()
        .await
}

async fn history(h: &Harness, session_id: &str) -> Vec<(Role, String)> {
    h.dispatcher.writer().flush().await;
    h.store
        .read_history(session_id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.role, m.content))
        .collect()
}

/// Emits one fragment, then fails.
struct FailingEngine;

impl GenerationEngine for FailingEngine {
    fn generate(&self, _prompt: &str, _max_tokens: usize) -> FragmentStream {
        stream::iter(vec![
            Ok("partial ".to_string()),
            Err(EngineError::Generation("decoder crashed".to_string())),
        ])
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Hit / miss paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_request_misses_then_hits() {
    let h = harness();

    let events = run(&h.dispatcher, request("hi", "s1", 500, 2.5)).await;
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| !e.cached));
    let snapshot = h.dispatcher.metrics().snapshot();
    assert_eq!(snapshot.cache_misses, 1);
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.cache_hits, 0);

    let assembled: String = events.iter().map(|e| e.token.as_str()).collect();
    assert_eq!(
        history(&h, "s1").await,
        vec![
            (Role::User, "hi".to_string()),
            (Role::Assistant, assembled.clone()),
        ]
    );

    let replay = run(&h.dispatcher, request("hi", "s1", 500, 2.5)).await;
    assert_eq!(replay, vec![StreamEvent::replay(assembled)]);
    let snapshot = h.dispatcher.metrics().snapshot();
    assert_eq!(snapshot.cache_hits, 1);
    assert_eq!(snapshot.total_requests, 2);

    // Hits are not persisted by default.
    assert_eq!(history(&h, "s1").await.len(), 2);
}

#[tokio::test]
async fn miss_tokens_concatenate_to_cached_text() {
    let h = harness();
    let events = run(&h.dispatcher, request("ordering", "s1", 200, 0.7)).await;
    let assembled: String = events.iter().map(|e| e.token.as_str()).collect();

    let key = derive_key("ordering", &normalize(200, 0.7));
    assert_eq!(h.dispatcher.cache().lookup(&key), Some(assembled));
}

#[tokio::test]
async fn equivalent_parameters_share_a_cache_entry() {
    let h = harness();
    run(&h.dispatcher, request("hi", "s1", 500, 2.5)).await;
    let replay = run(&h.dispatcher, request("hi", "s2", 200, 1.0)).await;
    assert_eq!(replay.len(), 1);
    assert!(replay[0].cached);
}

#[tokio::test]
async fn different_parameters_miss() {
    let h = harness();
    run(&h.dispatcher, request("hi", "s1", 100, 0.7)).await;
    let events = run(&h.dispatcher, request("hi", "s1", 100, 0.2)).await;
    assert!(events.iter().all(|e| !e.cached));
    assert_eq!(h.dispatcher.cache().len(), 2);
}

#[tokio::test]
async fn token_budget_limits_fragments() {
    let h = harness();
    let events = run(&h.dispatcher, request("hi", "s1", 3, 0.7)).await;
    assert_eq!(events.len(), 3);

    let events = run(&h.dispatcher, request("zero", "s1", -5, 0.7)).await;
    assert!(events.is_empty());
    let key = derive_key("zero", &normalize(0, 0.7));
    assert_eq!(h.dispatcher.cache().lookup(&key).as_deref(), Some(""));
}

#[tokio::test]
async fn counters_track_hits_and_misses() {
    let h = harness();
    let prompts = ["a", "b", "a", "c", "b", "a"];
    for prompt in prompts {
        run(&h.dispatcher, request(prompt, "s1", 10, 0.5)).await;
    }
    let snapshot = h.dispatcher.metrics().snapshot();
    assert_eq!(snapshot.total_requests, 6);
    assert_eq!(snapshot.cache_misses, 3);
    assert_eq!(snapshot.cache_hits, 3);
}

#[tokio::test]
async fn persisting_cache_hits_when_enabled() {
    let h = harness_with(
        Arc::new(MockEngine::instant()),
        ServerConfig::default().with_persist_cache_hits(true),
    );
    let events = run(&h.dispatcher, request("hi", "s1", 10, 0.5)).await;
    let assembled: String = events.iter().map(|e| e.token.as_str()).collect();
    run(&h.dispatcher, request("hi", "s2", 10, 0.5)).await;

    assert_eq!(
        history(&h, "s2").await,
        vec![(Role::User, "hi".to_string()), (Role::Assistant, assembled)]
    );
}

// ---------------------------------------------------------------------------
// Ordering of side effects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prompt_saved_before_first_fragment() {
    let h = harness();
    let mut events = h.dispatcher.dispatch(request("early", "s1", 10, 0.5)).unwrap();

    // Nothing has been polled yet, but the prompt is already queued.
    assert_eq!(
        history(&h, "s1").await,
        vec![(Role::User, "early".to_string())]
    );
    assert!(events.next().await.is_some());
}

#[tokio::test]
async fn completion_runs_after_last_fragment() {
    let h = harness();
    let mut events = h.dispatcher.dispatch(request("hi", "s1", 4, 0.5)).unwrap();
    for _ in 0..4 {
        assert!(events.next().await.is_some());
    }
    // All fragments delivered; bookkeeping happens on the closing poll.
    assert!(h.dispatcher.cache().is_empty());
    assert!(events.next().await.is_none());
    assert_eq!(h.dispatcher.cache().len(), 1);
}

// ---------------------------------------------------------------------------
// Cancellation and failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dropped_stream_skips_cache_and_answer() {
    let h = harness();
    let mut events = h.dispatcher.dispatch(request("hi", "s1", 200, 0.5)).unwrap();
    assert!(events.next().await.is_some());
    assert!(events.next().await.is_some());
    assert_eq!(h.dispatcher.slots().active_count(), 1);
    drop(events);

    assert!(h.dispatcher.cache().is_empty());
    assert_eq!(h.dispatcher.slots().active_count(), 0);
    assert_eq!(
        history(&h, "s1").await,
        vec![(Role::User, "hi".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_all_stops_running_streams() {
    let h = harness_with(
        Arc::new(MockEngine::with_delay(Duration::from_millis(100))),
        ServerConfig::default(),
    );
    let mut events = h.dispatcher.dispatch(request("hi", "s1", 200, 0.5)).unwrap();
    assert!(events.next().await.is_some());

    h.dispatcher.slots().cancel_all();
    assert!(events.next().await.is_none());
    assert!(h.dispatcher.cache().is_empty());
}

#[tokio::test]
async fn engine_failure_ends_stream_with_error() {
    let h = harness_with(Arc::new(FailingEngine), ServerConfig::default());
    let items: Vec<_> = h
        .dispatcher
        .dispatch(request("hi", "s1", 10, 0.5))
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0].as_ref().unwrap(),
        &StreamEvent::fragment("partial ".to_string())
    );
    assert!(matches!(items[1], Err(EngineError::Generation(_))));

    assert!(h.dispatcher.cache().is_empty());
    assert_eq!(
        history(&h, "s1").await,
        vec![(Role::User, "hi".to_string())]
    );
    assert_eq!(h.dispatcher.slots().active_count(), 0);
}

#[tokio::test]
async fn misses_rejected_at_capacity_but_hits_served() {
    let h = harness_with(
        Arc::new(MockEngine::instant()),
        ServerConfig::default().with_max_concurrent_streams(1),
    );
    let key = derive_key("cached", &normalize(10, 0.5));
    h.dispatcher.cache().insert(key, "from cache".to_string());

    let _running = h.dispatcher.dispatch(request("a", "s1", 10, 0.5)).unwrap();
    let rejected = h.dispatcher.dispatch(request("b", "s2", 10, 0.5));
    assert!(matches!(rejected, Err(DispatchError::AtCapacity(1))));

    let replay = run(&h.dispatcher, request("cached", "s3", 10, 0.5)).await;
    assert_eq!(replay, vec![StreamEvent::replay("from cache".to_string())]);

    let snapshot = h.dispatcher.metrics().snapshot();
    assert_eq!(snapshot.total_requests, 3);
    assert_eq!(snapshot.cache_misses, 2);
    assert_eq!(snapshot.cache_hits, 1);

    // The rejected request never reached the store.
    assert!(history(&h, "s2").await.is_empty());
}

#[tokio::test]
async fn concurrent_identical_misses_both_complete() {
    let h = harness();
    let first = h.dispatcher.dispatch(request("twin", "s1", 10, 0.5)).unwrap();
    let second = h.dispatcher.dispatch(request("twin", "s2", 10, 0.5)).unwrap();

    let (a, b) = tokio::join!(first.collect::<Vec<_>>(), second.collect::<Vec<_>>());
    assert_eq!(a.len(), b.len());

    let snapshot = h.dispatcher.metrics().snapshot();
    assert_eq!(snapshot.cache_misses, 2);
    assert_eq!(h.dispatcher.cache().len(), 1);
    assert_eq!(history(&h, "s1").await.len(), 2);
    assert_eq!(history(&h, "s2").await.len(), 2);
}
