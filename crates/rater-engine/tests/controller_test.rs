//! Run completion: delivery followed by the conditional fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use rater_artifact::{ArtifactLocation, MemoryStore, Store};
use rater_config::{DeliveryConfig, DeliveryMode, FallbackConfig};
use rater_delivery::{
  Confirmation, DeliveryError, DeliveryOrchestrator, DeliveryOutcome, FallbackWriter, Transport,
  TransportError, TransportResponse,
};
use rater_engine::{ChannelNotifier, RunCompletionController, RunEvent, RunSnapshot, TrialBuffer};
use rater_record::{FixedAmbient, TrialRecord};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Clone)]
struct CountingTransport {
  calls: Arc<AtomicUsize>,
  fail: bool,
  delay: Option<Duration>,
}

impl CountingTransport {
  fn ok() -> Self {
    Self {
      calls: Arc::new(AtomicUsize::new(0)),
      fail: false,
      delay: None,
    }
  }

  fn unreachable() -> Self {
    Self {
      fail: true,
      ..Self::ok()
    }
  }

  fn slow() -> Self {
    Self {
      delay: Some(Duration::from_secs(30)),
      ..Self::ok()
    }
  }

  fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Transport for CountingTransport {
  async fn send(&self, _endpoint: &Url, _body: Bytes) -> Result<TransportResponse, TransportError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    if self.fail {
      return Err(TransportError::Connection {
        message: "network unreachable".to_string(),
      });
    }
    Ok(TransportResponse::opaque())
  }
}

/// Store handle that lets the test inspect what the controller wrote.
#[derive(Clone, Default)]
struct SharedStore(Arc<MemoryStore>);

#[async_trait]
impl Store for SharedStore {
  async fn get(&self, key: &str) -> Result<Bytes, rater_artifact::Error> {
    self.0.get(key).await
  }

  async fn put(
    &self,
    key: &str,
    data: Bytes,
    content_type: &str,
  ) -> Result<ArtifactLocation, rater_artifact::Error> {
    self.0.put(key, data, content_type).await
  }

  async fn delete(&self, key: &str) -> Result<(), rater_artifact::Error> {
    self.0.delete(key).await
  }
}

const ENDPOINT: &str = "https://script.example.com/macros/s/abc/exec";

fn scenario_records() -> Vec<TrialRecord> {
  serde_json::from_value(serde_json::json!([
    {
      "trial_index": 0, "task": "rating", "stimulus": "a.wav", "response_value": 5,
      "elapsed_time": 1200, "timestamp": "2024-01-01T00:00:00Z"
    },
    {
      "trial_index": 1, "task": "rating", "stimulus": "b.wav", "response_value": 2,
      "elapsed_time": 2400, "timestamp": "2024-01-01T00:00:05Z"
    }
  ]))
  .expect("records should deserialize")
}

fn controller(
  endpoint: &str,
  transport: CountingTransport,
  store: SharedStore,
) -> (
  RunCompletionController<CountingTransport, SharedStore, ChannelNotifier>,
  mpsc::UnboundedReceiver<RunEvent>,
) {
  let orchestrator = DeliveryOrchestrator::new(
    DeliveryConfig {
      endpoint: endpoint.to_string(),
      mode: DeliveryMode::FireAndForget,
      timeout_ms: Some(50),
      ..Default::default()
    },
    transport,
  );
  let fallback = FallbackWriter::new(store, FallbackConfig::default());
  let (tx, rx) = mpsc::unbounded_channel();
  let ambient = FixedAmbient::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 9).unwrap(), "test-agent");

  let controller = RunCompletionController::new(orchestrator, fallback)
    .notify_with(ChannelNotifier::new(tx))
    .with_ambient(Arc::new(ambient));
  (controller, rx)
}

fn drain(mut rx: mpsc::UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

#[tokio::test]
async fn test_empty_endpoint_writes_fallback_without_network() {
  let transport = CountingTransport::ok();
  let store = SharedStore::default();
  let (controller, rx) = controller("", transport.clone(), store.clone());
  let snapshot = RunSnapshot::from_records("run-a", scenario_records()).unwrap();

  let completion = controller
    .complete(snapshot, CancellationToken::new())
    .await
    .expect("run should complete");

  assert_eq!(transport.calls(), 0);
  assert!(matches!(
    completion.outcome.error(),
    Some(DeliveryError::Configuration { .. })
  ));

  let handle = completion.fallback.expect("fallback should be written");
  assert_eq!(handle.rows, 2);

  let csv = store.0.get(&handle.key).await.unwrap();
  let text = String::from_utf8(csv.to_vec()).unwrap();
  let lines: Vec<&str> = text.lines().collect();
  assert_eq!(lines.len(), 3, "header plus one line per record");
  for field in ["trial_index", "task", "stimulus", "rating", "time_elapsed", "timestamp"] {
    assert!(lines[0].split(',').any(|h| h == field), "header missing {field}");
  }

  let events = drain(rx);
  assert!(matches!(events[0], RunEvent::RunFinished { records: 2, .. }));
  assert!(matches!(events[1], RunEvent::DeliveryStarted { rows: 2, .. }));
  assert!(matches!(events[2], RunEvent::DeliveryFailed { .. }));
  assert!(matches!(events[3], RunEvent::FallbackWritten { .. }));
  assert_eq!(events.len(), 4);
}

#[tokio::test]
async fn test_delivered_skips_fallback() {
  let transport = CountingTransport::ok();
  let store = SharedStore::default();
  let (controller, rx) = controller(ENDPOINT, transport.clone(), store.clone());
  let snapshot = RunSnapshot::from_records("run-b", scenario_records()).unwrap();

  let completion = controller
    .complete(snapshot, CancellationToken::new())
    .await
    .expect("run should complete");

  assert_eq!(transport.calls(), 1);
  assert_eq!(
    completion.outcome,
    DeliveryOutcome::Delivered {
      confirmation: Confirmation::Dispatched
    }
  );
  assert!(completion.fallback.is_none());
  assert!(store.0.is_empty().await);

  let events = drain(rx);
  assert_eq!(events.len(), 3);
  assert!(matches!(events[2], RunEvent::Delivered { .. }));
}

#[tokio::test]
async fn test_transport_failure_writes_fallback() {
  let transport = CountingTransport::unreachable();
  let store = SharedStore::default();
  let (controller, _rx) = controller(ENDPOINT, transport.clone(), store.clone());
  let snapshot = RunSnapshot::from_records("run-c", scenario_records()).unwrap();

  let completion = controller
    .complete(snapshot, CancellationToken::new())
    .await
    .expect("run should complete");

  assert_eq!(transport.calls(), 1);
  assert!(matches!(
    completion.outcome.error(),
    Some(DeliveryError::Transport { .. })
  ));
  assert!(completion.fallback.is_some());
  assert_eq!(store.0.len().await, 1);
}

#[tokio::test]
async fn test_deadline_writes_fallback() {
  let transport = CountingTransport::slow();
  let store = SharedStore::default();
  let (controller, _rx) = controller(ENDPOINT, transport, store.clone());
  let snapshot = RunSnapshot::from_records("run-d", scenario_records()).unwrap();

  let completion = controller
    .complete(snapshot, CancellationToken::new())
    .await
    .expect("run should complete");

  assert_eq!(
    completion.outcome.error(),
    Some(&DeliveryError::TimedOut { timeout_ms: 50 })
  );
  assert!(completion.fallback.is_some());
}

#[tokio::test]
async fn test_fallback_keeps_fields_outside_delivery_rows() {
  let store = SharedStore::default();
  let (controller, _rx) = controller("", CountingTransport::ok(), store.clone());

  let mut buffer = TrialBuffer::with_run_id("run-e");
  buffer
    .push(TrialRecord::new(0, 14).with("trial_type", "preload"))
    .unwrap();
  let rating = TrialRecord::new(1, 3000)
    .with("task", "rating")
    .with("stimulus_file", "assets/audio/amazed.wav")
    .with("response", 6)
    .with("rt", serde_json::Value::Null);
  buffer.push(rating).unwrap();

  let completion = controller
    .complete(buffer.finish(), CancellationToken::new())
    .await
    .unwrap();

  let handle = completion.fallback.unwrap();
  let text = String::from_utf8(store.0.get(&handle.key).await.unwrap().to_vec()).unwrap();
  let header = text.lines().next().unwrap();

  assert!(header.contains("trial_type"));
  assert!(header.contains("stimulus_file"));
  assert!(header.contains("response"));
  assert!(header.split(',').any(|column| column == "rt"));
}

#[tokio::test]
async fn test_empty_run_still_completes() {
  let store = SharedStore::default();
  let (controller, _rx) = controller("", CountingTransport::ok(), store);

  let completion = controller
    .complete(TrialBuffer::new().finish(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(completion.rows, 0);
  assert_eq!(completion.fallback.unwrap().rows, 0);
}
