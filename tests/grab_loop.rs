mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{batch, empty, Scripted, ScriptedTransport};
use livecache::cache::{Erc20Balance, GrabbedItem};
use livecache::grab::{
    Clock, FnErrorHandler, FnProcessor, GrabError, GrabLoop, GrabberConfig, ItemProcessor, Phase,
    TimeScale,
};
use livecache::remote::ResultCode;
use livecache::Amount;
use tokio::sync::Notify;
use tokio::time::sleep;

/// Records the `seq` field of every processed item. Fails on `fail_on`.
#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<u64>>>,
    fail_on: Option<u64>,
}

impl Recorder {
    fn failing_on(seq: u64) -> Self {
        Self {
            fail_on: Some(seq),
            ..Self::default()
        }
    }

    fn seen(&self) -> Vec<u64> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemProcessor for Recorder {
    async fn process_item(&self, item: GrabbedItem) -> anyhow::Result<()> {
        let seq = item.get("seq").and_then(|v| v.as_u64()).unwrap_or(u64::MAX);
        if self.fail_on == Some(seq) {
            anyhow::bail!("cannot process item {seq}");
        }
        self.seen.lock().unwrap().push(seq);
        Ok(())
    }
}

type Failures = Arc<Mutex<Vec<(String, u16)>>>;

fn failure_collector() -> (Failures, FnErrorHandler<impl Fn(&GrabError) + Send + Sync + 'static>) {
    let failures: Failures = Arc::default();
    let sink = failures.clone();
    let handler = FnErrorHandler(move |error: &GrabError| {
        sink.lock().unwrap().push((error.to_string(), error.http_code()));
    });
    (failures, handler)
}

fn config() -> GrabberConfig {
    GrabberConfig::default()
}

fn after_first_interval() -> Duration {
    Duration::from_secs(10) + Duration::from_millis(500)
}

#[tokio::test(start_paused = true)]
async fn test_drains_until_empty_before_resting() {
    let transport = ScriptedTransport::new([batch(0, 3), batch(3, 1), empty()]);
    let recorder = Recorder::default();
    let grabber = GrabLoop::new(config(), recorder.clone()).with_root(transport.root());

    assert_eq!(grabber.phase(), Phase::Idle);
    assert!(grabber.start(Clock::Unscaled));
    assert!(grabber.is_running());

    sleep(Duration::from_secs(5)).await;
    assert_eq!(transport.call_count(), 0);

    sleep(after_first_interval() - Duration::from_secs(5)).await;
    assert_eq!(transport.call_count(), 3);
    assert_eq!(recorder.seen(), vec![0, 1, 2, 3]);
    assert_eq!(grabber.phase(), Phase::Resting);

    let calls = transport.calls();
    assert!(calls
        .iter()
        .all(|call| call.resource == "evm-state" && call.method == "grab" && call.params.is_empty()));

    // Next interval: one more (empty) grab
    sleep(Duration::from_secs(10)).await;
    assert_eq!(transport.call_count(), 4);

    grabber.stop();
    grabber.join().await;
    assert!(!grabber.is_running());
    assert_eq!(grabber.phase(), Phase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_non_ok_status_stops_the_loop() {
    let transport =
        ScriptedTransport::new([batch(0, 2), Scripted::Status(ResultCode::Unauthorized)]);
    let recorder = Recorder::default();
    let (failures, on_error) = failure_collector();
    let grabber = GrabLoop::with_error_handler(config(), recorder.clone(), on_error)
        .with_root(transport.root());

    grabber.start(Clock::Unscaled);
    grabber.join().await;

    assert_eq!(recorder.seen(), vec![0, 1]);
    assert_eq!(
        *failures.lock().unwrap(),
        vec![("grab returned Unauthorized".to_string(), 401)]
    );
    assert!(!grabber.is_running());
    assert_eq!(grabber.phase(), Phase::Stopped);

    // No further grabs once stopped
    sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transport_fault_goes_to_error_handler() {
    let transport = ScriptedTransport::new([Scripted::Fault("connection refused".into())]);
    let (failures, on_error) = failure_collector();
    let grabber = GrabLoop::with_error_handler(config(), Recorder::default(), on_error)
        .with_root(transport.root());

    grabber.start(Clock::Unscaled);
    grabber.join().await;

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.contains("connection refused"));
    assert_eq!(failures[0].1, 500);
    assert!(!grabber.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_processor_failure_aborts_the_batch() {
    let transport = ScriptedTransport::new([batch(0, 3), batch(3, 2)]);
    let recorder = Recorder::failing_on(1);
    let (failures, on_error) = failure_collector();
    let grabber = GrabLoop::with_error_handler(config(), recorder.clone(), on_error)
        .with_root(transport.root());

    grabber.start(Clock::Unscaled);
    grabber.join().await;

    assert_eq!(recorder.seen(), vec![0]);
    assert_eq!(transport.call_count(), 1);
    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.contains("cannot process item 1"));
}

#[tokio::test(start_paused = true)]
async fn test_start_is_idempotent() {
    let transport = ScriptedTransport::new([]);
    let grabber = GrabLoop::new(config(), Recorder::default()).with_root(transport.root());

    assert!(grabber.start(Clock::Unscaled));
    assert!(!grabber.start(Clock::Unscaled));
    assert!(grabber.is_running());

    sleep(after_first_interval()).await;
    assert!(!grabber.start(Clock::Unscaled));
    assert!(grabber.is_running());
    // A second loop would have doubled the calls
    assert_eq!(transport.call_count(), 1);

    grabber.stop();
    grabber.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_waits_for_in_flight_batch() {
    let release = Arc::new(Notify::new());
    let transport = ScriptedTransport::new([
        Scripted::Held {
            release: release.clone(),
            then: Box::new(batch(0, 2)),
        },
        batch(2, 1),
    ]);
    let recorder = Recorder::default();
    let grabber = GrabLoop::new(config(), recorder.clone()).with_root(transport.root());

    grabber.start(Clock::Unscaled);
    sleep(after_first_interval()).await;
    assert_eq!(transport.call_count(), 1);
    assert_eq!(grabber.phase(), Phase::Draining);

    grabber.stop();
    assert!(!grabber.is_running());
    release.notify_one();
    grabber.join().await;

    assert_eq!(recorder.seen(), vec![0, 1]);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(grabber.phase(), Phase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_resting_is_immediate() {
    let transport = ScriptedTransport::new([]);
    let grabber = GrabLoop::new(config(), Recorder::default()).with_root(transport.root());

    grabber.start(Clock::Unscaled);
    sleep(Duration::from_secs(3)).await;
    grabber.stop();
    grabber.join().await;

    assert_eq!(grabber.phase(), Phase::Stopped);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_failure() {
    let transport =
        ScriptedTransport::new([Scripted::Status(ResultCode::UnexpectedError), batch(0, 1)]);
    let recorder = Recorder::default();
    let grabber = GrabLoop::new(config(), recorder.clone()).with_root(transport.root());

    grabber.start(Clock::Unscaled);
    grabber.join().await;
    assert!(!grabber.is_running());

    assert!(grabber.start(Clock::Unscaled));
    sleep(after_first_interval()).await;
    assert_eq!(recorder.seen(), vec![0]);

    grabber.stop();
    grabber.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_restart_right_after_stop_does_not_overlap() {
    let release = Arc::new(Notify::new());
    let transport = ScriptedTransport::new([
        Scripted::Held {
            release: release.clone(),
            then: Box::new(batch(0, 1)),
        },
        batch(1, 1),
    ]);
    let recorder = Recorder::default();
    let grabber = GrabLoop::new(config(), recorder.clone()).with_root(transport.root());

    grabber.start(Clock::Unscaled);
    sleep(after_first_interval()).await;
    grabber.stop();
    assert!(grabber.start(Clock::Unscaled));

    release.notify_one();
    sleep(Duration::from_secs(1)).await;
    // The old run dispatched its batch and quit without another grab
    assert_eq!(recorder.seen(), vec![0]);
    assert_eq!(transport.call_count(), 1);
    assert!(grabber.is_running());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(recorder.seen(), vec![0, 1]);

    grabber.stop();
    grabber.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_interval_floor_and_runtime_change() {
    let transport = ScriptedTransport::new([]);
    let grabber = GrabLoop::new(
        GrabberConfig {
            interval_secs: 2.0,
            ..config()
        },
        Recorder::default(),
    )
    .with_root(transport.root());
    assert_eq!(grabber.interval(), Duration::from_secs(10));

    grabber.set_interval(Duration::from_secs(1));
    assert_eq!(grabber.interval(), Duration::from_secs(10));

    grabber.start(Clock::Unscaled);
    sleep(Duration::from_secs(5)).await;
    grabber.set_interval(Duration::from_secs(30));
    assert_eq!(grabber.interval(), Duration::from_secs(30));

    sleep(Duration::from_secs(10)).await;
    assert_eq!(transport.call_count(), 0);
    sleep(Duration::from_secs(16)).await;
    assert_eq!(transport.call_count(), 1);

    grabber.stop();
    grabber.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_scaled_clock_follows_time_scale() {
    let transport = ScriptedTransport::new([]);
    let grabber = GrabLoop::new(config(), Recorder::default()).with_root(transport.root());
    let scale = TimeScale::new(0.0);

    grabber.start(Clock::Scaled(scale.clone()));
    sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.call_count(), 0);

    // Double speed: ten scaled seconds take five real ones
    scale.set(2.0);
    sleep(Duration::from_millis(5_500)).await;
    assert_eq!(transport.call_count(), 1);

    grabber.stop();
    grabber.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_processor_reads_typed_records() {
    let transport = ScriptedTransport::new([batch(7, 1)]);
    let records: Arc<Mutex<Vec<Erc20Balance>>> = Arc::default();
    let sink = records.clone();
    let grabber = GrabLoop::new(
        config(),
        FnProcessor(move |item: GrabbedItem| {
            let sink = sink.clone();
            async move {
                if item.contract_key() == Some("erc20-sample") {
                    sink.lock().unwrap().push(item.record());
                }
                Ok::<_, anyhow::Error>(())
            }
        }),
    )
    .with_root(transport.root());

    grabber.start(Clock::Unscaled);
    sleep(after_first_interval()).await;
    grabber.stop();
    grabber.join().await;

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, Amount::from(7));
    assert_eq!(records[0].owner, format!("0x{:040x}", 7));
}

#[tokio::test(start_paused = true)]
async fn test_panicking_processor_stops_and_allows_restart() {
    let transport = ScriptedTransport::new([batch(0, 1), batch(1, 1)]);
    let blown = Arc::new(AtomicBool::new(false));
    let seen: Arc<Mutex<Vec<u64>>> = Arc::default();
    let (flag, sink) = (blown.clone(), seen.clone());
    let grabber = GrabLoop::new(
        config(),
        FnProcessor(move |item: GrabbedItem| {
            let first = !flag.swap(true, Ordering::SeqCst);
            let sink = sink.clone();
            async move {
                if first {
                    panic!("processor blew up");
                }
                if let Some(seq) = item.get("seq").and_then(|v| v.as_u64()) {
                    sink.lock().unwrap().push(seq);
                }
                Ok::<_, anyhow::Error>(())
            }
        }),
    )
    .with_root(transport.root());

    grabber.start(Clock::Unscaled);
    grabber.join().await;

    assert!(blown.load(Ordering::SeqCst));
    assert!(!grabber.is_running());
    assert_eq!(grabber.phase(), Phase::Stopped);
    assert_eq!(transport.call_count(), 1);

    assert!(grabber.start(Clock::Unscaled));
    sleep(after_first_interval()).await;
    assert_eq!(*seen.lock().unwrap(), vec![1]);

    grabber.stop();
    grabber.join().await;
    assert!(!grabber.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_update_config_applies_interval() {
    let transport = ScriptedTransport::new([]);
    let mut grabber = GrabLoop::new(config(), Recorder::default()).with_root(transport.root());

    grabber.update_config(|config| config.interval_secs = 1.0);
    assert_eq!(grabber.interval(), Duration::from_secs(10));

    grabber.update_config(|config| config.interval_secs = 60.0);
    assert_eq!(grabber.interval(), Duration::from_secs(60));
    assert_eq!(grabber.config().effective_interval(), grabber.interval());

    grabber.start(Clock::Unscaled);
    sleep(after_first_interval()).await;
    assert_eq!(transport.call_count(), 0);

    sleep(Duration::from_secs(50)).await;
    assert_eq!(transport.call_count(), 1);

    grabber.stop();
    grabber.join().await;
}
