//! The grab loop: rest, drain, repeat.
//!
//! A run alternates between two phases. While resting it sums tick deltas
//! until the configured interval has passed. While draining it calls `grab`
//! on the state resource again and again, handing every item to the
//! processor, until a call comes back empty. Any failure (non-Ok status,
//! transport fault, processor error) goes to the error handler and ends the
//! run; nothing is retried. Restarting is up to the caller.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::clock::{Clock, Ticker};
use super::config::{clamp_interval, GrabberConfig};
use super::error::GrabError;
use super::processor::{GrabErrorHandler, ItemProcessor, NoopErrorHandler};
use crate::cache::StateHandler;
use crate::remote::Root;

/// Where a loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Never started.
    Idle = 0,
    /// Counting down the interval.
    Resting = 1,
    /// Calling `grab` until it comes back empty.
    Draining = 2,
    /// Stopped by the caller or by a failure.
    Stopped = 3,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Resting,
            2 => Self::Draining,
            3 => Self::Stopped,
            _ => Self::Idle,
        }
    }
}

struct RunHandle {
    token: CancellationToken,
    /// Cancelled when the task ends, panics included.
    done: CancellationToken,
    task: JoinHandle<()>,
}

/// State shared between the loop handle and its running task.
struct Shared {
    running: AtomicBool,
    generation: AtomicU64,
    interval_nanos: AtomicU64,
    phase: AtomicU8,
    run: Mutex<Option<RunHandle>>,
}

impl Shared {
    fn lock_run(&self) -> MutexGuard<'_, Option<RunHandle>> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_nanos.load(Ordering::Relaxed))
    }

    fn set_interval(&self, interval: Duration) {
        let nanos = u64::try_from(clamp_interval(interval).as_nanos()).unwrap_or(u64::MAX);
        self.interval_nanos.store(nanos, Ordering::Relaxed);
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Polls the state resource and feeds drained items to a processor.
///
/// At most one run is active per loop; `start` on a running loop does
/// nothing. Must be started from within a tokio runtime.
pub struct GrabLoop<P, E = NoopErrorHandler> {
    config: GrabberConfig,
    root: Option<Root>,
    processor: Arc<P>,
    on_error: Arc<E>,
    shared: Arc<Shared>,
}

impl<P: ItemProcessor> GrabLoop<P, NoopErrorHandler> {
    /// Loop whose failures are only logged.
    pub fn new(config: GrabberConfig, processor: P) -> Self {
        Self::with_error_handler(config, processor, NoopErrorHandler)
    }
}

impl<P: ItemProcessor, E: GrabErrorHandler> GrabLoop<P, E> {
    pub fn with_error_handler(config: GrabberConfig, processor: P, on_error: E) -> Self {
        let shared = Arc::new(Shared {
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            interval_nanos: AtomicU64::new(0),
            phase: AtomicU8::new(Phase::Idle as u8),
            run: Mutex::new(None),
        });
        shared.set_interval(config.effective_interval());

        Self {
            config,
            root: None,
            processor: Arc::new(processor),
            on_error: Arc::new(on_error),
            shared,
        }
    }

    /// Use `root` instead of an HTTP root built from the config.
    pub fn with_root(mut self, root: Root) -> Self {
        self.root = Some(root);
        self
    }

    pub fn config(&self) -> &GrabberConfig {
        &self.config
    }

    /// Edit the configuration. The interval (with its floor) applies at
    /// once, like [`set_interval`](Self::set_interval); connection settings
    /// apply from the next `start`.
    pub fn update_config(&mut self, update: impl FnOnce(&mut GrabberConfig)) {
        update(&mut self.config);
        self.shared.set_interval(self.config.effective_interval());
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.shared.phase.load(Ordering::SeqCst))
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval()
    }

    /// Change the rest interval, raised to the 10 second floor. A resting
    /// run picks the new value up on its next tick.
    pub fn set_interval(&self, interval: Duration) {
        self.shared.set_interval(interval);
    }

    /// Start a run. Returns `false` (and does nothing) if one is running.
    pub fn start(&self, clock: Clock) -> bool {
        let mut run = self.shared.lock_run();
        if self.shared.running.swap(true, Ordering::SeqCst) {
            tracing::debug!(target: "livecache::grab", "Grab loop already running");
            return false;
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.set_phase(Phase::Resting);

        let root = self.root.clone().unwrap_or_else(|| self.config.root());
        let handler = StateHandler::with_resource(&root, self.config.state_resource_key.clone());
        let token = CancellationToken::new();

        let grab_run = GrabRun {
            shared: Arc::clone(&self.shared),
            generation,
            handler,
            processor: Arc::clone(&self.processor),
            on_error: Arc::clone(&self.on_error),
            token: token.clone(),
        };
        let ticker = Ticker::new(clock, self.config.tick());
        let done = CancellationToken::new();
        let done_guard = done.clone().drop_guard();
        let shared = Arc::clone(&self.shared);

        // A previous run may still be finishing its last drain call
        let previous = run.take();
        let task = tokio::spawn(async move {
            // Built on first poll: its drop takes the run lock `start` holds
            let mut finish = FinishGuard {
                shared,
                generation,
                completed: false,
                _done: done_guard,
            };
            if let Some(previous) = previous {
                if let Err(e) = previous.task.await {
                    tracing::error!(target: "livecache::grab", error = %e, "Grab loop task panicked");
                }
            }
            grab_run.execute(ticker).await;
            finish.completed = true;
        });

        *run = Some(RunHandle { token, done, task });
        true
    }

    /// Ask the current run to stop. A resting run stops at once; a draining
    /// run finishes dispatching the batch in hand and stops before the next
    /// `grab` call.
    pub fn stop(&self) {
        let run = self.shared.lock_run();
        if self.shared.running.swap(false, Ordering::SeqCst) {
            tracing::info!(target: "livecache::grab", "Grab loop stop requested");
        }
        if let Some(run) = run.as_ref() {
            run.token.cancel();
        }
    }

    /// Wait until the current run, if any, has finished. Safe to call
    /// concurrently with [`stop`](Self::stop).
    pub async fn join(&self) {
        let done = self.shared.lock_run().as_ref().map(|run| run.done.clone());
        if let Some(done) = done {
            done.cancelled().await;
        }
    }
}

impl<P, E> Drop for GrabLoop<P, E> {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(run) = self.shared.lock_run().as_ref() {
            run.token.cancel();
        }
    }
}

/// Marks a run finished when its task ends, even if a callback panicked.
struct FinishGuard {
    shared: Arc<Shared>,
    generation: u64,
    completed: bool,
    /// Dropped after the flags are cleared, so `join` sees the final state.
    _done: DropGuard,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        if !self.completed {
            tracing::error!(
                target: "livecache::grab",
                generation = self.generation,
                "Grab loop task ended abnormally"
            );
        }

        // Clear the running flag, unless a newer run has taken over
        let _run = self.shared.lock_run();
        if self.shared.generation.load(Ordering::SeqCst) == self.generation {
            self.shared.running.store(false, Ordering::SeqCst);
            self.shared.set_phase(Phase::Stopped);
        }
    }
}

enum DrainOutcome {
    /// A `grab` call came back empty.
    Drained { dispatched: usize },
    /// The run was stopped between two calls.
    Stopped { dispatched: usize },
}

/// One run of a loop, owned by its task.
struct GrabRun<P, E> {
    shared: Arc<Shared>,
    generation: u64,
    handler: StateHandler,
    processor: Arc<P>,
    on_error: Arc<E>,
    token: CancellationToken,
}

impl<P: ItemProcessor, E: GrabErrorHandler> GrabRun<P, E> {
    fn is_current(&self) -> bool {
        self.shared.is_current(self.generation)
    }

    async fn execute(self, mut ticker: Ticker) {
        tracing::info!(
            target: "livecache::grab",
            resource = self.handler.resource().key(),
            interval_secs = self.shared.interval().as_secs_f64(),
            "Grab loop started"
        );

        while self.is_current() {
            self.shared.set_phase(Phase::Resting);
            if !self.rest(&mut ticker).await || !self.is_current() {
                break;
            }

            self.shared.set_phase(Phase::Draining);
            match self.drain().await {
                Ok(DrainOutcome::Drained { dispatched }) => {
                    tracing::debug!(target: "livecache::grab", dispatched, "Drained state");
                }
                Ok(DrainOutcome::Stopped { dispatched }) => {
                    tracing::debug!(target: "livecache::grab", dispatched, "Stopped while draining");
                    break;
                }
                Err(error) => {
                    tracing::error!(
                        target: "livecache::grab",
                        error = %error,
                        http_code = error.http_code(),
                        "Grab iteration failed, stopping loop"
                    );
                    self.on_error.on_grab_error(&error).await;
                    break;
                }
            }
        }

        tracing::info!(target: "livecache::grab", "Grab loop stopped");
    }

    /// Count down the interval. Returns `false` if stopped meanwhile.
    async fn rest(&self, ticker: &mut Ticker) -> bool {
        ticker.reset();
        let mut elapsed = Duration::ZERO;
        while elapsed < self.shared.interval() {
            tokio::select! {
                () = self.token.cancelled() => return false,
                delta = ticker.tick() => elapsed = elapsed.saturating_add(delta),
            }
        }
        true
    }

    async fn drain(&self) -> Result<DrainOutcome, GrabError> {
        let mut dispatched = 0;
        loop {
            if !self.is_current() {
                return Ok(DrainOutcome::Stopped { dispatched });
            }

            tracing::debug!(target: "livecache::grab", "Performing grab iteration");
            let items = self
                .handler
                .grab()
                .await?
                .into_result()
                .map_err(|code| GrabError::Status { code })?;

            if items.is_empty() {
                return Ok(DrainOutcome::Drained { dispatched });
            }

            tracing::debug!(target: "livecache::grab", items = items.len(), "Grabbed items");
            for item in items {
                tracing::trace!(
                    target: "livecache::grab",
                    contract_key = item.contract_key().unwrap_or_default(),
                    "Dispatching item"
                );
                self.processor
                    .process_item(item)
                    .await
                    .map_err(GrabError::Processor)?;
                dispatched += 1;
            }
        }
    }
}
