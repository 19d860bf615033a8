//! Suspension timeout: a one-shot timer raced against player reconnection.
//!
//! Both sides resolve through the same `ResolutionToken`: the timer task may
//! only report expiry if it moves the token from pending to fired, and a
//! reconnection may only resume play if it moves it from pending to
//! cancelled. Exactly one of them succeeds.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

use crate::engine::models::PlayerName;

pub const DEFAULT_SUSPENSION_TIMEOUT: Duration = Duration::from_secs(60);

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Pending,
    Fired,
    Cancelled,
}

/// Single atomic resolution point shared by a timer and its canceller.
#[derive(Debug, Clone, Default)]
pub struct ResolutionToken(Arc<AtomicU8>);

impl ResolutionToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&self, to: u8) -> bool {
        self.0
            .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claim the timeout outcome. False if already resolved.
    pub fn try_fire(&self) -> bool {
        self.resolve(FIRED)
    }

    /// Claim the resume outcome. False if already resolved.
    pub fn try_cancel(&self) -> bool {
        self.resolve(CANCELLED)
    }

    pub fn state(&self) -> Resolution {
        match self.0.load(Ordering::Acquire) {
            PENDING => Resolution::Pending,
            FIRED => Resolution::Fired,
            _ => Resolution::Cancelled,
        }
    }
}

/// Owns the session's background tasks. Dropping it aborts them.
#[derive(Debug)]
pub struct TaskScheduler {
    handle: Option<Handle>,
    tasks: Vec<JoinHandle<()>>,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler {
    /// Bind to the runtime the session is created on, if any.
    pub fn new() -> Self {
        Self {
            handle: Handle::try_current().ok(),
            tasks: Vec::new(),
        }
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
            tasks: Vec::new(),
        }
    }

    /// Run `f` once after `delay`. The deadline is fixed now, not when the
    /// task is first polled. Returns `None` when no runtime is available.
    pub fn schedule_after<F>(&mut self, delay: Duration, f: F) -> Option<AbortHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = match &self.handle {
            Some(h) => h.clone(),
            None => {
                let h = Handle::try_current().ok()?;
                self.handle = Some(h.clone());
                h
            }
        };
        let sleep = {
            let _guard = handle.enter();
            tokio::time::sleep(delay)
        };
        let task = handle.spawn(async move {
            sleep.await;
            f();
        });
        let abort = task.abort_handle();
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(task);
        Some(abort)
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    pub fn abort_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Sent by the timer task after it won the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspensionExpired {
    pub generation: u64,
}

#[derive(Debug)]
struct ActiveSuspension {
    generation: u64,
    token: ResolutionToken,
    survivor: Option<PlayerName>,
    timer: Option<AbortHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Cancel won: the caller restores the suspended phase.
    Resumed,
    /// The timer already fired: the caller applies the timeout outcome.
    AlreadyExpired { survivor: Option<PlayerName> },
    NotSuspended,
}

/// Tracks at most one running suspension and delivers its expiry.
#[derive(Debug)]
pub struct SuspensionManager {
    timeout: Duration,
    scheduler: TaskScheduler,
    events_tx: mpsc::UnboundedSender<SuspensionExpired>,
    events_rx: mpsc::UnboundedReceiver<SuspensionExpired>,
    active: Option<ActiveSuspension>,
    generation: u64,
}

impl SuspensionManager {
    pub fn new(timeout: Duration) -> Self {
        Self::with_scheduler(timeout, TaskScheduler::new())
    }

    pub fn with_scheduler(timeout: Duration, scheduler: TaskScheduler) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            timeout,
            scheduler,
            events_tx,
            events_rx,
            active: None,
            generation: 0,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn token(&self) -> Option<&ResolutionToken> {
        self.active.as_ref().map(|a| &a.token)
    }

    /// Start the timeout for a suspension that `survivor` alone keeps alive.
    pub fn begin(&mut self, survivor: Option<PlayerName>) {
        self.clear();
        self.generation += 1;
        let generation = self.generation;
        let token = ResolutionToken::new();

        let fire_token = token.clone();
        let tx = self.events_tx.clone();
        let timer = self.scheduler.schedule_after(self.timeout, move || {
            if fire_token.try_fire() {
                let _ = tx.send(SuspensionExpired { generation });
            }
        });
        if timer.is_none() {
            tracing::warn!("no async runtime, suspension will only end on reconnection");
        }
        tracing::info!(
            generation,
            timeout_secs = self.timeout.as_secs(),
            survivor = ?survivor,
            "suspension timer started"
        );
        self.active = Some(ActiveSuspension {
            generation,
            token,
            survivor,
            timer,
        });
    }

    /// Reconnection path: try to win the token.
    pub fn cancel(&mut self) -> CancelOutcome {
        let Some(active) = self.active.take() else {
            return CancelOutcome::NotSuspended;
        };
        if active.token.try_cancel() {
            if let Some(timer) = active.timer {
                timer.abort();
            }
            tracing::info!(generation = active.generation, "suspension cancelled");
            CancelOutcome::Resumed
        } else {
            tracing::info!(generation = active.generation, "suspension already expired");
            CancelOutcome::AlreadyExpired {
                survivor: active.survivor,
            }
        }
    }

    /// Accept an expiry event if it belongs to the running suspension.
    /// Returns the survivor to declare winner.
    pub fn take_expired(&mut self, event: SuspensionExpired) -> Option<Option<PlayerName>> {
        match &self.active {
            Some(active)
                if active.generation == event.generation
                    && active.token.state() == Resolution::Fired =>
            {
                self.active.take().map(|a| a.survivor)
            }
            _ => {
                tracing::debug!(generation = event.generation, "stale suspension event ignored");
                None
            }
        }
    }

    /// Drop any running suspension without resolving it to a game outcome.
    pub fn clear(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.try_cancel();
            if let Some(timer) = active.timer {
                timer.abort();
            }
        }
    }

    /// Wait for the next expiry event.
    pub async fn next_event(&mut self) -> Option<SuspensionExpired> {
        self.events_rx.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SuspensionExpired> {
        self.events_rx.try_recv().ok()
    }

    pub fn shutdown(&mut self) {
        self.clear();
        self.scheduler.abort_all();
    }
}
