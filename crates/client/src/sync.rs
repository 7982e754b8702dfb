//! The per-view sync loop.
//!
//! One loop per mounted view, owning exactly two cadences: a 1 Hz visual
//! tick and a server poll (foreground cadence while visible; longer or
//! paused while hidden). The loop is the only writer of its [`ViewTimers`];
//! renderers receive [`ViewUpdate`]s over a channel and read snapshots on
//! demand. Dropping the handle cancels both cadences, so no timer keeps
//! running against a view that is no longer observed.

use crate::source::{ObservedTimer, TimerSource, ViewScope};
use crate::view::{ViewTimers, ViewUpdate, Visibility};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Cadences for one view.
#[derive(Clone, Copy, Debug)]
pub struct SyncConfig {
    /// Local countdown tick.
    pub tick_interval: Duration,
    /// Poll cadence while the view is visible.
    pub foreground_poll: Duration,
    /// Poll cadence while hidden; `None` pauses polling entirely.
    pub background_poll: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            foreground_poll: Duration::from_secs(10),
            background_poll: None,
        }
    }
}

/// Handle to a running view sync loop.
///
/// Requires a tokio runtime. Dropping the handle aborts the loop.
pub struct SyncHandle {
    timers: Arc<Mutex<ViewTimers>>,
    visibility_tx: watch::Sender<Visibility>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Spawns the loop for a view.
    ///
    /// The first reconciliation happens immediately on mount. `updates`
    /// receives every repaint instruction the view produces.
    pub fn spawn<S>(
        source: S,
        scope: ViewScope,
        config: SyncConfig,
        updates: mpsc::UnboundedSender<ViewUpdate>,
    ) -> Self
    where
        S: TimerSource + 'static,
    {
        let timers = Arc::new(Mutex::new(ViewTimers::new()));
        let (visibility_tx, visibility_rx) = watch::channel(Visibility::Visible);
        let task = tokio::spawn(run_loop(
            source,
            scope,
            config,
            Arc::clone(&timers),
            visibility_rx,
            updates,
        ));
        Self {
            timers,
            visibility_tx,
            task,
        }
    }

    /// Reports the view's visibility.
    ///
    /// Hiding suspends the tick (and polling, unless a background cadence
    /// is configured); becoming visible forces an immediate reconciliation.
    pub fn set_visibility(&self, visibility: Visibility) {
        // The receiver lives as long as the loop; a send failure just means
        // the loop is already gone.
        let _ = self.visibility_tx.send(visibility);
    }

    /// A copy of the current cached timers.
    pub fn snapshot(&self) -> Vec<ObservedTimer> {
        self.timers
            .lock()
            .expect("view lock poisoned")
            .timers()
            .cloned()
            .collect()
    }

    /// The cached timer for one patient.
    pub fn timer(&self, patient_id: &str) -> Option<ObservedTimer> {
        self.timers
            .lock()
            .expect("view lock poisoned")
            .timer(patient_id)
            .cloned()
    }

    /// Stops the loop. Equivalent to dropping the handle.
    pub fn stop(self) {}
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_loop<S>(
    source: S,
    scope: ViewScope,
    config: SyncConfig,
    timers: Arc<Mutex<ViewTimers>>,
    mut visibility_rx: watch::Receiver<Visibility>,
    updates: mpsc::UnboundedSender<ViewUpdate>,
) where
    S: TimerSource,
{
    // First tick a full interval after mount; the mount-time state comes
    // from the initial poll, not from a decrement.
    let mut tick =
        tokio::time::interval_at(Instant::now() + config.tick_interval, config.tick_interval);
    // A hidden view stops consuming ticks; the backlog must not replay as a
    // fast-forward when it becomes visible again.
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // The mount-time reconciliation.
    let mut next_poll: Option<Instant> = Some(Instant::now());

    loop {
        let visibility = *visibility_rx.borrow();
        let visible = visibility == Visibility::Visible;

        tokio::select! {
            _ = tick.tick(), if visible => {
                let ticked = timers.lock().expect("view lock poisoned").tick();
                send_all(&updates, ticked);
            }
            _ = wait_until(next_poll) => {
                match source.fetch(&scope).await {
                    Ok(fresh) => {
                        let applied =
                            timers.lock().expect("view lock poisoned").apply_sync(fresh);
                        send_all(&updates, applied);
                    }
                    Err(error) => {
                        // Keep the stale cache; retry on the next interval.
                        tracing::debug!("timer poll failed, keeping cached state: {error}");
                    }
                }
                next_poll = schedule_next_poll(&config, visibility);
            }
            changed = visibility_rx.changed() => {
                if changed.is_err() {
                    // Sender gone: the handle was leaked without abort.
                    return;
                }
                let visibility = *visibility_rx.borrow();
                let reconcile = {
                    let mut view = timers.lock().expect("view lock poisoned");
                    view.set_visibility(visibility);
                    view.take_reconcile_request()
                };
                next_poll = if reconcile {
                    Some(Instant::now())
                } else {
                    schedule_next_poll(&config, visibility)
                };
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn schedule_next_poll(config: &SyncConfig, visibility: Visibility) -> Option<Instant> {
    let delay = match visibility {
        Visibility::Visible => Some(config.foreground_poll),
        Visibility::Hidden => config.background_poll,
    };
    delay.map(|delay| Instant::now() + delay)
}

fn send_all(updates: &mpsc::UnboundedSender<ViewUpdate>, batch: Vec<ViewUpdate>) {
    for update in batch {
        // A dropped receiver is fine; state stays queryable via the handle.
        if updates.send(update).is_err() {
            break;
        }
    }
}
