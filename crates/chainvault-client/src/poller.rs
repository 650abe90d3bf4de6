//! Periodic balance refresh.
//!
//! A poller runs `fetch` on a fixed interval and publishes the latest
//! result through a `watch` channel. A failed refresh keeps the previous
//! value and records the error. The task ends when the handle is stopped
//! or dropped.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Latest state published by a poller.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Most recent successful value
    pub value: Option<T>,
    /// Error from the most recent refresh, cleared on success
    pub last_error: Option<String>,
    /// Successful refreshes so far
    pub updates: u64,
    pub failures: u64,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            value: None,
            last_error: None,
            updates: 0,
            failures: 0,
        }
    }
}

/// Handle to a running poller.
pub struct PollHandle<T> {
    snapshots: watch::Receiver<Snapshot<T>>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<T: Clone> PollHandle<T> {
    /// Current snapshot.
    pub fn latest(&self) -> Snapshot<T> {
        self.snapshots.borrow().clone()
    }

    /// Another receiver for the same stream of snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshots.clone()
    }

    /// Wait for the next published snapshot. Returns `None` once the poller has stopped.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.snapshots.changed().await.ok()?;
        Some(self.snapshots.borrow_and_update().clone())
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal shutdown and wait for the task to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Poller task ended abnormally: {}", e);
        }
    }
}

/// Spawn a task that calls `fetch` every `period`, starting immediately.
pub fn spawn_poller<T, E, F, Fut>(period: Duration, mut fetch: F) -> PollHandle<T>
where
    T: Clone + Send + Sync + 'static,
    E: Display + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let (snapshot_tx, snapshots) = watch::channel(Snapshot::default());
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let result = fetch().await;
                    snapshot_tx.send_modify(|snapshot| match result {
                        Ok(value) => {
                            snapshot.value = Some(value);
                            snapshot.last_error = None;
                            snapshot.updates += 1;
                        }
                        Err(e) => {
                            tracing::debug!("Poll refresh failed: {}", e);
                            snapshot.last_error = Some(e.to_string());
                            snapshot.failures += 1;
                        }
                    });
                    if snapshot_tx.is_closed() {
                        break;
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Poller stopped");
    });

    PollHandle {
        snapshots,
        shutdown,
        task,
    }
}
