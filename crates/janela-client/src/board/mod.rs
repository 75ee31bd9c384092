// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Full-stack board engine.
//!
//! A [`Board`] owns one background task that fetches pilots from a
//! [`DataSource`], groups them into windows, and rotates the pending queue on
//! a timer. Consumers observe it through a [`watch`] channel of
//! [`BoardSnapshot`]s and a [`broadcast`] channel of [`BoardEvent`]s; they
//! never mutate board state.
//!
//! Every change notice triggers exactly one refresh. Notices are neither
//! coalesced nor debounced, and refreshes run one after another, so the most
//! recently completed refresh is what the board shows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::grouper::{group, Cluster, QueueState};
use crate::pilot::PilotRecord;
use crate::rotator::{RotationConfig, RotationTimer, Rotator};
use crate::source::{DataSource, SourceError};

/// Configuration for a [`Board`].
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Rotation period and index policy.
    pub rotation: RotationConfig,
    /// Broadcast channel capacity for board events.
    pub event_channel_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rotation: RotationConfig::default(),
            event_channel_capacity: 64,
        }
    }
}

/// Point-in-time view of the board.
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    /// Grouping result of the last successful refresh.
    pub queue: Arc<QueueState>,
    /// Index of the visible pending window.
    pub visible_index: usize,
    /// When the last successful refresh completed.
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Number of successful refreshes so far.
    pub refresh_count: u64,
}

impl BoardSnapshot {
    /// Window on display now.
    #[must_use]
    pub fn current(&self) -> Option<&Cluster> {
        self.queue.current.as_ref()
    }

    /// Upcoming windows.
    #[must_use]
    pub fn pending(&self) -> &[Cluster] {
        &self.queue.pending
    }

    /// Pending window currently shown by the rotation.
    #[must_use]
    pub fn visible(&self) -> Option<&Cluster> {
        self.queue.pending.get(self.visible_index)
    }

    /// Whether the pending queue is long enough to rotate.
    #[must_use]
    pub fn is_rotating(&self) -> bool {
        self.queue.pending.len() > 1
    }
}

/// Events emitted by the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The queue was rebuilt from fresh data.
    Refreshed {
        /// Number of windows, current included.
        windows: usize,
        /// Number of pilots across all windows.
        pilots: usize,
    },
    /// The rotation moved to another pending window.
    Rotated {
        /// New visible index.
        visible_index: usize,
    },
    /// A fetch failed; the previous queue stays on display.
    RefreshFailed(String),
}

/// Handle to a running board.
///
/// Dropping the handle stops the board task, which releases its timer and its
/// change subscription.
pub struct Board {
    snapshot_rx: watch::Receiver<BoardSnapshot>,
    event_tx: broadcast::Sender<BoardEvent>,
    refresh_tx: mpsc::UnboundedSender<()>,
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl Board {
    /// Spawn the board task. Must be called inside a tokio runtime.
    ///
    /// The task subscribes to `source`, performs an initial refresh, then
    /// reacts to change notices, manual refresh requests and rotation ticks
    /// until shut down.
    #[must_use]
    pub fn spawn<S>(config: BoardConfig, source: S) -> Self
    where
        S: DataSource + Send + Sync + 'static,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(BoardSnapshot::default());
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        let engine = Engine {
            rotator: Rotator::new(config.rotation.index_policy),
            timer: RotationTimer::new(config.rotation.period),
            snapshot_tx,
            event_tx: event_tx.clone(),
        };
        let task_cancel = cancel_token.clone();

        let task = tokio::spawn(async move {
            board_loop(engine, source, refresh_rx, task_cancel).await;
        });

        Self {
            snapshot_rx,
            event_tx,
            refresh_tx,
            cancel_token,
            task: Some(task),
        }
    }

    /// Latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that is notified whenever the snapshot changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<BoardSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Subscribe to board events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.event_tx.subscribe()
    }

    /// Request a refresh as if the source had reported a change.
    pub fn refresh(&self) {
        let _ = self.refresh_tx.send(());
    }

    /// Stop the board task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Wait until the board task has exited.
    pub async fn stopped(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Board task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for Board {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// State owned by the board task.
struct Engine {
    rotator: Rotator,
    timer: RotationTimer,
    snapshot_tx: watch::Sender<BoardSnapshot>,
    event_tx: broadcast::Sender<BoardEvent>,
}

impl Engine {
    fn apply(&mut self, fetched: Result<Vec<PilotRecord>, SourceError>) {
        let records = match fetched {
            Ok(records) => records,
            Err(e) => {
                warn!("Refresh failed, keeping previous board: {e}");
                let _ = self.event_tx.send(BoardEvent::RefreshFailed(e.to_string()));
                return;
            }
        };

        let queue = group(records);
        for cluster in queue.clusters().filter(|c| !c.is_uniform()) {
            warn!(
                "Window {} mixes categories, showing it as '{}'",
                cluster.window_id(),
                cluster.category()
            );
        }

        let active = self.rotator.rearm(queue.pending.len());
        self.timer.arm(active);

        let windows = queue.cluster_count();
        let pilots = queue.pilot_count();
        let visible_index = self.rotator.visible_index();
        let queue = Arc::new(queue);

        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.queue = queue;
            snapshot.visible_index = visible_index;
            snapshot.refreshed_at = Some(Utc::now());
            snapshot.refresh_count += 1;
        });

        info!("Board refreshed: {windows} windows, {pilots} pilots, rotating={active}");
        let _ = self.event_tx.send(BoardEvent::Refreshed { windows, pilots });
    }

    fn rotate(&mut self) {
        if let Some(visible_index) = self.rotator.tick() {
            self.snapshot_tx.send_modify(|snapshot| snapshot.visible_index = visible_index);
            debug!("Rotated to pending window {visible_index}");
            let _ = self.event_tx.send(BoardEvent::Rotated { visible_index });
        }
    }
}

/// Fetch unless cancelled first. `None` means cancelled.
async fn fetch_or_cancel<S: DataSource>(
    source: &S,
    cancel_token: &CancellationToken,
) -> Option<Result<Vec<PilotRecord>, SourceError>> {
    tokio::select! {
        biased;
        () = cancel_token.cancelled() => None,
        fetched = source.fetch() => Some(fetched),
    }
}

async fn board_loop<S: DataSource>(
    mut engine: Engine,
    source: S,
    mut refresh_rx: mpsc::UnboundedReceiver<()>,
    cancel_token: CancellationToken,
) {
    // Subscribe before the first fetch so no change slips in between.
    let mut subscription = source.subscribe();
    let mut subscribed = true;

    match fetch_or_cancel(&source, &cancel_token).await {
        Some(fetched) => engine.apply(fetched),
        None => return,
    }

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,

            notice = subscription.recv(), if subscribed => {
                let Some(notice) = notice else {
                    warn!("Data source closed its change feed, board will no longer refresh on changes");
                    subscribed = false;
                    continue;
                };
                debug!("Change notice {:?} at {}", notice.kind, notice.at);
                match fetch_or_cancel(&source, &cancel_token).await {
                    Some(fetched) => engine.apply(fetched),
                    None => break,
                }
            }

            Some(()) = refresh_rx.recv() => {
                debug!("Manual refresh requested");
                match fetch_or_cancel(&source, &cancel_token).await {
                    Some(fetched) => engine.apply(fetched),
                    None => break,
                }
            }

            () = engine.timer.tick() => engine.rotate(),
        }
    }

    engine.timer.disarm();
    info!("Board stopped");
}
