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

//! Data source layer.
//!
//! A [`DataSource`] answers one query (every pilot with a window, sorted by
//! window) and publishes a [`ChangeNotice`] whenever the pilot table changes.
//! Notices carry no payload the board relies on: every notice means "fetch
//! and regroup".

mod file;
mod memory;

pub use file::{FileFormat, FileSource, FileSourceConfig};
pub use memory::MemorySource;

use std::future::Future;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::warn;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::pilot::{PilotRecord, PilotRow};

/// Errors raised while fetching pilot records.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON pilot table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV pilot table: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported pilot table format: {0}")]
    UnsupportedFormat(String),

    #[error("pilot table unavailable: {0}")]
    Unavailable(String),
}

/// Kind of change reported by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// The table changed in some unspecified way (file rewritten, missed notices).
    Modified,
}

/// "Something changed" notification from a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub kind: ChangeKind,
    pub at: DateTime<Utc>,
}

impl ChangeNotice {
    #[must_use]
    pub fn now(kind: ChangeKind) -> Self {
        Self { kind, at: Utc::now() }
    }
}

/// Receiving end of a source's change notifications.
///
/// Dropping the subscription releases it.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<ChangeNotice>,
}

impl Subscription {
    #[must_use]
    pub fn new(rx: broadcast::Receiver<ChangeNotice>) -> Self {
        Self { rx }
    }

    /// Wait for the next notice. Returns `None` once the source is gone.
    ///
    /// If notices were dropped because the receiver fell behind, a single
    /// [`ChangeKind::Modified`] notice stands in for all of them.
    pub async fn recv(&mut self) -> Option<ChangeNotice> {
        match self.rx.recv().await {
            Ok(notice) => Some(notice),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Change subscription lagged, {skipped} notices skipped");
                Some(ChangeNotice::now(ChangeKind::Modified))
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

/// A pilot table the board can read and watch.
pub trait DataSource {
    /// Every pilot with a window, sorted ascending by window.
    fn fetch(&self) -> impl Future<Output = Result<Vec<PilotRecord>, SourceError>> + Send;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> Subscription;
}

/// The board query: keep rows that have a window, stable-sorted by window.
///
/// Pilots within one window keep their table order.
#[must_use]
pub fn select_windowed<I>(rows: I) -> Vec<PilotRecord>
where
    I: IntoIterator<Item = PilotRow>,
{
    let mut records: Vec<PilotRecord> = rows.into_iter().filter_map(PilotRow::into_record).collect();
    records.sort_by(|a, b| a.window_id.cmp(&b.window_id));
    records
}
