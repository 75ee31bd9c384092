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

//! In-process pilot table.

use std::sync::{Arc, RwLock};

use log::warn;
use tokio::sync::broadcast;

use super::{select_windowed, ChangeKind, ChangeNotice, DataSource, SourceError, Subscription};
use crate::pilot::{PilotId, PilotRecord, PilotRow};

const NOTICE_CHANNEL_CAPACITY: usize = 64;

/// Pilot table held in memory. Clones share the same table.
///
/// Every mutation publishes a [`ChangeNotice`] to subscribers.
#[derive(Debug, Clone)]
pub struct MemorySource {
    rows: Arc<RwLock<Vec<PilotRow>>>,
    notify_tx: broadcast::Sender<ChangeNotice>,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MemorySource {
    #[must_use]
    pub fn new(rows: Vec<PilotRow>) -> Self {
        let (notify_tx, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            rows: Arc::new(RwLock::new(rows)),
            notify_tx,
        }
    }

    /// Build a table from records that all have a window.
    #[must_use]
    pub fn from_records(records: Vec<PilotRecord>) -> Self {
        Self::new(records.into_iter().map(PilotRow::from).collect())
    }

    /// Number of rows, including rows without a window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a row. Returns whether the table accepted it.
    pub fn insert(&self, row: PilotRow) -> bool {
        match self.rows.write() {
            Ok(mut rows) => rows.push(row),
            Err(e) => {
                warn!("Pilot table lock poisoned, insert dropped: {e}");
                return false;
            }
        }
        self.notify(ChangeKind::Insert);
        true
    }

    /// Apply `change` to the row with `id`. Returns whether a row was found.
    pub fn update<F>(&self, id: &PilotId, change: F) -> bool
    where
        F: FnOnce(&mut PilotRow),
    {
        let found = match self.rows.write() {
            Ok(mut rows) => match rows.iter_mut().find(|r| &r.id == id) {
                Some(row) => {
                    change(row);
                    true
                }
                None => false,
            },
            Err(e) => {
                warn!("Pilot table lock poisoned: {e}");
                false
            }
        };
        if found {
            self.notify(ChangeKind::Update);
        }
        found
    }

    /// Delete the row with `id`. Returns whether a row was removed.
    pub fn remove(&self, id: &PilotId) -> bool {
        let removed = self.rows.write().is_ok_and(|mut rows| {
            let before = rows.len();
            rows.retain(|r| &r.id != id);
            rows.len() != before
        });
        if removed {
            self.notify(ChangeKind::Delete);
        }
        removed
    }

    /// Swap the whole table. Returns whether the table accepted it.
    pub fn replace(&self, new_rows: Vec<PilotRow>) -> bool {
        match self.rows.write() {
            Ok(mut rows) => *rows = new_rows,
            Err(e) => {
                warn!("Pilot table lock poisoned, replace dropped: {e}");
                return false;
            }
        }
        self.notify(ChangeKind::Modified);
        true
    }

    fn notify(&self, kind: ChangeKind) {
        // No subscribers is fine.
        let _ = self.notify_tx.send(ChangeNotice::now(kind));
    }
}

impl DataSource for MemorySource {
    async fn fetch(&self) -> Result<Vec<PilotRecord>, SourceError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| SourceError::Unavailable(e.to_string()))?
            .clone();
        Ok(select_windowed(rows))
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.notify_tx.subscribe())
    }
}
