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

//! Grouping of pilot records into window clusters.
//!
//! [`group`] partitions a record list into [`Cluster`]s keyed by window. The
//! cluster order is the order in which each window is first seen, tracked with
//! an explicit index so it never depends on map iteration order.

use std::collections::HashMap;

use serde::Serialize;

use crate::pilot::{presentation_for, PilotRecord, Presentation, WindowId};

/// Pilots sharing one window, in encounter order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    window_id: WindowId,
    pilots: Vec<PilotRecord>,
}

impl Cluster {
    fn start(first: PilotRecord) -> Self {
        Self {
            window_id: first.window_id.clone(),
            pilots: vec![first],
        }
    }

    #[must_use]
    pub fn window_id(&self) -> &WindowId {
        &self.window_id
    }

    #[must_use]
    pub fn pilots(&self) -> &[PilotRecord] {
        &self.pilots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pilots.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pilots.is_empty()
    }

    /// Representative category, taken from the first pilot.
    #[must_use]
    pub fn category(&self) -> &str {
        self.pilots.first().map_or("", |p| p.category.as_str())
    }

    #[must_use]
    pub fn presentation(&self) -> Presentation {
        presentation_for(Some(self.category()))
    }

    /// Whether every pilot in the cluster shares the representative category.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        let first = self.category();
        self.pilots.iter().all(|p| p.category == first)
    }
}

/// Result of grouping: the current window and the rotation queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueState {
    /// Window on display now. `None` means no active window.
    pub current: Option<Cluster>,
    /// Upcoming windows, in order.
    pub pending: Vec<Cluster>,
}

impl QueueState {
    /// Total number of clusters, current included.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        usize::from(self.current.is_some()) + self.pending.len()
    }

    /// Total number of pilots across all clusters.
    #[must_use]
    pub fn pilot_count(&self) -> usize {
        self.clusters().map(Cluster::len).sum()
    }

    /// Every cluster in board order, current first.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.current.iter().chain(self.pending.iter())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

/// Partition `records` into clusters by window.
///
/// The input is expected to be sorted by window already; that is the data
/// source's job and is not re-checked. Unsorted input still yields a valid
/// partition, ordered by first appearance.
#[must_use]
pub fn group<I>(records: I) -> QueueState
where
    I: IntoIterator<Item = PilotRecord>,
{
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut index: HashMap<WindowId, usize> = HashMap::new();

    for record in records {
        if let Some(&slot) = index.get(&record.window_id) {
            clusters[slot].pilots.push(record);
        } else {
            index.insert(record.window_id.clone(), clusters.len());
            clusters.push(Cluster::start(record));
        }
    }

    let mut ordered = clusters.into_iter();
    let current = ordered.next();
    QueueState {
        current,
        pending: ordered.collect(),
    }
}
