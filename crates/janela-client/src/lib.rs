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

//! Grouping and rotation engine for pilot window status boards.
//!
//! A status board shows which window ("janela") of pilots is active now and
//! cycles through the windows that come next. This crate holds everything
//! behind such a board except the drawing:
//!
//! - **Pilot layer**: record types and the category-to-presentation mapping
//! - **Grouper**: partitions a sorted record list into ordered window clusters
//! - **Rotator**: visible index over the pending queue and its periodic timer
//! - **Source layer**: the pilot table query and its change notifications
//! - **Board**: wires all of the above into one background task
//!
//! # Quick Start
//!
//! ```no_run
//! use janela_client::{Board, BoardConfig, MemorySource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = MemorySource::default();
//!     let board = Board::spawn(BoardConfig::default(), source.clone());
//!
//!     let mut updates = board.watch();
//!     while updates.changed().await.is_ok() {
//!         let snapshot = updates.borrow_and_update().clone();
//!         if let Some(current) = snapshot.current() {
//!             println!("now: window {} ({} pilots)", current.window_id(), current.len());
//!         }
//!     }
//! }
//! ```
//!
//! # Grouping Only
//!
//! ```
//! use janela_client::{group, PilotRecord};
//!
//! let state = group(vec![
//!     PilotRecord::new(1, "Ana", 10, "jet", "A"),
//!     PilotRecord::new(2, "Bia", 11, "jet", "A"),
//!     PilotRecord::new(3, "Caio", 12, "escala", "B"),
//! ]);
//!
//! assert_eq!(state.current.as_ref().map(|c| c.len()), Some(2));
//! assert_eq!(state.pending.len(), 1);
//! ```

pub mod board;
pub mod grouper;
pub mod pilot;
pub mod rotator;
pub mod source;

pub use board::{Board, BoardConfig, BoardEvent, BoardSnapshot};
pub use grouper::{group, Cluster, QueueState};
pub use pilot::{presentation_for, Category, PilotId, PilotRecord, PilotRow, Presentation, WindowId};
pub use rotator::{IndexPolicy, RotationConfig, RotationTimer, Rotator, DEFAULT_ROTATION_PERIOD};
pub use source::{
    select_windowed, ChangeKind, ChangeNotice, DataSource, FileFormat, FileSource, FileSourceConfig,
    MemorySource, SourceError, Subscription,
};
