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

//! Pilot data model.
//!
//! A [`PilotRecord`] is one pilot assigned to one window. Records arrive from a
//! data source as [`PilotRow`]s, whose window is optional; only rows with a
//! window become records (see [`crate::source::select_windowed`]).

mod category;

pub use category::{presentation_for, Category, Presentation};

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Pilot identifier. The data source may use text or numeric keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PilotId {
    /// Numeric primary key.
    Number(i64),
    /// Text primary key (e.g., a UUID).
    Text(String),
}

impl fmt::Display for PilotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PilotId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for PilotId {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<&str> for PilotId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Window ("janela") identifier, the grouping key.
///
/// Tables key windows either by integer or by text. Integer keys compare
/// numerically and sort before text keys; text keys compare as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowId {
    Number(i64),
    Text(String),
}

impl WindowId {
    /// Text window key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self::Text(id.into())
    }
}

impl Ord for WindowId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for WindowId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<i64> for WindowId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// One pilot in one window. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PilotRecord {
    /// Stable record identifier.
    pub id: PilotId,
    /// Display name.
    pub name: String,
    /// Badge number shown prominently on the board.
    pub number: i64,
    /// Raw category as stored by the source. Not validated.
    pub category: String,
    /// Window this pilot belongs to.
    pub window_id: WindowId,
}

impl PilotRecord {
    #[must_use]
    pub fn new(
        id: impl Into<PilotId>,
        name: impl Into<String>,
        number: i64,
        category: impl Into<String>,
        window_id: impl Into<WindowId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            number,
            category: category.into(),
            window_id: window_id.into(),
        }
    }

    /// Parsed category; unknown values land in [`Category::Other`].
    #[must_use]
    pub fn category(&self) -> Category {
        Category::parse(&self.category)
    }

    #[must_use]
    pub fn presentation(&self) -> Presentation {
        presentation_for(Some(self.category.as_str()))
    }
}

/// A pilot row as stored by the data source.
///
/// Accepts both English field names and the column names of the pilot table
/// (`nome`, `senha`, `categoria`, `janela_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotRow {
    pub id: PilotId,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "senha")]
    pub number: i64,
    #[serde(alias = "categoria", default)]
    pub category: Option<String>,
    #[serde(alias = "janela_id", default)]
    pub window_id: Option<WindowId>,
}

impl PilotRow {
    /// Convert into a record. Rows without a window are not on the board.
    #[must_use]
    pub fn into_record(self) -> Option<PilotRecord> {
        let window_id = self.window_id?;
        Some(PilotRecord {
            id: self.id,
            name: self.name,
            number: self.number,
            category: self.category.unwrap_or_default(),
            window_id,
        })
    }
}

impl From<PilotRecord> for PilotRow {
    fn from(record: PilotRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            number: record.number,
            category: Some(record.category),
            window_id: Some(record.window_id),
        }
    }
}
