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

//! Console rendering of board snapshots.
//!
//! Two outputs are supported: a human-readable text board and one JSON line
//! per snapshot for piping into other displays. Both only read the snapshot.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use janela_client::{BoardSnapshot, Cluster};
use serde::Serialize;

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_BOLD: &str = "\x1b[1m";

/// Text renderer for the console board
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer {
    use_color: bool,
}

impl TextRenderer {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Render the full board: current window, then the rotating queue
    pub fn render(&self, snapshot: &BoardSnapshot) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{}", self.bold("JANELA ATUAL"));
        match snapshot.current() {
            Some(current) => self.render_card(&mut out, current),
            None => out.push_str("  (nenhuma janela ativa)\n"),
        }

        out.push('\n');
        let _ = writeln!(out, "{}", self.bold("PRÓXIMAS JANELAS"));
        match snapshot.visible() {
            Some(visible) => {
                self.render_card(&mut out, visible);
                let _ = writeln!(out, "  {}", dots(snapshot.pending().len(), snapshot.visible_index));
            }
            None => out.push_str("  Fila vazia\n"),
        }

        if let Some(at) = snapshot.refreshed_at {
            let local: DateTime<Local> = at.into();
            let _ = writeln!(out, "\natualizado {}", local.format("%H:%M:%S"));
        }

        out
    }

    fn render_card(&self, out: &mut String, cluster: &Cluster) {
        let title = card_title(cluster);
        if self.use_color {
            let code = cluster.presentation().ansi_code();
            let _ = writeln!(out, "  {code}{ANSI_BOLD}[{title}]{ANSI_RESET}  janela {}", cluster.window_id());
        } else {
            let _ = writeln!(out, "  [{title}]  janela {}", cluster.window_id());
        }

        for pilot in cluster.pilots() {
            let _ = writeln!(out, "    {:>4}  {}", pilot.number, pilot.name);
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.use_color {
            format!("{ANSI_BOLD}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

/// Card heading: the window's category in upper case
fn card_title(cluster: &Cluster) -> String {
    let category = cluster.category().trim();
    if category.is_empty() {
        "SEM CATEGORIA".to_string()
    } else {
        category.to_uppercase()
    }
}

/// Position indicator for the rotating queue, e.g. "○ ● ○"
fn dots(len: usize, visible_index: usize) -> String {
    (0..len)
        .map(|i| if i == visible_index { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serializable view of a snapshot for JSON-lines output
#[derive(Debug, Serialize)]
pub struct SnapshotView<'a> {
    pub current: Option<&'a Cluster>,
    pub pending: &'a [Cluster],
    pub visible_index: usize,
    pub refreshed_at: Option<String>,
    pub refresh_count: u64,
}

impl<'a> From<&'a BoardSnapshot> for SnapshotView<'a> {
    fn from(snapshot: &'a BoardSnapshot) -> Self {
        Self {
            current: snapshot.current(),
            pending: snapshot.pending(),
            visible_index: snapshot.visible_index,
            refreshed_at: snapshot.refreshed_at.map(|at: DateTime<Utc>| at.to_rfc3339()),
            refresh_count: snapshot.refresh_count,
        }
    }
}

/// Render a snapshot as a single JSON line
pub fn render_json(snapshot: &BoardSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SnapshotView::from(snapshot))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use janela_client::{group, PilotRecord};

    use super::*;

    fn snapshot(records: Vec<PilotRecord>, visible_index: usize) -> BoardSnapshot {
        BoardSnapshot {
            queue: Arc::new(group(records)),
            visible_index,
            ..Default::default()
        }
    }

    #[test]
    fn test_render_current_and_visible_pending() {
        let snap = snapshot(
            vec![
                PilotRecord::new(1, "Ana", 10, "jato", "A"),
                PilotRecord::new(2, "Bia", 11, "jato", "A"),
                PilotRecord::new(3, "Caio", 12, "escala", "B"),
                PilotRecord::new(4, "Duda", 13, "acrobatico", "C"),
            ],
            1,
        );
        let text = TextRenderer::new(false).render(&snap);

        assert!(text.contains("JANELA ATUAL\n  [JATO]  janela A"));
        assert!(text.contains("  10  Ana"));
        assert!(text.contains("[ACROBATICO]  janela C"));
        assert!(!text.contains("Caio"));
        assert!(text.contains("○ ●"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_render_empty_queue() {
        let snap = snapshot(vec![PilotRecord::new(1, "Ana", 10, "", "A")], 0);
        let text = TextRenderer::new(false).render(&snap);
        assert!(text.contains("[SEM CATEGORIA]"));
        assert!(text.contains("Fila vazia"));
    }

    #[test]
    fn test_render_no_windows() {
        let text = TextRenderer::new(false).render(&BoardSnapshot::default());
        assert!(text.contains("nenhuma janela ativa"));
        assert!(text.contains("Fila vazia"));
    }

    #[test]
    fn test_render_color_uses_presentation() {
        let snap = snapshot(vec![PilotRecord::new(1, "Ana", 10, "jet", "A")], 0);
        let text = TextRenderer::new(true).render(&snap);
        assert!(text.contains("\x1b[32m"));
    }

    #[test]
    fn test_render_json_line() {
        let snap = snapshot(
            vec![
                PilotRecord::new(1, "Ana", 10, "jet", "A"),
                PilotRecord::new("x", "Bia", 11, "escala", "B"),
            ],
            0,
        );
        let line = render_json(&snap).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["current"]["window_id"], "A");
        assert_eq!(value["pending"][0]["pilots"][0]["id"], "x");
        assert_eq!(value["visible_index"], 0);
        assert!(!line.contains('\n'));
    }
}
