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

//! Pilot table stored in a file, watched by polling.
//!
//! The file is either a JSON array of rows or a CSV table with a header
//! line. A background task polls the file's modification time, length and a
//! content hash, and publishes a [`ChangeNotice`] whenever any of them differs
//! from the last observation. The hash catches same-size rewrites on
//! filesystems with coarse timestamps.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{select_windowed, ChangeKind, ChangeNotice, DataSource, SourceError, Subscription};
use crate::pilot::{PilotRecord, PilotRow};

/// On-disk encoding of the pilot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    /// Infer the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(SourceError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Decode a full table.
    pub fn decode(self, bytes: &[u8]) -> Result<Vec<PilotRow>, SourceError> {
        match self {
            Self::Json => Ok(serde_json::from_slice(bytes)?),
            Self::Csv => {
                let mut reader = csv::Reader::from_reader(bytes);
                let rows = reader.deserialize().collect::<Result<Vec<PilotRow>, _>>()?;
                Ok(rows)
            }
        }
    }
}

/// Configuration for a [`FileSource`].
#[derive(Debug, Clone)]
pub struct FileSourceConfig {
    /// Path to the pilot table.
    pub path: PathBuf,
    /// Table encoding; inferred from the extension when `None`.
    pub format: Option<FileFormat>,
    /// How often the file's modification time is checked.
    pub poll_interval: Duration,
    /// Channel capacity for change notices.
    pub channel_capacity: usize,
}

impl Default for FileSourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pilots.json"),
            format: None,
            poll_interval: Duration::from_secs(1),
            channel_capacity: 64,
        }
    }
}

/// File-backed pilot table.
///
/// The watch task stops when the source is shut down or dropped.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    format: FileFormat,
    notify_tx: broadcast::Sender<ChangeNotice>,
    cancel_token: CancellationToken,
}

impl FileSource {
    /// Start watching the configured file. Must be called inside a tokio runtime.
    pub fn spawn(config: FileSourceConfig) -> Result<Self, SourceError> {
        let format = match config.format {
            Some(format) => format,
            None => FileFormat::from_path(&config.path)?,
        };
        let (notify_tx, _) = broadcast::channel(config.channel_capacity.max(1));
        let cancel_token = CancellationToken::new();

        let task_path = config.path.clone();
        let task_tx = notify_tx.clone();
        let task_cancel = cancel_token.clone();
        let poll_interval = config.poll_interval.max(Duration::from_millis(10));

        tokio::spawn(async move {
            watch_loop(task_path, task_tx, task_cancel, poll_interval).await;
        });

        info!("Watching pilot table {} ({format:?})", config.path.display());

        Ok(Self {
            path: config.path,
            format,
            notify_tx,
            cancel_token,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Stop the watch task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for FileSource {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl DataSource for FileSource {
    async fn fetch(&self) -> Result<Vec<PilotRecord>, SourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let rows = self.format.decode(&bytes)?;
        debug!("Read {} rows from {}", rows.len(), self.path.display());
        Ok(select_windowed(rows))
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.notify_tx.subscribe())
    }
}

/// What the watcher last saw of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
    digest: u64,
}

async fn stamp(path: &Path) -> Option<FileStamp> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    let bytes = tokio::fs::read(path).await.ok()?;
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    Some(FileStamp {
        modified: meta.modified().ok(),
        len: meta.len(),
        digest: hasher.finish(),
    })
}

async fn watch_loop(
    path: PathBuf,
    notify_tx: broadcast::Sender<ChangeNotice>,
    cancel_token: CancellationToken,
    poll_interval: Duration,
) {
    let mut last_seen = stamp(&path).await;
    if last_seen.is_none() {
        warn!("Pilot table {} not found, waiting for it", path.display());
    }

    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = cancel_token.cancelled() => {
                info!("Stopped watching {}", path.display());
                return;
            }
        }

        let seen = stamp(&path).await;
        if seen == last_seen {
            continue;
        }

        match (&last_seen, &seen) {
            (None, Some(_)) => info!("Pilot table {} appeared", path.display()),
            (Some(_), None) => warn!("Pilot table {} disappeared", path.display()),
            _ => debug!("Pilot table {} changed", path.display()),
        }
        last_seen = seen;

        // No subscribers yet is fine; they fetch on start.
        let _ = notify_tx.send(ChangeNotice::now(ChangeKind::Modified));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pilot::PilotId;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("janela-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a/pilots.JSON")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("pilots.csv")).unwrap(), FileFormat::Csv);
        assert!(matches!(
            FileFormat::from_path(Path::new("pilots.xml")),
            Err(SourceError::UnsupportedFormat(_))
        ));
        assert!(FileFormat::from_path(Path::new("pilots")).is_err());
    }

    #[test]
    fn test_decode_csv_with_table_columns() {
        let csv = "id,nome,senha,categoria,janela_id\n1,Ana,10,jato,B\n2,Bia,11,,\n3,Caio,12,escala,A\n";
        let rows = FileFormat::Csv.decode(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, PilotId::Number(1));
        assert!(rows[1].window_id.is_none());
        assert!(rows[1].category.is_none());

        let records = select_windowed(rows);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Caio", "Ana"]);
    }

    #[test]
    fn test_decode_invalid_json() {
        assert!(matches!(
            FileFormat::Json.decode(b"{not json"),
            Err(SourceError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_io_error() {
        let source = FileSource::spawn(FileSourceConfig {
            path: temp_path("missing.json"),
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(source.fetch().await, Err(SourceError::Io { .. })));
    }

    #[tokio::test]
    async fn test_rewrite_publishes_notice() {
        let path = temp_path("watched.json");
        std::fs::write(&path, r#"[{"id": 1, "nome": "Ana", "senha": 1, "categoria": "jet", "janela_id": "A"}]"#)
            .unwrap();

        let source = FileSource::spawn(FileSourceConfig {
            path: path.clone(),
            poll_interval: Duration::from_millis(20),
            ..Default::default()
        })
        .unwrap();
        let mut sub = source.subscribe();
        assert_eq!(source.fetch().await.unwrap().len(), 1);

        // Let the watcher record the initial stamp, then change size and content.
        tokio::time::sleep(Duration::from_millis(60)).await;
        std::fs::write(
            &path,
            r#"[{"id": 1, "nome": "Ana", "senha": 1, "categoria": "jet", "janela_id": "A"},
                {"id": 2, "nome": "Bia", "senha": 2, "categoria": "jet", "janela_id": "B"}]"#,
        )
        .unwrap();

        let notice = tokio::time::timeout(Duration::from_secs(5), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notice.kind, ChangeKind::Modified);
        assert_eq!(source.fetch().await.unwrap().len(), 2);

        source.shutdown();
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_same_size_rewrite_with_same_mtime_publishes_notice() {
        let path = temp_path("same-size.json");
        let before = r#"[{"id": 1, "nome": "Ana", "senha": 1, "categoria": "jet", "janela_id": "A"}]"#;
        let after = r#"[{"id": 1, "nome": "Ana", "senha": 1, "categoria": "jet", "janela_id": "B"}]"#;
        assert_eq!(before.len(), after.len());
        std::fs::write(&path, before).unwrap();
        let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();

        let source = FileSource::spawn(FileSourceConfig {
            path: path.clone(),
            poll_interval: Duration::from_millis(20),
            ..Default::default()
        })
        .unwrap();
        let mut sub = source.subscribe();

        tokio::time::sleep(Duration::from_millis(60)).await;
        std::fs::write(&path, after).unwrap();
        // Pin the timestamp so only the content tells the rewrite apart.
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        let notice = tokio::time::timeout(Duration::from_secs(5), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notice.kind, ChangeKind::Modified);
        let records = source.fetch().await.unwrap();
        assert_eq!(records[0].window_id, crate::pilot::WindowId::new("B"));

        source.shutdown();
        let _ = std::fs::remove_file(&path);
    }
}
