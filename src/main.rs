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

mod config;
mod display;

use std::path::PathBuf;

use clap::Parser;
use janela_client::{Board, BoardConfig, FileSource, FileSourceConfig, IndexPolicy, RotationConfig};
use log::{error, info, warn};
use tokio::signal;

use config::AppConfig;
use display::TextRenderer;

/// Console status board: the active pilot window and the rotating queue of
/// upcoming windows, refreshed whenever the pilot table changes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pilot table to display (.json array or .csv with header)
    #[arg(long, value_name = "FILE")]
    records: Option<PathBuf>,

    /// Rotation interval for upcoming windows, in milliseconds
    #[arg(long, value_name = "MS")]
    period_ms: Option<u64>,

    /// How often the pilot table is checked for changes, in milliseconds
    #[arg(long, value_name = "MS")]
    poll_ms: Option<u64>,

    /// Keep the rotation position when the queue changes instead of restarting
    #[arg(long)]
    preserve_index: bool,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Print one JSON line per board change instead of the text board
    #[arg(long)]
    json: bool,

    /// Store the effective settings as the new configuration file
    #[arg(long)]
    save_config: bool,

    /// Print the configuration file path and exit
    #[arg(long)]
    print_config_path: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of the stored configuration
    fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.records {
            config.records_path.clone_from(path);
        }
        if let Some(ms) = self.period_ms {
            config.rotation_period_ms = ms;
        }
        if let Some(ms) = self.poll_ms {
            config.poll_interval_ms = ms;
        }
        if self.preserve_index {
            config.index_policy = IndexPolicy::Preserve;
        }
        if self.no_color {
            config.use_color = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.print_config_path {
        println!("{}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load configuration, using defaults: {e}");
        AppConfig::default()
    });
    args.apply(&mut config);

    if args.save_config {
        config.save()?;
        info!("Configuration saved to {}", AppConfig::get_config_path()?.display());
    }

    info!("Starting janela board");
    info!(
        "Pilot table: {} (rotation every {} ms, {:?} index policy)",
        config.records_path.display(),
        config.rotation_period_ms,
        config.index_policy
    );

    let source = FileSource::spawn(FileSourceConfig {
        path: config.records_path.clone(),
        poll_interval: config.poll_interval(),
        ..Default::default()
    })?;

    let mut board = Board::spawn(
        BoardConfig {
            rotation: RotationConfig {
                period: config.rotation_period(),
                index_policy: config.index_policy,
            },
            ..Default::default()
        },
        source,
    );

    let renderer = TextRenderer::new(config.use_color);
    let mut updates = board.watch();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Board stopped unexpectedly");
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if args.json {
                    match display::render_json(&snapshot) {
                        Ok(line) => println!("{line}"),
                        Err(e) => error!("Failed to encode board snapshot: {e}"),
                    }
                } else {
                    println!("{}", renderer.render(&snapshot));
                }
            }
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Received shutdown signal (Ctrl+C)"),
                    Err(e) => error!("Unable to listen for shutdown signal: {e}"),
                }
                break;
            }
        }
    }

    info!("Shutting down...");
    board.shutdown();
    board.stopped().await;
    Ok(())
}

/// Initialize logging; `RUST_LOG` still takes precedence when set
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "janela-board",
            "--records",
            "/tmp/board.csv",
            "--period-ms",
            "2500",
            "--preserve-index",
            "--no-color",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.records_path, PathBuf::from("/tmp/board.csv"));
        assert_eq!(config.rotation_period_ms, 2500);
        assert_eq!(config.poll_interval_ms, 1_000);
        assert_eq!(config.index_policy, IndexPolicy::Preserve);
        assert!(!config.use_color);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["janela-board"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config, AppConfig::default());
    }
}
