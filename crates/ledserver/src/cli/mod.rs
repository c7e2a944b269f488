//! CLI subcommands — serve loop, test client, configuration.

mod config_cmd;
mod send;
mod serve;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use ledserver_lib::config::Config;
pub(super) use ledserver_lib::error::Result;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{key:<width$}{value}", width = w);
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Load config from an explicit path, or the default platform path.
pub(super) fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(p) => {
            let (config, warnings) = Config::load_from(p);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the LED server
    Serve {
        /// Listen endpoint (host:port, or tcp://host:port for pubsub)
        #[arg(long)]
        listen: Option<String>,
        /// Transport: "udp" or "pubsub"
        #[arg(long)]
        transport: Option<String>,
        /// Number of pixels on the strip
        #[arg(long)]
        strip_length: Option<usize>,
        /// Render policy: "message" or "periodic"
        #[arg(long)]
        render_mode: Option<String>,
        /// Renders per second in periodic mode
        #[arg(long)]
        render_rate: Option<u32>,
        /// Read configuration from this file instead of the default path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Send a pixel update to a running server (test client)
    Send {
        /// Server address (host:port; tcp://host:port with the pubsub feature)
        #[arg(long, default_value = "127.0.0.1:1230")]
        to: String,
        /// 0-based pixel index
        #[arg(long)]
        index: u32,
        /// Color: hex like "#FF0000" or a name like "red"
        #[arg(long)]
        color: String,
        /// Request an immediate render
        #[arg(long)]
        render: bool,
        /// Send the update this many times
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },

    /// Show current configuration and file paths
    Config {
        /// Read configuration from this file instead of the default path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, json: bool) -> Result<()> {
    match cmd {
        Command::Serve {
            listen,
            transport,
            strip_length,
            render_mode,
            render_rate,
            config,
        } => serve::cmd_serve(
            &serve::ServeArgs {
                listen,
                transport,
                strip_length,
                render_mode,
                render_rate,
            },
            config.as_deref(),
            json,
        ),
        Command::Send {
            to,
            index,
            color,
            render,
            repeat,
        } => {
            if json {
                warn_json_unsupported("send");
            }
            send::cmd_send(&to, index, &color, render, repeat)
        }
        Command::Config { config } => config_cmd::cmd_config(config.as_deref(), json),
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        // Indent key needs +2 for the prefix
        let w = kv_width(&["A:"], &["Very long indent key:"]);
        assert_eq!(w, 25);
    }

    #[test]
    fn kv_width_empty_both() {
        assert_eq!(kv_width(&[], &[]), 0);
    }
}
