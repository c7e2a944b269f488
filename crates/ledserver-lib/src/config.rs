//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::render::RenderMode;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# ledserver configuration — changes made outside the app may be overwritten.\n\n";

/// Default UDP listen port.
pub const DEFAULT_PORT: u16 = 1230;

/// Which datagram transport the server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// UDP socket bound to `host:port`.
    Udp,
    /// ZeroMQ SUB socket bound to `tcp://host:port`.
    PubSub,
}

impl Default for Transport {
    fn default() -> Self {
        Transport::Udp
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Udp => write!(f, "udp"),
            Transport::PubSub => write!(f, "pubsub"),
        }
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "udp" => Ok(Transport::Udp),
            "pubsub" => Ok(Transport::PubSub),
            other => Err(format!(
                "unknown transport: {other} (use \"udp\" or \"pubsub\")"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Listen endpoint: `host:port` for UDP, `tcp://host:port` for pubsub.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Datagram transport. Default: "udp".
    #[serde(default)]
    pub transport: Transport,

    /// Number of pixels on the physical strip. Default: 60.
    #[serde(default = "default_strip_length")]
    pub strip_length: usize,

    /// Render policy: "message" (honor per-update render flags) or
    /// "periodic" (fixed cadence). Default: "message".
    #[serde(default)]
    pub render_mode: RenderMode,

    /// Renders per second in periodic mode. Default: 15.
    #[serde(default = "default_render_rate")]
    pub render_rate: u32,
}

fn default_listen() -> String {
    format!("0.0.0.0:{DEFAULT_PORT}")
}

fn default_strip_length() -> usize {
    60
}

fn default_render_rate() -> u32 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: default_listen(),
            transport: Transport::Udp,
            strip_length: default_strip_length(),
            render_mode: RenderMode::default(),
            render_rate: default_render_rate(),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ledserver"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from the default path, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from the default platform path, returning parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Load config from an arbitrary path, returning the config and any
    /// parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Save config to an arbitrary path atomically (temp file, then rename).
    ///
    /// A header comment is prepended to warn that manual edits may be
    /// overwritten.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save config to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// Check the configuration before the server starts.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.strip_length == 0 {
            return Err("strip_length must be at least 1".into());
        }
        if self.render_mode == RenderMode::Periodic && self.render_rate == 0 {
            return Err("render_rate must be at least 1 in periodic mode".into());
        }
        match self.transport {
            Transport::Udp => {
                if self.listen.starts_with("tcp://") {
                    return Err(format!(
                        "udp transport expects host:port, got {}",
                        self.listen
                    ));
                }
            }
            Transport::PubSub => {
                if !self.listen.starts_with("tcp://") {
                    return Err(format!(
                        "pubsub transport expects tcp://host:port, got {}",
                        self.listen
                    ));
                }
            }
        }
        Ok(())
    }
}
