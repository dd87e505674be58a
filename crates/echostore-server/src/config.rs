//! Server configuration
//!
//! Compile-time defaults with runtime environment overrides.
//!
//! # Configuration priority (highest wins)
//!
//! 1. CLI flags (applied by `cmd/echostored`)
//! 2. Environment variables (`from_env`)
//! 3. Library defaults

use std::path::PathBuf;
use std::time::Duration;

use echostore_core::protocol::DEFAULT_PORT;

/// Which backing resource the store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingMode {
    /// Plain file, truncated at start, removed at exit. Timestamps on.
    File,

    /// Record-oriented char device, durable across runs. Timestamps off.
    Device,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,

    /// Listen backlog.
    pub backlog: i32,

    /// File or device backing.
    pub backing: BackingMode,

    /// Backing file path (file mode).
    pub data_path: PathBuf,

    /// Device node path (device mode).
    pub device_path: PathBuf,

    /// Period between injected timestamp records.
    pub timestamp_interval: Duration,

    /// Detach into the background before serving.
    pub daemonize: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backlog: 5,
            backing: BackingMode::File,
            data_path: PathBuf::from("/var/tmp/echostored.data"),
            device_path: PathBuf::from("/dev/aesdchar"),
            timestamp_interval: Duration::from_secs(10),
            daemonize: false,
        }
    }
}

impl ServerConfig {
    /// Defaults with environment overrides applied.
    ///
    /// Environment variables (all optional):
    /// - `ECHOSTORED_PORT` - listening port
    /// - `ECHOSTORED_DATA_FILE` - backing file path
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = env_parse("ECHOSTORED_PORT") {
            config.port = port;
        }
        if let Ok(path) = std::env::var("ECHOSTORED_DATA_FILE") {
            if !path.is_empty() {
                config.data_path = PathBuf::from(path);
            }
        }
        config
    }

    /// Switch to device backing.
    pub fn device(mut self, path: PathBuf) -> Self {
        self.backing = BackingMode::Device;
        self.device_path = path;
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 9000);
        assert_eq!(config.backlog, 5);
        assert_eq!(config.backing, BackingMode::File);
        assert_eq!(config.timestamp_interval, Duration::from_secs(10));
        assert!(!config.daemonize);
    }

    #[test]
    fn test_device_builder() {
        let config = ServerConfig::default().device(PathBuf::from("/dev/recdev0"));
        assert_eq!(config.backing, BackingMode::Device);
        assert_eq!(config.device_path, PathBuf::from("/dev/recdev0"));
    }
}
