//! `config.ron` loading and mapping onto engine settings.
//!
//! Every field is optional in the file; anything missing keeps its default.
//! Command-line flags are applied on top by [`AppConfig::apply_overrides`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use converter_engine::{BackendKind, BackendSettings, RemoteSettings, StubSettings, TimerSettings};
use converter_logging::converter_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "config.ron";
pub const APP_DIR_NAME: &str = "sql2oracle";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path:?} not found")]
    Missing { path: PathBuf },
    #[error("failed to read config file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub remote: RemoteConfig,
    pub stub: StubConfig,
    pub timers: TimerConfig,
    pub output_dir: PathBuf,
    pub session_ttl_hours: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            remote: RemoteConfig::default(),
            stub: StubConfig::default(),
            timers: TimerConfig::default(),
            output_dir: PathBuf::from("converted"),
            session_ttl_hours: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub field_name: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_response_bytes: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        let defaults = RemoteSettings::default();
        Self {
            endpoint: defaults.endpoint,
            field_name: defaults.field_name,
            connect_timeout_ms: millis(defaults.connect_timeout),
            request_timeout_ms: millis(defaults.request_timeout),
            max_response_bytes: defaults.max_response_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    pub min_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for StubConfig {
    fn default() -> Self {
        let defaults = StubSettings::default();
        Self {
            min_delay_ms: millis(defaults.min_delay),
            max_jitter_ms: millis(defaults.max_jitter),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub progress_interval_ms: u64,
    pub elapsed_interval_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        let defaults = TimerSettings::default();
        Self {
            progress_interval_ms: millis(defaults.progress_interval),
            elapsed_interval_ms: millis(defaults.elapsed_interval),
        }
    }
}

/// Values given on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend: Option<BackendKind>,
    pub endpoint: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Loads `explicit` if given (it must exist), otherwise the per-user
    /// config file, falling back to defaults when that file is absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path, true),
            None => match default_config_path() {
                Some(path) => Self::load_from(&path, false),
                None => Ok(Self::default()),
            },
        }
    }

    fn load_from(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if required {
                    return Err(ConfigError::Missing {
                        path: path.to_path_buf(),
                    });
                }
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        converter_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        ron::from_str(content).map_err(|err| err.to_string())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
        if let Some(endpoint) = overrides.endpoint {
            self.remote.endpoint = endpoint;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
    }

    pub fn backend_settings(&self) -> BackendSettings {
        match self.backend {
            BackendKind::Stub => BackendSettings::Stub(StubSettings {
                min_delay: Duration::from_millis(self.stub.min_delay_ms),
                max_jitter: Duration::from_millis(self.stub.max_jitter_ms),
            }),
            BackendKind::Remote => BackendSettings::Remote(RemoteSettings {
                endpoint: self.remote.endpoint.clone(),
                field_name: self.remote.field_name.clone(),
                connect_timeout: Duration::from_millis(self.remote.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.remote.request_timeout_ms),
                max_response_bytes: self.remote.max_response_bytes,
            }),
        }
    }

    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            progress_interval: Duration::from_millis(self.timers.progress_interval_ms),
            elapsed_interval: Duration::from_millis(self.timers.elapsed_interval_ms),
        }
    }
}

/// `<config dir>/sql2oracle`, or the working directory if the platform has none.
pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILENAME))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::parse("()").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backend, BackendKind::Remote);
        assert_eq!(config.remote.endpoint, "http://localhost:5000/convert-multiple");
        assert_eq!(config.remote.field_name, "files");
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = AppConfig::parse(
            r#"(
                backend: stub,
                stub: (min_delay_ms: 0),
                output_dir: "out",
            )"#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Stub);
        assert_eq!(config.stub.min_delay_ms, 0);
        assert_eq!(config.stub.max_jitter_ms, 2000);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.timers, TimerConfig::default());

        match config.backend_settings() {
            BackendSettings::Stub(settings) => {
                assert_eq!(settings.min_delay, Duration::ZERO);
                assert_eq!(settings.max_jitter, Duration::from_secs(2));
            }
            other => panic!("unexpected backend settings: {other:?}"),
        }
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = AppConfig::parse(r#"(backend: stub, output_dir: "out")"#).unwrap();
        config.apply_overrides(ConfigOverrides {
            backend: Some(BackendKind::Remote),
            endpoint: Some("http://converter.internal:8080/convert-multiple".to_string()),
            output_dir: None,
        });

        assert_eq!(config.output_dir, PathBuf::from("out"));
        match config.backend_settings() {
            BackendSettings::Remote(settings) => {
                assert_eq!(
                    settings.endpoint,
                    "http://converter.internal:8080/convert-multiple"
                );
                assert_eq!(settings.request_timeout, Duration::from_secs(300));
            }
            other => panic!("unexpected backend settings: {other:?}"),
        }
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = AppConfig::load(Some(&temp.path().join("nope.ron"))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(&path, "(backend: carrier_pigeon)").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
