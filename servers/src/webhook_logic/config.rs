use clap::Parser;
use lib_common::SIGNAL_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "TradingView webhook signal relay server", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "PORT", help = "Port to listen on for webhook deliveries.")]
    pub port: Option<u16>,

    #[clap(long, env = "WEBHOOK_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "WEBHOOK_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "WEBHOOK_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "SIGNAL_CAPACITY", help = "Maximum number of signals retained in the buffer.")]
    pub capacity: Option<usize>,

    #[clap(long, env = "SIGNALS_FILE", help = "Optional JSON file to mirror incoming signals into.")]
    pub signals_file: Option<PathBuf>,

    #[clap(long, env = "REDIS_URL", help = "Optional Redis URL to mirror incoming signals into (takes precedence over the file mirror).")]
    pub redis_url: Option<String>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            capacity: other.capacity.or(self.capacity),
            signals_file: other.signals_file.or(self.signals_file),
            redis_url: other.redis_url.or(self.redis_url),
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(5000)
    }

    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or(SIGNAL_CAPACITY)
    }
}

pub fn load_config() -> Config {
    // 1. Load defaults
    let default_config = Config {
        port: Some(5000),
        log_dir: Some(PathBuf::from("./logs")),
        log_level: Some("info".to_string()),
        capacity: Some(SIGNAL_CAPACITY),
        ..Default::default()
    };

    // 2. Layer the environment / CLI on top to discover a config file path
    let cli_config = Config::parse();
    let config_file_path = cli_config
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("webhook.config.json"));

    // 3. Load the optional JSON config file
    let file_config = match fs::read_to_string(&config_file_path) {
        Ok(contents) => match serde_json::from_str::<Config>(&contents) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Ignoring malformed config file {}: {}",
                    config_file_path.display(),
                    e
                );
                Config::default()
            }
        },
        Err(_) => Config::default(),
    };

    // Later layers win: defaults < config file < env / CLI
    default_config.merge(file_config).merge(cli_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_the_overriding_layer() {
        let base = Config {
            port: Some(5000),
            log_level: Some("info".to_string()),
            ..Default::default()
        };
        let overlay = Config {
            port: Some(8080),
            ..Default::default()
        };

        let merged = base.merge(overlay);
        assert_eq!(merged.port(), 8080);
        // Untouched fields fall through to the base layer.
        assert_eq!(merged.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::default();
        assert_eq!(config.port(), 5000);
        assert_eq!(config.capacity(), SIGNAL_CAPACITY);
    }

    #[test]
    fn config_file_fields_deserialize_in_camel_case() {
        let config: Config =
            serde_json::from_str(r#"{"port": 9000, "redisUrl": "redis://127.0.0.1/"}"#).unwrap();
        assert_eq!(config.port(), 9000);
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1/"));
    }
}
