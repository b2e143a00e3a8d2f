// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "EGF_CONFIG_PATH";
pub const ENV_DATA_DIR: &str = "EGF_DATA_DIR";
pub const ENV_SOURCE_URL: &str = "EGF_SOURCE_URL";
pub const DEFAULT_CONFIG_PATH: &str = "config/egf_calendar.toml";

pub const DEFAULT_SOURCE_URL: &str = "https://www.eurogofed.org/calendar/";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory receiving the raw page copy, the artifacts and the snapshot.
    pub data_dir: PathBuf,
    /// Base name for every file written to `data_dir`.
    pub name: String,
    pub source_url: String,
    pub http_timeout_secs: u64,

    pub calendar_name: String,
    pub calendar_timezone: String,

    pub feed_title: String,
    pub feed_description: String,
    /// Public URL of the feed itself (channel link + atom self link).
    pub feed_link: String,
    /// Item link for events without their own website.
    pub default_link: String,
    pub feed_ttl_minutes: u32,

    /// Write a Prometheus textfile here after each run.
    pub metrics_textfile: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            name: "egf-calendar".to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            http_timeout_secs: 30,
            calendar_name: "EGF Tournaments".to_string(),
            calendar_timezone: "Europe/Belgrade".to_string(),
            feed_title: "EGF Tournament Calendar Change Feed".to_string(),
            feed_description: "Get notified when calendar updates".to_string(),
            feed_link: "http://localhost/egf-calendar.rss".to_string(),
            default_link: DEFAULT_SOURCE_URL.to_string(),
            feed_ttl_minutes: 600,
            metrics_textfile: None,
        }
    }
}

impl Config {
    pub fn html_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.html", self.name))
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.name))
    }

    pub fn ical_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.ics", self.name))
    }

    pub fn rss_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.rss", self.name))
    }

    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg = parse_config(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.with_env_overrides()
    }

    /// Load using env var + fallbacks:
    /// 1) $EGF_CONFIG_PATH
    /// 2) config/egf_calendar.toml
    /// 3) built-in defaults
    ///
    /// `EGF_DATA_DIR` and `EGF_SOURCE_URL` override the loaded values.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var(ENV_SOURCE_URL) {
            self.source_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("config: name must not be empty"));
        }
        if self.name.contains(['/', '\\']) {
            return Err(anyhow!("config: name must be a plain file stem"));
        }
        if !self.source_url.starts_with("http://") && !self.source_url.starts_with("https://") {
            return Err(anyhow!("config: source_url must be an http(s) URL"));
        }
        if self.http_timeout_secs == 0 {
            return Err(anyhow!("config: http_timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = parse_config(
            r#"
data_dir = "/var/www/html"
feed_link = "https://feeds.example.org/egf-calendar.rss"
"#,
        )
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/var/www/html"));
        assert_eq!(cfg.feed_link, "https://feeds.example.org/egf-calendar.rss");
        assert_eq!(cfg.name, "egf-calendar");
        assert_eq!(
            cfg.snapshot_path(),
            PathBuf::from("/var/www/html/egf-calendar.json")
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config(r#"data_directory = "x""#).is_err());
    }

    #[test]
    fn validation_catches_bad_values() {
        let cfg = Config {
            name: "a/b".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = Config {
            source_url: "ftp://example.org".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = Config {
            http_timeout_secs: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }
}
