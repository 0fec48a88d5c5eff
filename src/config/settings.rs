use crate::alerts::{AlertSettings, ClassifierConfig, KeywordTable};
use crate::models::Domain;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub services: ServicesConfig,
    pub polling: PollingConfig,
    #[serde(default)]
    pub alerts: AlertSettings,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    pub output: OutputConfig,
    pub timezone: TimezoneConfig,
    pub logging: LoggingConfig,
}

/// Endpoints of one detection service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainService {
    pub base_url: String,
    /// Live feed; absent disables the WebSocket subscription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    pub latest_path: String,
    pub details_path: String,
    pub logs_path: String,
}

impl DomainService {
    pub fn default_for(domain: Domain) -> Self {
        let (port, latest, details, logs) = match domain {
            Domain::Iot => (5005, "latest_iot_attack", "iot_attack_details", "iot23_logs2"),
            Domain::Cyber => (5006, "latest_cicids_attack", "cicids_attack_details", "cicid2017_logs2"),
            Domain::Traditional => (5007, "latest_kdd_attack", "kdd_attack_details", "kdd_logs2"),
        };
        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            ws_url: Some(format!("ws://127.0.0.1:{}", port)),
            latest_path: format!("/{}", latest),
            details_path: format!("/{}", details),
            logs_path: format!("/{}", logs),
        }
    }

    pub fn latest_url(&self) -> String {
        join_url(&self.base_url, &self.latest_path)
    }

    pub fn details_url(&self) -> String {
        join_url(&self.base_url, &self.details_path)
    }

    pub fn logs_url(&self) -> String {
        join_url(&self.base_url, &self.logs_path)
    }
}

pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub iot: DomainService,
    pub cyber: DomainService,
    pub traditional: DomainService,
    pub auth_url: String,
    pub scan_url: String,
}

impl ServicesConfig {
    pub fn domain(&self, domain: Domain) -> &DomainService {
        match domain {
            Domain::Iot => &self.iot,
            Domain::Cyber => &self.cyber,
            Domain::Traditional => &self.traditional,
        }
    }

    fn domain_mut(&mut self, domain: Domain) -> &mut DomainService {
        match domain {
            Domain::Iot => &mut self.iot,
            Domain::Cyber => &mut self.cyber,
            Domain::Traditional => &mut self.traditional,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            iot: DomainService::default_for(Domain::Iot),
            cyber: DomainService::default_for(Domain::Cyber),
            traditional: DomainService::default_for(Domain::Traditional),
            auth_url: "http://127.0.0.1:5002".to_string(),
            scan_url: "http://localhost:5012/api".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    pub live_interval_secs: u64,
    pub history_interval_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub colored: bool,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimezoneConfig {
    pub timezone: String, // e.g., "UTC", "Asia/Karachi"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Where the watch dashboard writes its rolling log files
    pub directory: String,
}

impl LoggingConfig {
    /// Log directory with a leading `~` expanded
    pub fn resolved_directory(&self) -> Result<PathBuf> {
        expand_home(&self.directory)
    }
}

pub fn expand_home(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(rest))
    } else if path == "~" {
        dirs::home_dir().context("Failed to determine home directory")
    } else {
        Ok(PathBuf::from(path))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            services: ServicesConfig::default(),
            polling: PollingConfig {
                live_interval_secs: 5,
                history_interval_secs: 10,
                request_timeout_secs: 5,
            },
            alerts: AlertSettings::default(),
            classifier: ClassifierConfig::default(),
            output: OutputConfig {
                colored: false,
                page_size: 50,
            },
            timezone: TimezoneConfig {
                timezone: "UTC".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "~/.local/state/idswatch/logs".to_string(),
            },
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load the default config file, creating it on first use
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = self.to_commented_toml();

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".config").join("idswatch").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        self.alerts.validate()?;
        if self.polling.live_interval_secs == 0 || self.polling.history_interval_secs == 0 {
            anyhow::bail!("Polling intervals must be at least 1 second");
        }
        if self.polling.request_timeout_secs == 0 {
            anyhow::bail!("polling.request_timeout_secs must be at least 1");
        }
        if self.output.page_size == 0 {
            anyhow::bail!("output.page_size must be at least 1");
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid logging.level: {}. Must be one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            );
        }
        self.timezone
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| anyhow::anyhow!("Invalid timezone: {}", self.timezone.timezone))?;
        Ok(())
    }

    /// Generate TOML with comments explaining every option
    pub fn to_commented_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# idswatch Configuration File\n");
        output.push_str("#\n");
        output.push_str("# Every setting has a default; command-line flags override the values below.\n");
        output.push('\n');

        section(&mut output, "SERVICES");
        output.push_str("[services]\n");
        output.push_str("# Authentication service (login / register)\n");
        output.push_str(&format!("auth_url = {}\n", quote(&self.services.auth_url)));
        output.push_str("# Device scan service, including its /api prefix\n");
        output.push_str(&format!("scan_url = {}\n", quote(&self.services.scan_url)));
        output.push('\n');

        for domain in Domain::ALL {
            let service = self.services.domain(domain);
            output.push_str(&format!("# {} detection service\n", domain.display_name()));
            output.push_str(&format!("[services.{}]\n", domain));
            output.push_str(&format!("base_url = {}\n", quote(&service.base_url)));
            match &service.ws_url {
                Some(url) => output.push_str(&format!("ws_url = {}\n", quote(url))),
                None => output.push_str("# ws_url = \"ws://127.0.0.1:5005\"  (unset: no live feed)\n"),
            }
            output.push_str(&format!("latest_path = {}\n", quote(&service.latest_path)));
            output.push_str(&format!("details_path = {}\n", quote(&service.details_path)));
            output.push_str(&format!("logs_path = {}\n", quote(&service.logs_path)));
            output.push('\n');
        }

        section(&mut output, "POLLING");
        output.push_str("[polling]\n");
        output.push_str("# Seconds between polls of the latest-attack endpoints\n");
        output.push_str(&format!("live_interval_secs = {}\n", self.polling.live_interval_secs));
        output.push_str("# Seconds between refreshes of the details tables\n");
        output.push_str(&format!("history_interval_secs = {}\n", self.polling.history_interval_secs));
        output.push_str("# A request slower than this counts as failed\n");
        output.push_str(&format!("request_timeout_secs = {}\n", self.polling.request_timeout_secs));
        output.push('\n');

        section(&mut output, "ALERTS");
        output.push_str("[alerts]\n");
        output.push_str("# How long an alert stays up, per severity. Must not decrease with severity.\n");
        output.push_str(&format!("critical_secs = {}\n", self.alerts.critical_secs));
        output.push_str(&format!("high_secs = {}\n", self.alerts.high_secs));
        output.push_str(&format!("medium_secs = {}\n", self.alerts.medium_secs));
        output.push_str(&format!("low_secs = {}\n", self.alerts.low_secs));
        output.push_str("# Alerts waiting behind the active one. 0 keeps only the first alert.\n");
        output.push_str(&format!("queue_capacity = {}\n", self.alerts.queue_capacity));
        output.push('\n');

        section(&mut output, "CLASSIFIER");
        output.push_str("# Case-insensitive substrings. Normal patterns never alert; then\n");
        output.push_str("# critical, high and medium are tried in order. Anything else is low.\n");
        output.push('\n');
        for domain in Domain::ALL {
            let table = self.classifier.table(domain);
            output.push_str(&format!("[classifier.{}]\n", domain));
            output.push_str(&format!("normal = {}\n", string_array(&table.normal)));
            output.push_str(&format!("critical = {}\n", string_array(&table.critical)));
            output.push_str(&format!("high = {}\n", string_array(&table.high)));
            output.push_str(&format!("medium = {}\n", string_array(&table.medium)));
            output.push('\n');
        }

        section(&mut output, "OUTPUT");
        output.push_str("[output]\n");
        output.push_str("# Colored tables by default (same as --colored)\n");
        output.push_str(&format!("colored = {}\n", self.output.colored));
        output.push_str("# Rows per page in history listings\n");
        output.push_str(&format!("page_size = {}\n", self.output.page_size));
        output.push('\n');

        section(&mut output, "TIMEZONE");
        output.push_str("[timezone]\n");
        output.push_str("# Used to interpret --since/--until and to render times\n");
        output.push_str("# Examples: \"UTC\", \"Asia/Karachi\", \"Europe/London\"\n");
        output.push_str(&format!("timezone = {}\n", quote(&self.timezone.timezone)));
        output.push('\n');

        section(&mut output, "LOGGING");
        output.push_str("[logging]\n");
        output.push_str("# trace, debug, info, warn or error. RUST_LOG takes precedence.\n");
        output.push_str(&format!("level = {}\n", quote(&self.logging.level)));
        output.push_str("# The live dashboard logs here (daily files) since it owns the terminal\n");
        output.push_str(&format!("directory = {}\n", quote(&self.logging.directory)));
        output.push('\n');

        output.push_str("# To reset to defaults: idswatch config init\n");
        output.push_str("# To modify values:     idswatch config set polling.live_interval_secs 10\n");
        output.push_str("# To view current:      idswatch config show\n");

        output
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        updated.apply_value(key, value)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn apply_value(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(rest) = key.strip_prefix("services.") {
            return self.set_service_value(rest, value);
        }
        if let Some(rest) = key.strip_prefix("classifier.") {
            return self.set_classifier_value(rest, value);
        }

        match key {
            "polling.live_interval_secs" => self.polling.live_interval_secs = parse_number(value)?,
            "polling.history_interval_secs" => self.polling.history_interval_secs = parse_number(value)?,
            "polling.request_timeout_secs" => self.polling.request_timeout_secs = parse_number(value)?,
            "alerts.critical_secs" => self.alerts.critical_secs = parse_number(value)?,
            "alerts.high_secs" => self.alerts.high_secs = parse_number(value)?,
            "alerts.medium_secs" => self.alerts.medium_secs = parse_number(value)?,
            "alerts.low_secs" => self.alerts.low_secs = parse_number(value)?,
            "alerts.queue_capacity" => self.alerts.queue_capacity = parse_number(value)?,
            "output.colored" => {
                self.output.colored = value
                    .parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "output.page_size" => self.output.page_size = parse_number(value)?,
            "timezone.timezone" => self.timezone.timezone = value.to_string(),
            "logging.level" => self.logging.level = value.to_lowercase(),
            "logging.directory" => self.logging.directory = value.to_string(),
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }
        Ok(())
    }

    fn set_service_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "auth_url" => self.services.auth_url = parse_http_url(value)?,
            "scan_url" => self.services.scan_url = parse_http_url(value)?,
            _ => {
                let (domain, field) = key
                    .split_once('.')
                    .with_context(|| format!("Unknown configuration key: services.{}", key))?;
                let domain: Domain = domain.parse()?;
                let service = self.services.domain_mut(domain);
                match field {
                    "base_url" => service.base_url = parse_http_url(value)?,
                    "ws_url" => {
                        service.ws_url = if value.trim().is_empty() {
                            None
                        } else if value.starts_with("ws://") || value.starts_with("wss://") {
                            Some(value.to_string())
                        } else {
                            anyhow::bail!("Invalid WebSocket URL: {}. Must start with ws:// or wss://", value);
                        };
                    }
                    "latest_path" => service.latest_path = value.to_string(),
                    "details_path" => service.details_path = value.to_string(),
                    "logs_path" => service.logs_path = value.to_string(),
                    _ => anyhow::bail!("Unknown configuration key: services.{}", key),
                }
            }
        }
        Ok(())
    }

    /// `classifier.<domain>.<tier>` takes a comma-separated keyword list
    fn set_classifier_value(&mut self, key: &str, value: &str) -> Result<()> {
        let (domain, tier) = key
            .split_once('.')
            .with_context(|| format!("Unknown configuration key: classifier.{}", key))?;
        let domain: Domain = domain.parse()?;
        let words: Vec<String> = value
            .split(',')
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        let table: &mut KeywordTable = match domain {
            Domain::Iot => &mut self.classifier.iot,
            Domain::Cyber => &mut self.classifier.cyber,
            Domain::Traditional => &mut self.classifier.traditional,
        };
        match tier {
            "normal" => table.normal = words,
            "critical" => table.critical = words,
            "high" => table.high = words,
            "medium" => table.medium = words,
            _ => anyhow::bail!("Unknown classifier tier: {}. Must be normal, critical, high or medium", tier),
        }
        Ok(())
    }
}

fn section(output: &mut String, title: &str) {
    output.push_str("# =============================================================================\n");
    output.push_str(&format!("# {}\n", title));
    output.push_str("# =============================================================================\n");
    output.push('\n');
}

fn quote(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

fn string_array(values: &[String]) -> String {
    toml::Value::from(values.to_vec()).to_string()
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid number: {}", value))
}

fn parse_http_url(value: &str) -> Result<String> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        anyhow::bail!("Invalid URL: {}. Must start with http:// or https://", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_endpoints() {
        let config = Config::default();
        assert_eq!(
            config.services.iot.latest_url(),
            "http://127.0.0.1:5005/latest_iot_attack"
        );
        assert_eq!(
            config.services.cyber.logs_url(),
            "http://127.0.0.1:5006/cicid2017_logs2"
        );
        assert_eq!(
            config.services.traditional.details_url(),
            "http://127.0.0.1:5007/kdd_attack_details"
        );
        assert_eq!(config.polling.request_timeout_secs, 5);
    }

    #[test]
    fn test_commented_toml_round_trips() {
        let config = Config::default();
        let text = config.to_commented_toml();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_set_value_validates() {
        let mut config = Config::default();
        config.set_value("polling.live_interval_secs", "15").unwrap();
        assert_eq!(config.polling.live_interval_secs, 15);

        assert!(config.set_value("polling.live_interval_secs", "0").is_err());
        assert!(config.set_value("alerts.low_secs", "abc").is_err());
        // Would make low outlast critical
        assert!(config.set_value("alerts.low_secs", "60").is_err());
        assert_eq!(config.alerts.low_secs, 5);
        assert!(config.set_value("alerts.critical_secs", "100000000000000000").is_err());
        assert_eq!(config.alerts.critical_secs, 10);
        assert!(config.set_value("timezone.timezone", "Mars/Base").is_err());
        assert!(config.set_value("nope.key", "1").is_err());
    }

    #[test]
    fn test_set_service_values() {
        let mut config = Config::default();
        config.set_value("services.cicids.base_url", "http://10.0.0.5:9000/").unwrap();
        assert_eq!(config.services.cyber.base_url, "http://10.0.0.5:9000");

        config.set_value("services.iot.ws_url", "").unwrap();
        assert!(config.services.iot.ws_url.is_none());

        assert!(config.set_value("services.iot.base_url", "ftp://host").is_err());
    }

    #[test]
    fn test_set_classifier_keywords() {
        let mut config = Config::default();
        config.set_value("classifier.kdd.high", "r2l, u2r, smurf").unwrap();
        assert_eq!(config.classifier.traditional.high, vec!["r2l", "u2r", "smurf"]);
    }

    #[test]
    fn test_disabled_ws_url_survives_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.set_value("services.traditional.ws_url", "").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.services.traditional.ws_url.is_none());
        assert!(loaded.services.iot.ws_url.is_some());
    }
}
