// Command handlers module
pub mod auth;
pub mod config;
pub mod history;
pub mod scan;
pub mod status;
pub mod watch;

pub use auth::{handle_login_command, handle_register_command};
pub use config::handle_config_action;
pub use history::{HistoryOptions, handle_history_command};
pub use scan::handle_scan_action;
pub use status::{handle_classify_command, handle_details_command, handle_latest_command};
pub use watch::handle_watch_command;

use crate::alerts::SeverityClassifier;
use crate::config::Config;
use crate::output::OutputFormat;
use crate::utils::date_format::parse_timezone;
use anyhow::Result;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;

/// What every command needs: the loaded config with CLI overrides applied,
/// and the output flags
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub timezone: Tz,
    pub json: bool,
    pub colored: bool,
    pub verbose: bool,
}

impl CommandContext {
    pub fn new(
        mut config: Config,
        config_path: PathBuf,
        timezone_override: Option<&str>,
        json: bool,
        colored: bool,
        verbose: bool,
    ) -> Result<Self> {
        if let Some(timezone) = timezone_override {
            config.timezone.timezone = timezone.to_string();
        }
        let timezone = parse_timezone(&config.timezone.timezone)?;
        let colored = (colored || config.output.colored) && !json;
        Ok(Self {
            config,
            config_path,
            timezone,
            json,
            colored,
            verbose,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.polling.request_timeout_secs)
    }

    pub fn classifier(&self) -> SeverityClassifier {
        SeverityClassifier::new(&self.config.classifier)
    }

    /// Render as JSON or as a table, per the `--json` flag
    pub fn render<T: OutputFormat>(&self, value: &T) -> Result<String> {
        if self.json {
            Ok(value.to_json()?)
        } else {
            Ok(value.to_table_with_color(self.colored))
        }
    }

    pub fn print<T: OutputFormat>(&self, value: &T) -> Result<()> {
        println!("{}", self.render(value)?);
        Ok(())
    }
}

/// Report a failed command the way the output mode expects
pub fn handle_error(error: &anyhow::Error, json_output: bool) {
    if json_output {
        let body = serde_json::json!({
            "status": "error",
            "message": format!("{:#}", error),
        });
        println!("{}", body);
    } else {
        eprintln!("Error: {:#}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_applies_overrides() {
        let ctx = CommandContext::new(
            Config::default(),
            PathBuf::from("/tmp/idswatch.toml"),
            Some("Asia/Karachi"),
            true,
            true,
            false,
        )
        .unwrap();
        assert_eq!(ctx.config.timezone.timezone, "Asia/Karachi");
        assert_eq!(ctx.timezone, chrono_tz::Asia::Karachi);
        // JSON output is never colored
        assert!(!ctx.colored);
    }

    #[test]
    fn test_context_rejects_unknown_timezone() {
        let result = CommandContext::new(Config::default(), PathBuf::new(), Some("Nowhere/City"), false, false, false);
        assert!(result.is_err());
    }
}
