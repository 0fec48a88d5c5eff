use crate::analysis::devices::{DeviceFilter, DeviceSort};
use crate::models::{Domain, SeverityLevel};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "idswatch")]
#[command(about = "Terminal dashboard for IoT, CICIDS2017 and NSL-KDD intrusion detection services")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Override timezone
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable colorized table output
    #[arg(long, global = true)]
    pub colored: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize fresh configuration
    Init,
    /// Set configuration value
    Set {
        /// Configuration key (e.g., polling.live_interval_secs)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand)]
pub enum ScanAction {
    /// Start a device scan and wait for the results
    Start {
        /// Network to scan, in CIDR notation
        #[arg(long, default_value = crate::client::scan::DEFAULT_NETWORK_RANGE)]
        range: String,

        /// Only start the scan, don't wait for it
        #[arg(long)]
        no_wait: bool,

        #[arg(long, value_enum, default_value_t = DeviceFilter::All)]
        filter: DeviceFilter,

        #[arg(long, value_enum, default_value_t = DeviceSort::Name)]
        sort: DeviceSort,
    },
    /// Show progress of the running scan
    Progress,
    /// Show devices found by the last scan
    Results {
        #[arg(long, value_enum, default_value_t = DeviceFilter::All)]
        filter: DeviceFilter,

        #[arg(long, value_enum, default_value_t = DeviceSort::Name)]
        sort: DeviceSort,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Live dashboard of all detection services
    Watch {
        /// Dashboard refresh rate in milliseconds
        #[arg(long, default_value = "200")]
        refresh_rate: u64,
    },

    /// Poll every service once and show what would alert
    Latest,

    /// Recent attacks of one service
    Details {
        #[arg(value_enum)]
        domain: Domain,
    },

    /// Logged detections of one service
    History {
        #[arg(value_enum)]
        domain: Domain,

        /// Exact attack type to keep ("all" keeps every type)
        #[arg(long = "type")]
        attack_type: Option<String>,

        /// Keep entries at or above this severity
        #[arg(long, value_enum)]
        min_severity: Option<SeverityLevel>,

        /// Start of the time range (YYYY-MM-DD[ HH:MM])
        #[arg(long)]
        since: Option<String>,

        /// End of the time range (YYYY-MM-DD[ HH:MM])
        #[arg(long)]
        until: Option<String>,

        /// Page to show (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Write the filtered entries to a CSV file
        #[arg(long)]
        export: Option<String>,

        /// List the attack types present in the logs
        #[arg(long)]
        list_types: bool,
    },

    /// Device scanning
    Scan {
        #[command(subcommand)]
        action: ScanAction,
    },

    /// Sign in to the auth service
    Login {
        #[arg(long)]
        username: String,

        /// Read from IDSWATCH_PASSWORD when omitted
        #[arg(long, env = "IDSWATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account (requires the admin password)
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "IDSWATCH_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, env = "IDSWATCH_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: String,
    },

    /// Show the severity a label gets
    Classify {
        #[arg(value_enum)]
        domain: Domain,

        label: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}
