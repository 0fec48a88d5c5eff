pub mod settings;

pub use settings::{Config, DomainService, LoggingConfig, OutputConfig, PollingConfig, ServicesConfig, TimezoneConfig};
