use crate::models::SeverityLevel;
use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Longest an alert may stay on screen: one day
pub const MAX_EXPIRY_SECS: u64 = 86_400;

/// Alert display timing and pending-queue sizing (`[alerts]` config section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    pub critical_secs: u64,
    pub high_secs: u64,
    pub medium_secs: u64,
    pub low_secs: u64,
    /// Alerts waiting behind the active one. 0 drops them instead.
    pub queue_capacity: usize,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            critical_secs: 10,
            high_secs: 8,
            medium_secs: 6,
            low_secs: 5,
            queue_capacity: 16,
        }
    }
}

impl AlertSettings {
    /// How long an alert of this severity stays on screen. Values past
    /// `MAX_EXPIRY_SECS` are clamped so unvalidated settings cannot overflow.
    pub fn expiry_for(&self, severity: SeverityLevel) -> Duration {
        let secs = match severity {
            SeverityLevel::Critical => self.critical_secs,
            SeverityLevel::High => self.high_secs,
            SeverityLevel::Medium => self.medium_secs,
            SeverityLevel::Low => self.low_secs,
            SeverityLevel::Normal => 0,
        };
        Duration::seconds(secs.min(MAX_EXPIRY_SECS) as i64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.low_secs == 0 {
            anyhow::bail!("alerts.low_secs must be greater than 0");
        }
        if self.critical_secs > MAX_EXPIRY_SECS {
            anyhow::bail!(
                "alerts.critical_secs must be at most {} (got {})",
                MAX_EXPIRY_SECS,
                self.critical_secs
            );
        }
        if !(self.critical_secs >= self.high_secs
            && self.high_secs >= self.medium_secs
            && self.medium_secs >= self.low_secs)
        {
            anyhow::bail!(
                "Alert expiry must not decrease with severity (critical {}s, high {}s, medium {}s, low {}s)",
                self.critical_secs,
                self.high_secs,
                self.medium_secs,
                self.low_secs
            );
        }
        Ok(())
    }
}
