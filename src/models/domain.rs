use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three detection feeds the dashboard watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// IoT-23 traffic classifier
    Iot,
    /// CICIDS2017 network-intrusion classifier
    #[value(alias = "cicids")]
    Cyber,
    /// NSL-KDD classifier
    #[value(alias = "kdd")]
    Traditional,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Iot, Domain::Cyber, Domain::Traditional];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Iot => "iot",
            Domain::Cyber => "cyber",
            Domain::Traditional => "traditional",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::Iot => "IoT",
            Domain::Cyber => "CICIDS",
            Domain::Traditional => "NSL-KDD",
        }
    }

    /// Headline used for the alert popup of this domain
    pub fn alert_title(&self) -> &'static str {
        match self {
            Domain::Iot => "IOT THREAT DETECTED",
            Domain::Cyber => "CYBER THREAT DETECTED",
            Domain::Traditional => "NETWORK THREAT DETECTED",
        }
    }

    pub fn panel_title(&self) -> &'static str {
        match self {
            Domain::Iot => "IOT INTRUSIONS",
            Domain::Cyber => "CYBER THREATS",
            Domain::Traditional => "NETWORK VECTORS",
        }
    }

    /// Text shown in a panel before the first poll answers
    pub fn idle_text(&self) -> &'static str {
        match self {
            Domain::Iot => "Scanning network...",
            Domain::Cyber => "Analyzing traffic...",
            Domain::Traditional => "Processing data...",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Domain::Iot => 0,
            Domain::Cyber => 1,
            Domain::Traditional => 2,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iot" => Ok(Domain::Iot),
            "cyber" | "cicids" => Ok(Domain::Cyber),
            "traditional" | "kdd" | "nsl-kdd" => Ok(Domain::Traditional),
            other => anyhow::bail!("Unknown domain: {}. Must be 'iot', 'cyber' or 'traditional'", other),
        }
    }
}

/// Discrete threat ranking. Ordering is significant: `Normal < Low < ... < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Normal,
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::Normal,
        SeverityLevel::Low,
        SeverityLevel::Medium,
        SeverityLevel::High,
        SeverityLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Normal => "normal",
            SeverityLevel::Low => "low",
            SeverityLevel::Medium => "medium",
            SeverityLevel::High => "high",
            SeverityLevel::Critical => "critical",
        }
    }

    pub fn is_alerting(&self) -> bool {
        *self != SeverityLevel::Normal
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(SeverityLevel::Normal),
            "low" => Ok(SeverityLevel::Low),
            "medium" => Ok(SeverityLevel::Medium),
            "high" => Ok(SeverityLevel::High),
            "critical" => Ok(SeverityLevel::Critical),
            other => anyhow::bail!("Unknown severity: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(SeverityLevel::Normal < SeverityLevel::Low);
        assert!(SeverityLevel::Low < SeverityLevel::Medium);
        assert!(SeverityLevel::Medium < SeverityLevel::High);
        assert!(SeverityLevel::High < SeverityLevel::Critical);
    }

    #[test]
    fn test_domain_parsing_accepts_aliases() {
        assert_eq!("iot".parse::<Domain>().unwrap(), Domain::Iot);
        assert_eq!("CICIDS".parse::<Domain>().unwrap(), Domain::Cyber);
        assert_eq!("nsl-kdd".parse::<Domain>().unwrap(), Domain::Traditional);
        assert!("smtp".parse::<Domain>().is_err());
    }

    #[test]
    fn test_severity_serde_is_lowercase() {
        let json = serde_json::to_string(&SeverityLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let parsed: SeverityLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, SeverityLevel::Medium);
    }
}
