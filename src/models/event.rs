use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::domain::{Domain, SeverityLevel};

/// A single scalar feature reported alongside a detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            FeatureValue::Number(n) => write!(f, "{:.3}", n),
            FeatureValue::Text(s) => f.write_str(s),
        }
    }
}

pub type RawFeatures = BTreeMap<String, FeatureValue>;

/// Where a detection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EventOrigin {
    Poll,
    Feed,
    History,
    /// Synthetic event standing in for a failed poll
    Placeholder { severity: SeverityLevel },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionEvent {
    pub domain: Domain,
    pub label: String,
    pub timestamp: String,
    pub raw_features: RawFeatures,
    pub origin: EventOrigin,
}

impl DetectionEvent {
    pub fn new(domain: Domain, label: impl Into<String>, timestamp: impl Into<String>, origin: EventOrigin) -> Self {
        Self {
            domain,
            label: label.into(),
            timestamp: timestamp.into(),
            raw_features: RawFeatures::new(),
            origin,
        }
    }

    pub fn placeholder(domain: Domain, label: impl Into<String>, severity: SeverityLevel, timestamp: impl Into<String>) -> Self {
        Self::new(domain, label, timestamp, EventOrigin::Placeholder { severity })
    }

    pub fn with_features(mut self, features: RawFeatures) -> Self {
        self.raw_features = features;
        self
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.origin, EventOrigin::Placeholder { .. })
    }

    pub fn feature(&self, key: &str) -> Option<&FeatureValue> {
        self.raw_features.get(key)
    }

    pub fn feature_f64(&self, key: &str) -> Option<f64> {
        self.feature(key).and_then(FeatureValue::as_f64)
    }

    /// Feature rendered for tables, "N/A" when absent
    pub fn feature_text(&self, key: &str) -> String {
        self.feature(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// Protocol feature as a name. Services report either `proto` or `protocol`,
    /// as an IANA number or already as text.
    pub fn protocol_name(&self) -> String {
        let value = self.feature("proto").or_else(|| self.feature("protocol"));
        match value {
            Some(v) => match v.as_f64().map(|n| n as i64) {
                Some(6) => "TCP".to_string(),
                Some(17) => "UDP".to_string(),
                Some(1) => "ICMP".to_string(),
                _ => v.to_string(),
            },
            None => "Unknown".to_string(),
        }
    }
}

/// Attack labels arrive as names, or as numeric class ids from the CICIDS service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttackLabel {
    Name(String),
    Code(i64),
}

/// Record shape shared by the detail, log and WebSocket payloads
#[derive(Debug, Clone, Deserialize)]
pub struct WireRecord {
    #[serde(default)]
    pub attack: Option<AttackLabel>,
    #[serde(default)]
    pub traffic_type: Option<AttackLabel>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub features: Option<Value>,
}

impl WireRecord {
    /// Convert into a detection event. Records without any label are skipped.
    pub fn into_event(self, domain: Domain, origin: EventOrigin) -> Option<DetectionEvent> {
        let label = self.traffic_type.or(self.attack)?;
        let mut features = self.features.map(features_from_json).unwrap_or_default();

        let label = match label {
            AttackLabel::Name(name) => name,
            AttackLabel::Code(code) => {
                features.insert("attack_type_id".to_string(), FeatureValue::Number(code as f64));
                match domain {
                    Domain::Cyber => cicids_attack_name(code)
                        .map(str::to_string)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    _ => code.to_string(),
                }
            }
        };

        let timestamp = match self.timestamp {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Some(DetectionEvent::new(domain, label, timestamp, origin).with_features(features))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestAttackResponse {
    #[serde(default)]
    pub attack: Option<AttackLabel>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttackDetailsResponse {
    #[serde(default)]
    pub attacks: Vec<WireRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<WireRecord>,
}

/// Keep scalar features only; nested values and nulls carry nothing we render
pub fn features_from_json(value: Value) -> RawFeatures {
    let mut features = RawFeatures::new();
    if let Value::Object(map) = value {
        for (key, v) in map {
            match v {
                Value::Number(n) => {
                    if let Some(f) = n.as_f64() {
                        features.insert(key, FeatureValue::Number(f));
                    }
                }
                Value::String(s) => {
                    features.insert(key, FeatureValue::Text(s));
                }
                Value::Bool(b) => {
                    features.insert(key, FeatureValue::Number(if b { 1.0 } else { 0.0 }));
                }
                _ => {}
            }
        }
    }
    features
}

/// CICIDS2017 class ids as emitted by the classifier service
pub fn cicids_attack_name(code: i64) -> Option<&'static str> {
    let name = match code {
        0 => "BENIGN",
        1 => "DoS Hulk",
        2 => "DoS GoldenEye",
        3 => "DoS slowloris",
        4 => "DoS Slowhttptest",
        5 => "Heartbleed",
        6 => "Botnet",
        7 => "Brute Force",
        8 => "Web Attack",
        9 => "Infiltration",
        10 => "PortScan",
        11 => "DDoS",
        _ => return None,
    };
    Some(name)
}

/// Friendlier label for display. Only NSL-KDD uses abbreviations.
pub fn display_label(domain: Domain, label: &str) -> String {
    if domain != Domain::Traditional {
        return label.to_string();
    }
    match label {
        "DoS" => "Denial of Service",
        "R2L" => "Remote to Local",
        "U2R" => "User to Root",
        "Probe" => "Network Probe",
        "Normal" => "Normal Traffic",
        "Benign" => "Benign Traffic",
        other => other,
    }
    .to_string()
}
