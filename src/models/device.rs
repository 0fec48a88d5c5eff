use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A host reported by the device-scan service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub name: String,
    pub ip: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// "danger", "warning" or "safe"
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub vulnerabilities: u32,
    #[serde(default)]
    pub open_ports: Vec<Value>,
    #[serde(default, alias = "type")]
    pub device_type: Option<String>,
    #[serde(default, rename = "lastSeen", alias = "last_seen")]
    pub last_seen: Option<String>,
}

impl Device {
    pub fn is_online(&self) -> bool {
        self.status.as_deref() == Some("Online")
    }

    pub fn is_vulnerable(&self) -> bool {
        self.severity.as_deref() == Some("danger")
    }

    /// Sort weight of the reported risk: danger 3, warning 1, anything else 0
    pub fn risk_rank(&self) -> u8 {
        match self.severity.as_deref() {
            Some("danger") => 3,
            Some("warning") => 1,
            _ => 0,
        }
    }

    pub fn risk_label(&self) -> String {
        match self.severity.as_deref() {
            Some("danger") => "Critical".to_string(),
            Some("warning") => "Warning".to_string(),
            Some("safe") => "Safe".to_string(),
            Some(other) => other.to_uppercase(),
            None => "N/A".to_string(),
        }
    }

    pub fn open_port_list(&self) -> Vec<String> {
        self.open_ports
            .iter()
            .map(|port| match port {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.clone(),
                Value::Object(map) => map
                    .get("port")
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| port.to_string()),
                other => other.to_string(),
            })
            .collect()
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.ip } else { &self.name }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub network_range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanProgress {
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub scanning: bool,
}
