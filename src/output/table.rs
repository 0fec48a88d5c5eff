use crate::alerts::ClassifiedEvent;
use crate::analysis::devices::DeviceStats;
use crate::analysis::history::{HistoryRecord, HistoryReport};
use crate::models::{Device, Domain, SeverityLevel};
use crate::output::export::columns_for;
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

/// Trait for items that can be displayed as tables or JSON
pub trait OutputFormat {
    fn to_table(&self) -> String {
        self.to_table_with_color(false)
    }
    fn to_json(&self) -> Result<String, serde_json::Error>;
    fn to_table_with_color(&self, colored: bool) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    Status,
    Details,
    History,
    Summary,
    Devices,
}

/// Rounded borders everywhere; with color on, a bold header tinted per table kind
pub fn apply_table_style_with_color(mut table: Table, colored: bool, table_type: TableType) -> String {
    table.with(Style::rounded());
    if colored {
        let header = match table_type {
            TableType::Status => Color::FG_BRIGHT_CYAN,
            TableType::Details => Color::FG_BRIGHT_MAGENTA,
            TableType::History => Color::FG_BRIGHT_BLUE,
            TableType::Summary => Color::FG_BRIGHT_GREEN,
            TableType::Devices => Color::FG_BRIGHT_YELLOW,
        };
        table.with(Modify::new(Rows::first()).with(header | Color::BOLD));
    }
    table.to_string()
}

pub fn severity_cell(severity: SeverityLevel, colored: bool) -> String {
    let text = severity.as_str().to_uppercase();
    if !colored {
        return text;
    }
    match severity {
        SeverityLevel::Critical => text.red().bold().to_string(),
        SeverityLevel::High => text.bright_red().to_string(),
        SeverityLevel::Medium => text.yellow().to_string(),
        SeverityLevel::Low => text.cyan().to_string(),
        SeverityLevel::Normal => text.green().to_string(),
    }
}

/// Row for the one-shot status table
#[derive(Tabled, Serialize, Debug)]
pub struct LatestStatusRow {
    #[tabled(rename = "Domain")]
    pub domain: String,
    #[tabled(rename = "Latest")]
    pub label: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Alert")]
    pub alert: String,
    #[tabled(rename = "Source")]
    pub source: String,
    #[tabled(rename = "Time")]
    pub timestamp: String,
}

impl LatestStatusRow {
    pub fn from_classified(classified: &ClassifiedEvent, colored: bool) -> Self {
        let event = &classified.event;
        Self {
            domain: event.domain.display_name().to_string(),
            label: if event.label.is_empty() {
                event.domain.idle_text().to_string()
            } else {
                event.label.clone()
            },
            severity: severity_cell(classified.severity, colored),
            alert: if classified.severity.is_alerting() { "yes" } else { "no" }.to_string(),
            source: if event.is_placeholder() { "offline" } else { "live" }.to_string(),
            timestamp: if event.timestamp.is_empty() {
                "N/A".to_string()
            } else {
                event.timestamp.clone()
            },
        }
    }
}

/// Wrapper so the status of all domains renders as one table
#[derive(Debug, Clone, Serialize)]
pub struct LatestStatusList(pub Vec<ClassifiedEvent>);

impl OutputFormat for LatestStatusList {
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }

    fn to_table_with_color(&self, colored: bool) -> String {
        if self.0.is_empty() {
            return "No domains polled.".to_string();
        }
        let rows: Vec<LatestStatusRow> = self
            .0
            .iter()
            .map(|c| LatestStatusRow::from_classified(c, colored))
            .collect();
        apply_table_style_with_color(Table::new(rows), colored, TableType::Status)
    }
}

/// Feature keys holding bytes sent and received
pub fn byte_keys(domain: Domain) -> (&'static str, &'static str) {
    match domain {
        Domain::Traditional => ("src_bytes", "dst_bytes"),
        Domain::Iot | Domain::Cyber => ("orig_bytes", "resp_bytes"),
    }
}

#[derive(Tabled, Serialize, Debug)]
pub struct DetailRow {
    #[tabled(rename = "Time")]
    pub timestamp: String,
    #[tabled(rename = "Attack")]
    pub attack: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Duration")]
    pub duration: String,
    #[tabled(rename = "Protocol")]
    pub protocol: String,
    #[tabled(rename = "Bytes Out")]
    pub bytes_out: String,
    #[tabled(rename = "Bytes In")]
    pub bytes_in: String,
}

impl DetailRow {
    pub fn from_record(record: &HistoryRecord, colored: bool) -> Self {
        let (out_key, in_key) = byte_keys(record.event.domain);
        Self {
            timestamp: if record.event.timestamp.is_empty() {
                "N/A".to_string()
            } else {
                record.event.timestamp.clone()
            },
            attack: record.display_label(),
            severity: severity_cell(record.severity, colored),
            duration: record.event.feature_text("duration"),
            protocol: record.event.protocol_name(),
            bytes_out: format_feature_number(record, out_key),
            bytes_in: format_feature_number(record, in_key),
        }
    }
}

fn format_feature_number(record: &HistoryRecord, key: &str) -> String {
    match record.event.feature_f64(key) {
        Some(n) if n >= 0.0 && n.fract() == 0.0 => format_number(n as u64),
        _ => record.event.feature_text(key),
    }
}

/// Recent attacks of one domain with a byte summary
#[derive(Debug, Clone, Serialize)]
pub struct DetailsView {
    pub domain: Domain,
    pub records: Vec<HistoryRecord>,
}

impl DetailsView {
    fn byte_totals(&self) -> (u64, u64) {
        let (out_key, in_key) = byte_keys(self.domain);
        let sum = |key: &str| -> u64 {
            self.records
                .iter()
                .filter_map(|r| r.event.feature_f64(key))
                .filter(|n| *n > 0.0)
                .map(|n| n as u64)
                .sum()
        };
        (sum(out_key), sum(in_key))
    }
}

impl OutputFormat for DetailsView {
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn to_table_with_color(&self, colored: bool) -> String {
        if self.records.is_empty() {
            return format!("No attack details available for {}.", self.domain.display_name());
        }
        let rows: Vec<DetailRow> = self.records.iter().map(|r| DetailRow::from_record(r, colored)).collect();
        let mut output = apply_table_style_with_color(Table::new(rows), colored, TableType::Details);

        let (bytes_out, bytes_in) = self.byte_totals();
        output.push_str(&format!(
            "\n{} attacks, {} bytes out, {} bytes in",
            format_number(self.records.len() as u64),
            format_number(bytes_out),
            format_number(bytes_in)
        ));
        output
    }
}

#[derive(Tabled, Serialize, Debug)]
pub struct StatsRow {
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Count")]
    pub count: String,
}

#[derive(Tabled, Serialize, Debug)]
pub struct DistributionRow {
    #[tabled(rename = "Attack Type")]
    pub label: String,
    #[tabled(rename = "Count")]
    pub count: String,
    #[tabled(rename = "Share")]
    pub share: String,
}

// History columns vary per domain, so the table is built cell by cell
fn history_table(report: &HistoryReport, colored: bool) -> String {
    let columns = columns_for(report.domain);
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|(name, _)| name.to_string()));
    for record in &report.page.items {
        builder.push_record(columns.iter().map(|(name, column)| {
            if *name == "Severity" {
                severity_cell(record.severity, colored)
            } else {
                column.value(record)
            }
        }));
    }
    apply_table_style_with_color(builder.build(), colored, TableType::History)
}

impl OutputFormat for HistoryReport {
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn to_table_with_color(&self, colored: bool) -> String {
        let mut output = format!("{} history\n\n", self.domain.display_name());

        let mut stats: Vec<StatsRow> = SeverityLevel::ALL
            .iter()
            .rev()
            .map(|s| StatsRow {
                severity: severity_cell(*s, colored),
                count: format_number(self.stats.count(*s) as u64),
            })
            .collect();
        stats.push(StatsRow {
            severity: "TOTAL".to_string(),
            count: format_number(self.stats.total as u64),
        });
        output.push_str(&apply_table_style_with_color(Table::new(stats), colored, TableType::Summary));
        output.push('\n');

        if !self.distribution.is_empty() {
            let rows: Vec<DistributionRow> = self
                .distribution
                .iter()
                .map(|d| DistributionRow {
                    label: d.label.clone(),
                    count: format_number(d.count as u64),
                    share: format!("{:.1}%", d.percent),
                })
                .collect();
            output.push_str("\nTop attack types\n");
            output.push_str(&apply_table_style_with_color(Table::new(rows), colored, TableType::Summary));
            output.push('\n');
        }

        output.push('\n');
        if self.page.items.is_empty() {
            output.push_str("No log entries match the current filters.");
        } else {
            output.push_str(&history_table(self, colored));
            output.push_str(&format!(
                "\nPage {} of {} ({} entries)",
                self.page.page,
                self.page.total_pages,
                format_number(self.page.total_items as u64)
            ));
        }
        output
    }
}

#[derive(Tabled, Serialize, Debug)]
pub struct DeviceRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "IP")]
    pub ip: String,
    #[tabled(rename = "MAC")]
    pub mac: String,
    #[tabled(rename = "Type")]
    pub device_type: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Risk")]
    pub risk: String,
    #[tabled(rename = "Vulns")]
    pub vulnerabilities: String,
    #[tabled(rename = "Open Ports")]
    pub open_ports: String,
    #[tabled(rename = "Last Seen")]
    pub last_seen: String,
}

impl DeviceRow {
    pub fn from_device(device: &Device, colored: bool) -> Self {
        let risk = device.risk_label();
        let risk = match (colored, device.risk_rank()) {
            (true, 3) => risk.red().bold().to_string(),
            (true, 1) => risk.yellow().to_string(),
            (true, _) => risk.green().to_string(),
            (false, _) => risk,
        };
        let ports = device.open_port_list();
        Self {
            name: device.display_name().to_string(),
            ip: device.ip.clone(),
            mac: device.mac_address.clone().unwrap_or_else(|| "N/A".to_string()),
            device_type: device.device_type.clone().unwrap_or_else(|| "unknown".to_string()),
            status: device.status.clone().unwrap_or_else(|| "Unknown".to_string()),
            risk,
            vulnerabilities: device.vulnerabilities.to_string(),
            open_ports: if ports.is_empty() { "-".to_string() } else { ports.join(", ") },
            last_seen: device.last_seen.clone().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub stats: DeviceStats,
    pub devices: Vec<Device>,
}

impl OutputFormat for DeviceReport {
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn to_table_with_color(&self, colored: bool) -> String {
        let summary = format!(
            "Devices: {} total, {} online, {} offline, {} vulnerable",
            self.stats.total, self.stats.online, self.stats.offline, self.stats.vulnerable
        );
        if self.devices.is_empty() {
            return format!("{}\nNo devices match the current filter.", summary);
        }
        let rows: Vec<DeviceRow> = self.devices.iter().map(|d| DeviceRow::from_device(d, colored)).collect();
        format!(
            "{}\n{}",
            apply_table_style_with_color(Table::new(rows), colored, TableType::Devices),
            summary
        )
    }
}

/// Format a number with commas for thousands separator
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::SeverityClassifier;
    use crate::analysis::devices::device_stats;
    use crate::analysis::history::build_records;
    use crate::models::{DetectionEvent, EventOrigin, FeatureValue, RawFeatures};
    use chrono_tz::Tz;

    fn iot_records() -> Vec<HistoryRecord> {
        let features: RawFeatures = [
            ("orig_bytes".to_string(), FeatureValue::Number(8192.0)),
            ("resp_bytes".to_string(), FeatureValue::Number(1024.0)),
            ("proto".to_string(), FeatureValue::Number(6.0)),
        ]
        .into_iter()
        .collect();
        let events = vec![
            DetectionEvent::new(Domain::Iot, "Mirai", "14:32:05", EventOrigin::Poll).with_features(features),
            DetectionEvent::new(Domain::Iot, "Benign", "14:33:00", EventOrigin::Poll),
        ];
        build_records(events, &SeverityClassifier::default(), &Tz::UTC)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1000000000), "1,000,000,000");
    }

    #[test]
    fn test_latest_status_row() {
        let classifier = SeverityClassifier::default();
        let placeholder = classifier.classify_owned(DetectionEvent::placeholder(
            Domain::Iot,
            "IoT security breach detected",
            SeverityLevel::Critical,
            "",
        ));
        let row = LatestStatusRow::from_classified(&placeholder, false);
        assert_eq!(row.severity, "CRITICAL");
        assert_eq!(row.alert, "yes");
        assert_eq!(row.source, "offline");
        assert_eq!(row.timestamp, "N/A");
    }

    #[test]
    fn test_details_table_sums_bytes() {
        let view = DetailsView {
            domain: Domain::Iot,
            records: iot_records(),
        };
        let table = view.to_table();
        assert!(table.contains("Mirai"));
        assert!(table.contains("8,192"));
        assert!(table.contains("TCP"));
        assert!(table.contains("2 attacks, 8,192 bytes out, 1,024 bytes in"));
    }

    #[test]
    fn test_empty_details_message() {
        let view = DetailsView {
            domain: Domain::Cyber,
            records: vec![],
        };
        assert_eq!(view.to_table(), "No attack details available for CICIDS.");
    }

    #[test]
    fn test_history_report_table() {
        let records = iot_records();
        let report = HistoryReport::build(Domain::Iot, &records, 1, 50);
        let table = report.to_table();
        assert!(table.contains("Orig Bytes"));
        assert!(table.contains("Top attack types"));
        assert!(table.contains("Page 1 of 1 (2 entries)"));

        let json = report.to_json().unwrap();
        assert!(json.contains("\"critical\": 1"));
    }

    #[test]
    fn test_device_report_table() {
        let devices: Vec<Device> = serde_json::from_value(serde_json::json!([
            {"name": "cam", "ip": "192.168.8.5", "status": "Online", "severity": "danger", "open_ports": [23, 80],
             "type": "camera", "lastSeen": "2024-03-01 10:00"}
        ]))
        .unwrap();
        let report = DeviceReport {
            stats: device_stats(&devices),
            devices,
        };
        let table = report.to_table();
        assert!(table.contains("23, 80"));
        assert!(table.contains("camera"));
        assert!(table.contains("2024-03-01 10:00"));
        assert!(table.contains("Critical"));
        assert!(table.contains("1 total, 1 online, 0 offline, 1 vulnerable"));
    }

    #[test]
    fn test_colored_severity_wraps_text() {
        colored::control::set_override(true);
        let cell = severity_cell(SeverityLevel::Critical, true);
        assert!(cell.contains("CRITICAL"));
        assert_ne!(cell, "CRITICAL");
        assert_eq!(severity_cell(SeverityLevel::Low, false), "LOW");
    }
}
