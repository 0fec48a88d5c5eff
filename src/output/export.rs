use crate::analysis::history::HistoryRecord;
use crate::models::Domain;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// A column of the per-domain history layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Timestamp,
    AttackTypeId,
    AttackType,
    Severity,
    Protocol,
    Feature(&'static str),
}

impl Column {
    pub fn value(&self, record: &HistoryRecord) -> String {
        match self {
            Column::Timestamp => {
                if record.event.timestamp.is_empty() {
                    "N/A".to_string()
                } else {
                    record.event.timestamp.clone()
                }
            }
            Column::AttackTypeId => record.event.feature_text("attack_type_id"),
            Column::AttackType => record.display_label(),
            Column::Severity => record.severity.as_str().to_uppercase(),
            Column::Protocol => record.event.protocol_name(),
            Column::Feature(key) => record.event.feature_text(key),
        }
    }
}

/// Header and column of each history field, in the order each service's logs are shown
pub fn columns_for(domain: Domain) -> Vec<(&'static str, Column)> {
    let mut columns = vec![("Timestamp", Column::Timestamp)];
    if domain == Domain::Cyber {
        columns.push(("Attack Type ID", Column::AttackTypeId));
    }
    columns.extend([
        ("Attack Type", Column::AttackType),
        ("Severity", Column::Severity),
        ("Duration", Column::Feature("duration")),
        ("Protocol", Column::Protocol),
    ]);
    match domain {
        Domain::Iot => columns.extend([
            ("Orig Bytes", Column::Feature("orig_bytes")),
            ("Resp Bytes", Column::Feature("resp_bytes")),
            ("Orig Packets", Column::Feature("orig_pkts")),
            ("Resp Packets", Column::Feature("resp_pkts")),
        ]),
        Domain::Cyber => columns.extend([
            ("Orig Packets", Column::Feature("orig_pkts")),
            ("Resp Packets", Column::Feature("resp_pkts")),
        ]),
        Domain::Traditional => columns.extend([
            ("Src Bytes", Column::Feature("src_bytes")),
            ("Dst Bytes", Column::Feature("dst_bytes")),
        ]),
    }
    columns
}

// RFC 4180 quoting
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn history_csv(domain: Domain, records: &[HistoryRecord]) -> String {
    let columns = columns_for(domain);
    let mut output = String::new();

    let header: Vec<String> = columns.iter().map(|(name, _)| csv_field(name)).collect();
    output.push_str(&header.join(","));
    output.push('\n');

    for record in records {
        let row: Vec<String> = columns.iter().map(|(_, column)| csv_field(&column.value(record))).collect();
        output.push_str(&row.join(","));
        output.push('\n');
    }
    output
}

pub fn export_history_csv(path: &Path, domain: Domain, records: &[HistoryRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export directory: {}", parent.display()))?;
    }
    fs::write(path, history_csv(domain, records))
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;
    info!(path = %path.display(), rows = records.len(), "History exported");
    Ok(())
}
