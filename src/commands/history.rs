// Detection history: filter, paginate, summarize, export
use crate::analysis::history::{HistoryFilter, HistoryReport, attack_types, build_records};
use crate::client::DetectionClient;
use crate::commands::CommandContext;
use crate::models::{Domain, SeverityLevel};
use crate::output::export_history_csv;
use crate::utils::date_format::TimeRange;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    pub attack_type: Option<String>,
    pub min_severity: Option<SeverityLevel>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub page: usize,
    pub export: Option<PathBuf>,
    pub list_types: bool,
}

pub async fn handle_history_command(ctx: &CommandContext, domain: Domain, options: HistoryOptions) -> Result<()> {
    // Bad dates fail before anything goes over the wire
    let range = TimeRange::parse(options.since.as_deref(), options.until.as_deref(), &ctx.timezone)?;
    let filter = HistoryFilter {
        range,
        min_severity: options.min_severity,
        ..Default::default()
    }
    .with_attack_type(options.attack_type.as_deref());

    let client = DetectionClient::new(ctx.config.services.clone(), ctx.request_timeout())
        .context("Failed to create detection client")?;
    let events = client
        .logs(domain)
        .await
        .with_context(|| format!("Failed to fetch {} logs", domain.display_name()))?;
    let records = build_records(events, &ctx.classifier(), &ctx.timezone);

    if options.list_types {
        let types = attack_types(&records);
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&types)?);
        } else {
            for attack_type in types {
                println!("{}", attack_type);
            }
        }
        return Ok(());
    }

    let filtered = filter.apply(&records);
    if ctx.verbose {
        eprintln!("{} of {} log entries match", filtered.len(), records.len());
    }

    if let Some(path) = &options.export {
        export_history_csv(path, domain, &filtered)?;
        if !ctx.json {
            println!("Exported {} entries to {}", filtered.len(), path.display());
        }
    }

    let report = HistoryReport::build(domain, &filtered, options.page, ctx.config.output.page_size);
    ctx.print(&report)
}
