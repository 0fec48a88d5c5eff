// One-shot status commands: latest, details, classify
use crate::analysis::history::build_records;
use crate::client::{DetectionClient, DetectionSource};
use crate::commands::CommandContext;
use crate::models::Domain;
use crate::output::{DetailsView, LatestStatusList};
use crate::poller::poll_all;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

fn detection_client(ctx: &CommandContext) -> Result<DetectionClient> {
    DetectionClient::new(ctx.config.services.clone(), ctx.request_timeout())
        .context("Failed to create detection client")
}

/// Poll every service once, concurrently, and show what would alert
pub async fn handle_latest_command(ctx: &CommandContext) -> Result<()> {
    let client = detection_client(ctx)?;
    let classifier = ctx.classifier();

    let classified: Vec<_> = poll_all(&client)
        .await
        .into_iter()
        .map(|event| classifier.classify_owned(event))
        .collect();

    let alerting = classified.iter().filter(|c| c.severity.is_alerting()).count();
    info!(alerting, "Polled all services");

    ctx.print(&LatestStatusList(classified))
}

pub async fn handle_details_command(ctx: &CommandContext, domain: Domain) -> Result<()> {
    let client = detection_client(ctx)?;
    let events = client
        .details(domain)
        .await
        .with_context(|| format!("Failed to fetch {} attack details", domain.display_name()))?;

    let view = DetailsView {
        domain,
        records: build_records(events, &ctx.classifier(), &ctx.timezone),
    };
    ctx.print(&view)
}

#[derive(Debug, Serialize)]
struct Verdict<'a> {
    domain: Domain,
    label: &'a str,
    severity: crate::models::SeverityLevel,
    alerts: bool,
}

pub fn handle_classify_command(ctx: &CommandContext, domain: Domain, label: &str) -> Result<()> {
    let severity = ctx.classifier().classify(domain, label);
    let verdict = Verdict {
        domain,
        label,
        severity,
        alerts: severity.is_alerting(),
    };

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        let cell = crate::output::severity_cell(severity, ctx.colored);
        let note = if verdict.alerts { "raises an alert" } else { "no alert" };
        println!("{} / {:?} -> {} ({})", domain.display_name(), label, cell, note);
    }
    Ok(())
}
