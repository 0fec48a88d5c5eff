// Device scanning
use crate::analysis::devices::{DeviceFilter, DeviceSort, device_stats, select_devices};
use crate::cli::ScanAction;
use crate::client::ScanClient;
use crate::client::scan::{PROGRESS_INTERVAL, SCAN_TIMEOUT};
use crate::client::{ScanCompletion, validate_network_range};
use crate::commands::CommandContext;
use crate::output::DeviceReport;
use anyhow::{Context, Result};
use std::io::Write;

pub async fn handle_scan_action(ctx: &CommandContext, action: ScanAction) -> Result<()> {
    let client = ScanClient::new(ctx.config.services.scan_url.clone(), ctx.request_timeout())
        .context("Failed to create scan client")?;

    match action {
        ScanAction::Start {
            range,
            no_wait,
            filter,
            sort,
        } => {
            let range = validate_network_range(&range)?;
            client.start_scan(&range).await.context("Failed to start scan")?;
            if no_wait {
                if ctx.json {
                    println!("{}", serde_json::json!({"status": "started", "network_range": range}));
                } else {
                    println!("Scan of {} started", range);
                }
                return Ok(());
            }

            if !ctx.json {
                println!("Scanning {}...", range);
            }
            let show_progress = !ctx.json;
            let completion = client
                .wait_for_completion(PROGRESS_INTERVAL, SCAN_TIMEOUT, |progress| {
                    if show_progress {
                        print!("\r  {:>5.1}%", progress.progress);
                        let _ = std::io::stdout().flush();
                    }
                })
                .await
                .context("Failed to track scan progress")?;
            if show_progress {
                println!();
            }

            if let ScanCompletion::TimedOut(last) = completion {
                anyhow::bail!(
                    "Scan timeout - operation took too long (last progress {:.0}%)",
                    last.progress
                );
            }
            print_results(ctx, &client, filter, sort).await
        }
        ScanAction::Progress => {
            let progress = client.progress().await.context("Failed to fetch scan progress")?;
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else if progress.scanning {
                println!("Scan running: {:.1}%", progress.progress);
            } else {
                println!("No scan running (last progress {:.1}%)", progress.progress);
            }
            Ok(())
        }
        ScanAction::Results { filter, sort } => print_results(ctx, &client, filter, sort).await,
    }
}

async fn print_results(ctx: &CommandContext, client: &ScanClient, filter: DeviceFilter, sort: DeviceSort) -> Result<()> {
    let devices = client.results().await.context("Failed to fetch scan results")?;
    let report = DeviceReport {
        stats: device_stats(&devices),
        devices: select_devices(&devices, filter, sort),
    };
    ctx.print(&report)
}
