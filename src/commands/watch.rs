use crate::commands::CommandContext;
use crate::watch::WatchMode;

pub async fn handle_watch_command(ctx: &CommandContext, refresh_rate_ms: u64) -> anyhow::Result<()> {
    // Create and start watch mode
    let mut watch_mode = WatchMode::new(ctx.config.clone(), refresh_rate_ms)?;
    watch_mode.run().await
}
