// idswatch: terminal dashboard for intrusion detection services
use clap::Parser;
use idswatch::cli::{Cli, Commands};
use idswatch::client::RegisterRequest;
use idswatch::commands::{
    CommandContext, HistoryOptions, handle_classify_command, handle_config_action, handle_details_command,
    handle_error, handle_history_command, handle_latest_command, handle_login_command, handle_register_command,
    handle_scan_action, handle_watch_command,
};
use idswatch::config::Config;
use idswatch::logging;
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli).await {
        handle_error(&e, json);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match &cli.config {
        Some(path) => PathBuf::from(path),
        None => Config::default_path()?,
    };

    let flags = cli_flags(&cli);
    let Some(command) = cli.command else {
        // Default behavior: one round of polling
        let ctx = load_context(&flags, config_path)?;
        logging::init_stderr(&ctx.config.logging.level, ctx.verbose);
        return handle_latest_command(&ctx).await;
    };

    // Config management must work even when the file doesn't parse
    if let Commands::Config { action } = command {
        logging::init_stderr("warn", flags.verbose);
        return handle_config_action(action, &config_path, flags.json);
    }

    let ctx = load_context(&flags, config_path)?;

    if let Commands::Watch { refresh_rate } = command {
        let directory = ctx.config.logging.resolved_directory()?;
        let _guard = logging::init_file(&directory, &ctx.config.logging.level, ctx.verbose)?;
        return handle_watch_command(&ctx, refresh_rate).await;
    }

    logging::init_stderr(&ctx.config.logging.level, ctx.verbose);
    match command {
        Commands::Latest => handle_latest_command(&ctx).await,
        Commands::Details { domain } => handle_details_command(&ctx, domain).await,
        Commands::History {
            domain,
            attack_type,
            min_severity,
            since,
            until,
            page,
            export,
            list_types,
        } => {
            let options = HistoryOptions {
                attack_type,
                min_severity,
                since,
                until,
                page,
                export: export.map(PathBuf::from),
                list_types,
            };
            handle_history_command(&ctx, domain, options).await
        }
        Commands::Scan { action } => handle_scan_action(&ctx, action).await,
        Commands::Login { username, password } => handle_login_command(&ctx, username, password).await,
        Commands::Register {
            username,
            email,
            password,
            admin_password,
        } => {
            let request = RegisterRequest {
                username,
                email,
                password,
                admin_password,
            };
            handle_register_command(&ctx, request).await
        }
        Commands::Classify { domain, label } => handle_classify_command(&ctx, domain, &label),
        Commands::Watch { .. } | Commands::Config { .. } => Ok(()),
    }
}

struct Flags {
    timezone: Option<String>,
    json: bool,
    colored: bool,
    verbose: bool,
}

fn cli_flags(cli: &Cli) -> Flags {
    Flags {
        timezone: cli.timezone.clone(),
        json: cli.json,
        colored: cli.colored,
        verbose: cli.verbose,
    }
}

fn load_context(flags: &Flags, config_path: PathBuf) -> anyhow::Result<CommandContext> {
    let config = Config::load_from(&config_path)?;
    CommandContext::new(
        config,
        config_path,
        flags.timezone.as_deref(),
        flags.json,
        flags.colored,
        flags.verbose,
    )
}
