use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use scope_tag_client::{
    AddOptions, AppId, Config, GraphClient, NoOpReason, ScopeTagId, ScopeTagUpdater,
    ScopeTagsLookup, SessionContext, UpdateOutcome,
};

mod logging;

use logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "scope-tag")]
#[command(about = "Manage role scope tags on Intune Win32 apps")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Log level (overrides debug flag)
    #[arg(long)]
    log_level: Option<String>,

    /// Config file (defaults to ./scope-tag.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assign a scope tag to a Win32 app
    Add {
        /// Win32 app id (UUID)
        #[arg(long)]
        app_id: AppId,
        /// Scope tag id (digits)
        #[arg(long)]
        scope_tag_id: ScopeTagId,
        /// Drop the default scope tag "0" if another tag remains
        #[arg(long)]
        remove_default: bool,
        /// Show the resulting tag list without submitting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Unassign a scope tag from a Win32 app
    Remove {
        #[arg(long)]
        app_id: AppId,
        #[arg(long)]
        scope_tag_id: ScopeTagId,
    },
    /// Print the scope tags currently assigned to a Win32 app
    Show {
        #[arg(long)]
        app_id: AppId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.log_level.as_deref());

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::new(),
    };
    log::debug!("Graph endpoint: {}/{}", config.graph_base_url, config.api_version);

    let session = match SessionContext::load(&config) {
        Ok(session) => session,
        Err(e) => {
            log::warn!("Could not load access token: {e}");
            None
        }
    };
    let updater = ScopeTagUpdater::new(GraphClient::new(&config)?, session);

    let success = match cli.command {
        Commands::Add {
            app_id,
            scope_tag_id,
            remove_default,
            dry_run,
        } => {
            let options = AddOptions {
                remove_default,
                dry_run,
            };
            let outcome = updater.add_scope_tag(&app_id, &scope_tag_id, options).await;
            println!("{}", render_outcome(&app_id, &outcome));
            outcome.is_success()
        }
        Commands::Remove {
            app_id,
            scope_tag_id,
        } => {
            let outcome = updater.remove_scope_tag(&app_id, &scope_tag_id).await;
            println!("{}", render_outcome(&app_id, &outcome));
            outcome.is_success()
        }
        Commands::Show { app_id } => {
            let lookup = updater.scope_tags(&app_id).await;
            println!("{}", render_lookup(&app_id, &lookup));
            matches!(lookup, ScopeTagsLookup::Found(_))
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn render_outcome(app_id: &AppId, outcome: &UpdateOutcome) -> String {
    match outcome {
        UpdateOutcome::Patched { scope_tag_ids } => format!(
            "{} {} now has scope tags {:?}",
            "updated".green().bold(),
            app_id,
            scope_tag_ids
        ),
        UpdateOutcome::NoOp(NoOpReason::DryRun { scope_tag_ids }) => format!(
            "{} {} would get scope tags {:?}",
            "dry-run".cyan().bold(),
            app_id,
            scope_tag_ids
        ),
        UpdateOutcome::NoOp(NoOpReason::AlreadyPresent) => format!(
            "{} scope tag already assigned to {}",
            "unchanged".cyan().bold(),
            app_id
        ),
        UpdateOutcome::NoOp(NoOpReason::NotPresent) => format!(
            "{} scope tag not assigned to {}",
            "unchanged".cyan().bold(),
            app_id
        ),
        UpdateOutcome::NoOp(NoOpReason::WouldEmptyList) => format!(
            "{} {} would be left without scope tags",
            "skipped".yellow().bold(),
            app_id
        ),
        UpdateOutcome::NotFound => format!("{} no Win32 app {}", "not found".red().bold(), app_id),
        UpdateOutcome::TransportError { message } => {
            format!("{} {}", "request failed:".red().bold(), message)
        }
        UpdateOutcome::Aborted(e) => format!("{} {}", "aborted:".red().bold(), e),
    }
}

fn render_lookup(app_id: &AppId, lookup: &ScopeTagsLookup) -> String {
    match lookup {
        ScopeTagsLookup::Found(app) => format!(
            "{} ({}): {}",
            app.display_name.as_deref().unwrap_or("unnamed app").bold(),
            app_id,
            app.role_scope_tag_ids.join(", ")
        ),
        ScopeTagsLookup::NotFound => format!("{} no Win32 app {}", "not found".red().bold(), app_id),
        ScopeTagsLookup::TransportError { message } => {
            format!("{} {}", "request failed:".red().bold(), message)
        }
        ScopeTagsLookup::Aborted(e) => format!("{} {}", "aborted:".red().bold(), e),
    }
}
