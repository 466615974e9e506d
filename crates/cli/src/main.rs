//! Upvote CLI - submit, review and vote on ideas from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (signs in afterwards)
//! upvote -u dora --password explorer register -e dora@example.com
//!
//! # List approved ideas and vote for one
//! upvote ideas list
//! upvote vote 7
//!
//! # Propose an idea
//! upvote ideas submit -t "Bike racks" -d "Covered racks by the entrance"
//!
//! # Review as an admin
//! upvote admin overview
//! upvote admin approve 12
//! upvote admin delete 12 --yes
//!
//! # Interactive session
//! upvote shell
//! ```
//!
//! Credentials come from `--username`/`--password` or `UPVOTE_USERNAME`/
//! `UPVOTE_PASSWORD`; the backend address from `--api-url` or
//! `UPVOTE_API_URL`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upvote_client::ClientConfig;
use upvote_core::IdeaId;

mod commands;
mod config;
mod error;
mod render;

use commands::Context;
use config::{DEFAULT_LOG_FILTER, ObservabilityConfig};
use error::CliError;

#[derive(Parser)]
#[command(name = "upvote")]
#[command(author, version, about = "Submit, review and vote on ideas")]
struct Cli {
    /// Backend base address (overrides `UPVOTE_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds (overrides `UPVOTE_HTTP_TIMEOUT_SECS`)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Username to sign in with
    #[arg(short, long, global = true, env = "UPVOTE_USERNAME")]
    username: Option<String>,

    /// Password to sign in with
    #[arg(long, global = true, env = "UPVOTE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in with it
    Register {
        /// Email address for the new account
        #[arg(short, long)]
        email: String,
    },
    /// Show the signed-in user
    Whoami,
    /// Browse and propose ideas
    Ideas {
        #[command(subcommand)]
        action: IdeaAction,
    },
    /// Vote for an approved idea
    Vote {
        /// Idea ID
        id: IdeaId,
    },
    /// Review ideas (admin role required)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Start an interactive session
    Shell,
}

#[derive(Subcommand)]
enum IdeaAction {
    /// List approved ideas
    List,
    /// Propose a new idea
    Submit {
        /// Idea title (at most 200 characters)
        #[arg(short, long)]
        title: String,

        /// Idea description (at most 4000 characters)
        #[arg(short, long)]
        description: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Show pending and approved ideas with total votes
    Overview,
    /// Approve a pending idea
    Approve {
        /// Idea ID
        id: IdeaId,
    },
    /// Delete an idea
    Delete {
        /// Idea ID
        id: IdeaId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ObservabilityConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &ObservabilityConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    // Logs go to stderr; stdout carries command output
    let json_layer = config.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!config.log_json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let observability = ObservabilityConfig::from_env();

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&observability);
    init_tracing(&observability);

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        sentry::capture_error(&e);
        // process::exit skips destructors, so flush explicitly
        drop(sentry_guard);
        std::process::exit(1);
    }
}

fn client_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = ClientConfig {
            timeout: config.timeout,
            ..ClientConfig::new(url)?
        };
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = client_config(&cli)?;
    let ctx = Context::new(
        &config,
        cli.username,
        cli.password.map(SecretString::from),
    )?;

    match cli.command {
        Commands::Register { email } => commands::auth::register(&ctx, &email).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await?,
        Commands::Ideas { action } => match action {
            IdeaAction::List => commands::ideas::list(&ctx).await?,
            IdeaAction::Submit { title, description } => {
                commands::ideas::submit(&ctx, title, description).await?;
            }
        },
        Commands::Vote { id } => commands::ideas::vote(&ctx, id).await?,
        Commands::Admin { action } => match action {
            AdminAction::Overview => commands::admin::overview(&ctx).await?,
            AdminAction::Approve { id } => commands::admin::approve(&ctx, id).await?,
            AdminAction::Delete { id, yes } => commands::admin::delete(&ctx, id, yes).await?,
        },
        Commands::Shell => commands::shell::run(ctx).await?,
    }
    Ok(())
}
