//! Command-line interface for arbiticker
//!
//! # Usage
//!
//! ```bash
//! # Backend defaults to http://localhost:8000
//! export ARBITICKER_API_BASE="http://localhost:8000"
//!
//! arbiticker analyze NVDA
//! arbiticker profiles create Tech
//! arbiticker watchlist add <PROFILE_ID> AAPL
//! arbiticker --format markdown watchlist check <PROFILE_ID>
//! ```

use arbiticker_core::{
    Coordinator, CoordinatorConfig, ErrorNotice, Formatter, FormatterKind, SessionView,
    WatchlistView,
};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "arbiticker")]
#[command(about = "Multi-agent stock analysis and watchlists", long_about = None)]
struct Args {
    /// Base URL of the analysis backend
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output format: plain or markdown
    #[arg(long, global = true, default_value = "plain")]
    format: FormatterKind,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the multi-agent analysis for one ticker
    Analyze { ticker: String },

    /// Manage profiles
    Profiles {
        #[command(subcommand)]
        action: ProfilesCommand,
    },

    /// Edit and evaluate a profile's watchlist
    Watchlist {
        #[command(subcommand)]
        action: WatchlistCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProfilesCommand {
    List,
    /// Create a profile; a blank name uses the default
    Create { name: Option<String> },
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum WatchlistCommand {
    Add { profile_id: String, ticker: String },
    Remove { profile_id: String, ticker: String },
    /// Evaluate every ticker of the profile
    Check { profile_id: String },
}

impl Args {
    fn coordinator_config(&self) -> arbiticker_core::Result<CoordinatorConfig> {
        let mut builder = CoordinatorConfig::builder().with_env();
        if let Some(base) = &self.api_base {
            builder = builder.api_base(base.clone());
        }
        if let Some(secs) = self.timeout {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

/// Print an error notice if there is one; returns whether the section is clean
fn report(formatter: &dyn Formatter, error: Option<&ErrorNotice>) -> bool {
    match error {
        Some(error) => {
            eprintln!("{}", formatter.format_error(&error.message));
            false
        }
        None => true,
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn analyze(
    coordinator: &Coordinator,
    formatter: &dyn Formatter,
    ticker: &str,
) -> anyhow::Result<bool> {
    coordinator.analyze(ticker).await?;
    match coordinator.dashboard().session {
        SessionView::Ready { ticker, analysis } => {
            println!("{}", formatter.format_analysis(&ticker, &analysis));
            Ok(true)
        }
        SessionView::Failed { message, .. } => {
            eprintln!("{}", formatter.format_error(&message));
            Ok(false)
        }
        _ => {
            println!("No result yet.");
            Ok(true)
        }
    }
}

async fn profiles(
    coordinator: &mut Coordinator,
    formatter: &dyn Formatter,
    action: ProfilesCommand,
) -> anyhow::Result<bool> {
    let reconciler = coordinator.profiles_mut();
    if !reconciler.load().await {
        return Ok(report(formatter, reconciler.error()));
    }

    let ok = match action {
        ProfilesCommand::List => true,
        ProfilesCommand::Create { name } => {
            reconciler.create(name.as_deref().unwrap_or_default()).await.is_some()
        }
        ProfilesCommand::Delete { id, yes } => {
            let confirmed = yes || confirm(&format!("Delete profile {id}?"))?;
            if !confirmed {
                println!("Aborted.");
                return Ok(true);
            }
            reconciler.delete(&id, true).await
        }
    };

    if !report(formatter, reconciler.error()) {
        return Ok(false);
    }
    if let Some(notice) = reconciler.notice() {
        println!("{notice}");
    }
    println!(
        "{}",
        formatter.format_profiles(reconciler.profiles(), reconciler.selected_id())
    );
    Ok(ok)
}

async fn watchlist(
    coordinator: &mut Coordinator,
    formatter: &dyn Formatter,
    action: WatchlistCommand,
) -> anyhow::Result<bool> {
    let profile_id = match &action {
        WatchlistCommand::Add { profile_id, .. }
        | WatchlistCommand::Remove { profile_id, .. }
        | WatchlistCommand::Check { profile_id } => profile_id.clone(),
    };

    let reconciler = coordinator.profiles_mut();
    if !reconciler.load().await {
        return Ok(report(formatter, reconciler.error()));
    }
    reconciler.select(&profile_id).await;
    let Some(profile) = reconciler.selected().cloned() else {
        eprintln!("{}", formatter.format_error(&format!("Profile not found: {profile_id}")));
        return Ok(false);
    };

    let ok = match action {
        WatchlistCommand::Add { ticker, .. } => reconciler.add_ticker(&profile.id, &ticker).await,
        WatchlistCommand::Remove { ticker, .. } => {
            reconciler.remove_ticker(&profile.id, &ticker).await
        }
        WatchlistCommand::Check { .. } => reconciler.check_watchlist_for(&profile.id).await,
    };

    let evaluator = reconciler.watchlist();
    if !report(formatter, evaluator.error()) {
        return Ok(false);
    }
    let profile = reconciler.selected().unwrap_or(&profile);
    let output = match evaluator.result() {
        Some(result) => formatter.format_watchlist(profile, &WatchlistView::from(result)),
        None => formatter.format_profiles(std::slice::from_ref(profile), Some(&profile.id)),
    };
    println!("{output}");
    Ok(ok)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let app = arbiticker_utils::Config::from_env()?;
    arbiticker_utils::init_tracing(&app);

    let args = Args::parse();
    let config = args.coordinator_config()?;
    let formatter = args.format.create();
    let mut coordinator = Coordinator::connect(&config)?;

    info!(environment = %app.environment, api_base = %config.api_base, "Starting arbiticker");

    let ok = match args.command {
        Command::Analyze { ticker } => analyze(&coordinator, formatter.as_ref(), &ticker).await?,
        Command::Profiles { action } => profiles(&mut coordinator, formatter.as_ref(), action).await?,
        Command::Watchlist { action } => watchlist(&mut coordinator, formatter.as_ref(), action).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
