mod command;
mod config;
mod remote;
mod render;
mod repl;
mod shell;

use anyhow::Result;
use calsh_core::provider::Provider;
use calsh_core::SessionContext;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use remote::RemoteCalendar;
use shell::Shell;

#[derive(Parser)]
#[command(name = "calsh")]
#[command(about = "Browse and edit your calendar like a directory tree of years, months and days")]
struct Cli {
    /// Calendar to open (overrides calendar_id from config)
    #[arg(long)]
    calendar: Option<String>,

    /// IANA timezone for dates and times (e.g. "Asia/Tokyo")
    #[arg(long)]
    timezone: Option<String>,

    /// Show debug logs
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with a calendar provider
    Auth {
        /// Provider to authenticate with (e.g., "google")
        provider: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.debug { LevelFilter::Debug } else { LevelFilter::Info })
        .parse_default_env()
        .init();

    match cli.command {
        Some(Commands::Auth { provider }) => cmd_auth(&provider).await,
        None => cmd_shell(cli.calendar, cli.timezone).await,
    }
}

async fn cmd_auth(provider_name: &str) -> Result<()> {
    let provider = Provider::from_name(provider_name);

    println!("Authenticating with {}...", provider_name);

    // Provider handles the full OAuth flow and stores credentials/tokens
    let account = provider.authenticate().await?;

    println!("\nAuthenticated as: {}", account);
    println!("\nNow set the account in {}:", config::config_path()?.display());
    println!();
    println!("provider = \"{}\"", provider_name);
    println!("account = \"{}\"", account);
    println!();
    println!("Then run `calsh` to open your calendar.");

    Ok(())
}

async fn cmd_shell(calendar: Option<String>, timezone: Option<String>) -> Result<()> {
    let mut config = config::load_config()?;
    if let Some(calendar) = calendar {
        config.calendar_id = calendar;
    }
    if let Some(timezone) = timezone {
        config.timezone = Some(timezone);
    }

    let tz: Tz = config.timezone()?;
    log::debug!("Using timezone {} and calendar {}", tz, config.calendar_id);

    let context = SessionContext::today(&config.calendar_id, tz);
    let shell = Shell::new(context, RemoteCalendar::from_config(&config), tz);

    repl::run(shell).await
}
