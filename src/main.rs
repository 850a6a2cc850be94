mod cli;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// lnatprep - entitlement service for LNAT preparation tools
#[derive(Parser)]
#[command(name = "lnatprep")]
#[command(
    about = "Trials, subscriptions and permission grants for LNAT prep tools",
    long_about = None
)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run database migrations
    Migrate,
    /// Drop database if exists and recreate with migrations
    Reset,
    /// Run the expiry sweep and snapshot refresh once.
    /// Exits 2 when some users failed, 1 when the run could not complete
    Sweep,
    /// Give a user seven more days of trial
    GrantTrial {
        email: String,

        #[arg(long)]
        reason: Option<String>,
    },
    /// Change a user's role or suspend them
    SetRole {
        email: String,

        #[arg(value_enum)]
        role: cli::user::Role,
    },
    /// Issue a JWT for a user
    Token { email: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = lnatprep::Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    lnatprep::observability::init_observability(
        "lnatprep",
        env!("CARGO_PKG_VERSION"),
        &config.observability.log_level,
    )?;

    let code = match cli.command {
        Commands::Serve { host, port } => {
            cli::server::serve(config, host, port).await?;
            ExitCode::SUCCESS
        }
        Commands::Migrate => {
            cli::db::migrate(config).await?;
            ExitCode::SUCCESS
        }
        Commands::Reset => {
            cli::db::reset(config).await?;
            ExitCode::SUCCESS
        }
        Commands::Sweep => cli::maintenance::sweep(config).await?,
        Commands::GrantTrial { email, reason } => {
            cli::user::grant_trial(config, email, reason).await?;
            ExitCode::SUCCESS
        }
        Commands::SetRole { email, role } => {
            cli::user::set_role(config, email, role).await?;
            ExitCode::SUCCESS
        }
        Commands::Token { email } => {
            cli::user::token(config, email).await?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
