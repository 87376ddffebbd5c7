use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "clienthub", version, about = "ClientHub onboarding portal")]
struct Cli {
    /// Path to the configuration file
    #[arg(
        long,
        short,
        global = true,
        env = "CLIENTHUB_CONFIG",
        default_value = "clienthub.yaml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the portal web server.
    Serve {
        /// Override `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,

        /// Keep users, sessions, clients and documents in memory instead of Postgres
        #[arg(long, default_value_t = false)]
        memory: bool,
    },

    /// Apply the embedded database migrations.
    Migrate,

    /// Create a user account.
    CreateUser {
        #[arg(long)]
        email: String,

        /// Password (prefer the environment variable)
        #[arg(long, env = "CLIENTHUB_USER_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "")]
        full_name: String,

        /// client, admin or service-center
        #[arg(long, default_value = "client")]
        role: String,
    },

    /// Validate the configuration and check connectivity.
    Check {
        /// Skip the database connection check
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve { host, port, memory } => {
            commands::serve::run(
                &cli.config,
                commands::serve::ServeOptions { host, port, memory },
            )
            .await?
        }
        Command::Migrate => commands::migrate::run(&cli.config).await?,
        Command::CreateUser {
            email,
            password,
            full_name,
            role,
        } => commands::user::run(&cli.config, &email, &password, &full_name, &role).await?,
        Command::Check { offline } => commands::check::run(&cli.config, offline).await?,
    }

    Ok(())
}
