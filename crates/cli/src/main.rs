mod api_commands;
mod auth_commands;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "monzo", version, about = "Command-line client for the Monzo API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize this machine against your Monzo account.
    Login(auth_commands::LoginArgs),
    /// List accounts.
    Accounts,
    /// Show the balance of an account.
    Balance(api_commands::AccountArgs),
    /// List transactions of an account, with merchant details.
    Transactions(api_commands::AccountArgs),
}

/// Logs go to stderr; stdout carries command output only.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "monzo starting");

    match cli.command {
        Commands::Login(args) => auth_commands::handle_login(args).await,
        Commands::Accounts => api_commands::handle_accounts().await,
        Commands::Balance(args) => api_commands::handle_balance(args).await,
        Commands::Transactions(args) => api_commands::handle_transactions(args).await,
    }
}
