use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use cursor10x::{cli, config, server};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cursor10x",
    version,
    about = "Persistent conversation memory MCP server"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport to use: stdio or sse (overrides config)
        #[arg(long)]
        transport: Option<String>,
    },
    /// Print memory statistics from the selected backend
    Stats,
    /// Show configuration, selected backend and health
    Doctor,
}

/// Log panics with a backtrace and exit non-zero instead of leaving a hung server.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        tracing::error!(panic = %info, %backtrace, "unexpected panic");
        std::process::exit(1);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::MemoryConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    install_panic_hook();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or_else(|| config.server.transport.clone());
            match transport.as_str() {
                "stdio" => server::serve_stdio(config).await?,
                "sse" => server::serve_sse(config).await?,
                other => bail!("unknown transport {other:?}: expected stdio or sse"),
            }
        }
        Command::Stats => {
            cli::stats::stats(&config).await?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config).await?;
        }
    }

    Ok(())
}
