use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use quotecast::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for quotecast::AppCommand {
    fn from(cmd: Commands) -> quotecast::AppCommand {
        match cmd {
            Commands::Assets => quotecast::AppCommand::Assets,
            Commands::Quote { sell, buy, amount } => {
                quotecast::AppCommand::Quote { sell, buy, amount }
            }
            Commands::Watch { sell, buy } => quotecast::AppCommand::Watch { sell, buy },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the assets available for conversion
    Assets,
    /// Convert an amount once and print both legs
    Quote {
        /// Asset to sell, as SYMBOL or SYMBOL-CHAIN
        #[arg(short, long)]
        sell: String,
        /// Asset to buy, as SYMBOL or SYMBOL-CHAIN
        #[arg(short, long)]
        buy: Option<String>,
        /// Amount to convert
        #[arg(short, long)]
        amount: String,
    },
    /// Read amounts from stdin and keep both legs up to date
    Watch {
        #[arg(short, long)]
        sell: Option<String>,
        #[arg(short, long)]
        buy: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => quotecast::cli::setup::setup(),
        Some(cmd) => quotecast::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
