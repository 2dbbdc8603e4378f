use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expense_scribe::cli::commands::add::AddOptions;
use expense_scribe::cli::{CommandContext, Overrides};

#[derive(Parser)]
#[command(name = "expense-scribe")]
#[command(
    version,
    about = "Turn text, receipt photos and voice notes into expense records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Model provider (gemini, openai, mock)")]
    provider: Option<String>,

    #[arg(long, global = true, help = "Model to use")]
    model: Option<String>,

    #[arg(long, global = true, help = "Ledger database file")]
    ledger: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract an expense and append it to the ledger
    Add {
        #[arg(help = "Expense message, e.g. \"Paid by Stefan: Bananas 100 peso\"")]
        text: Option<String>,
        #[arg(long, conflicts_with_all = ["text", "audio"], help = "Receipt photo")]
        image: Option<PathBuf>,
        #[arg(long, conflicts_with_all = ["text", "image"], help = "Voice note")]
        audio: Option<PathBuf>,
        #[arg(long, requires = "image", help = "Caption sent with the photo")]
        caption: Option<String>,
        #[arg(long = "dry-run", help = "Extract only, don't record")]
        dry_run: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Show the most recent expenses
    Summary {
        #[arg(short = 'n', long, help = "Number of rows (default from config)")]
        limit: Option<usize>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Verify configuration, provider and ledger
    Check,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json, yaml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mExpense Scribe encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let overrides = Overrides {
        provider: cli.provider,
        model: cli.model,
        ledger: cli.ledger,
    };

    match cli.command {
        Commands::Add {
            text,
            image,
            audio,
            caption,
            dry_run,
            format,
        } => {
            let ctx = CommandContext::load(&overrides)?;
            let options = AddOptions {
                text,
                image,
                audio,
                caption,
                dry_run,
                format,
            };

            let rt = Runtime::new()?;
            rt.block_on(async {
                let cancel = CancellationToken::new();
                let on_signal = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Interrupt received, cancelling");
                        on_signal.cancel();
                    }
                });
                expense_scribe::cli::commands::add::run(&ctx, options, cancel).await
            })?;
        }
        Commands::Summary { limit, format } => {
            let ctx = CommandContext::load(&overrides)?;
            expense_scribe::cli::commands::summary::run(&ctx, limit, &format)?;
        }
        Commands::Check => {
            let ctx = CommandContext::load(&overrides)?;
            let rt = Runtime::new()?;
            rt.block_on(expense_scribe::cli::commands::check::run(&ctx))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                expense_scribe::cli::commands::config::show(&overrides, &format)?;
            }
            ConfigAction::Path => {
                expense_scribe::cli::commands::config::path(&overrides)?;
            }
            ConfigAction::Init { global, force } => {
                expense_scribe::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
