use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use disasterguard::cli::commands::analyze::AnalyzeOptions;
use disasterguard::cli::{ConfigOverrides, Output, load_config};
use disasterguard::types::Language;

#[derive(Parser)]
#[command(name = "disasterguard")]
#[command(
    version,
    about = "Disaster-risk prediction relay backed by generative AI models"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (skips global/project lookup)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, help = "Bind address override")]
        host: Option<String>,
        #[arg(long, short, help = "Port override")]
        port: Option<u16>,
        #[arg(long = "no-enrichment", help = "Skip visualization generation")]
        no_enrichment: bool,
    },

    /// Run a single prediction and print the JSON result
    Analyze {
        #[arg(help = "Location to analyze")]
        location: String,
        #[arg(long, short, default_value = "en", help = "Output language: en, es, fr, hi")]
        lang: Language,
        #[arg(long, short, help = "JSON file with an array of community reports")]
        reports: Option<PathBuf>,
        #[arg(long = "no-enrichment", help = "Skip visualization generation")]
        no_enrichment: bool,
        #[arg(long, help = "Print single-line JSON")]
        compact: bool,
    },

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
            default_value = "text",
            help = "Output format: text, toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Write a default configuration file
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
        eprintln!("\x1b[31mDisasterGuard encountered an unexpected error:\x1b[0m");
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

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::new().error(&format!("Error: {}", e));
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

    match cli.command {
        Commands::Serve {
            host,
            port,
            no_enrichment,
        } => {
            let overrides = ConfigOverrides {
                host,
                port,
                no_enrichment,
            };
            let config = load_config(cli.config.as_deref(), &overrides)?;
            let rt = Runtime::new()?;
            rt.block_on(disasterguard::cli::commands::serve::run(config))?;
        }
        Commands::Analyze {
            location,
            lang,
            reports,
            no_enrichment,
            compact,
        } => {
            let overrides = ConfigOverrides {
                no_enrichment,
                ..ConfigOverrides::default()
            };
            let config = load_config(cli.config.as_deref(), &overrides)?;
            let rt = Runtime::new()?;
            rt.block_on(disasterguard::cli::commands::analyze::run(
                &config,
                AnalyzeOptions {
                    location,
                    lang,
                    reports,
                    compact,
                },
            ))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                disasterguard::cli::commands::config::show(&format)?;
            }
            ConfigAction::Path => {
                disasterguard::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                disasterguard::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
