//! alsuper-scraper - Browser-driven price extraction for Alsuper product pages
//!
//! Runs the `/price` HTTP service or performs one-shot lookups from the shell.

use alsuper_scraper::alsuper::selectors;
use alsuper_scraper::commands::{PriceCommand, ServeCommand};
use alsuper_scraper::config::{Config, OutputFormat};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "alsuper-scraper",
    version,
    about = "Browser-driven price extraction for Alsuper product pages",
    long_about = "Renders Alsuper product pages in headless Chromium and reports the \
                  current price, normalized per kilogram or per unit."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format for one-shot lookups
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Chromium executable
    #[arg(long, global = true, env = "ALSUPER_CHROME")]
    chrome: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP price service
    Serve {
        /// Listen address (e.g., 0.0.0.0:8000)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Extract prices for one or more product URLs
    #[command(alias = "p")]
    Price {
        /// Product page URL(s)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Log candidate diagnostics
        #[arg(short, long)]
        debug: bool,
    },

    /// List price selectors in priority order
    Selectors,
}

/// The service logs requests; one-shot lookups stay quiet unless asked for diagnostics.
fn default_log_level(command: &Commands) -> Level {
    match command {
        Commands::Serve { .. } | Commands::Price { debug: true, .. } => Level::INFO,
        _ => Level::WARN,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(default_log_level(&cli.command).into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with CLI overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(chrome) = cli.chrome {
        config.chrome_path = Some(chrome);
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }

            ServeCommand::new(config).execute().await?;
        }

        Commands::Price { urls, debug } => {
            let cmd = PriceCommand::new(config);
            let output = cmd.execute(&urls, debug).await?;
            println!("{}", output);
        }

        Commands::Selectors => {
            println!("Price selectors (highest priority first):\n");
            for (i, selector) in selectors::PRICE.iter().enumerate() {
                println!("{:>2}. {}", i + 1, selector);
            }
        }
    }

    Ok(())
}
