//! offerlet CLI
//!
//! Validates framework configuration and evaluates decoded resource offers.

mod commands;

use clap::{Parser, Subcommand};
use offerlet_core::{FrameworkConfig, LoggingConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// offerlet - offer matching for GPU-aware cluster frameworks
#[derive(Parser, Debug)]
#[command(name = "offerlet")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Framework configuration file (TOML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration and print the resulting policies
    Check,

    /// Evaluate offers against a GPU requirement
    Match {
        /// JSON file holding an array of decoded offers
        #[arg(long)]
        offers: PathBuf,

        /// Number of GPUs required
        #[arg(long)]
        gpus: u32,

        /// Scope annotation included in diagnostics
        #[arg(long, default_value = "")]
        scope: String,
    },
}

fn init_logging(logging: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FrameworkConfig::from_file(path)?,
        None => FrameworkConfig::default(),
    };

    init_logging(&config.logging, cli.log_level.as_deref());

    // Invalid policies abort startup before any offer is looked at.
    let policies = config.policies()?;

    match cli.command {
        Commands::Check => {
            commands::check(&config, &policies);
        }
        Commands::Match {
            offers,
            gpus,
            scope,
        } => {
            commands::match_offers(&policies, &offers, gpus, scope).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn test_second_logging_init_is_not_ignored() {
        let logging = LoggingConfig::default();
        init_logging(&logging, Some("warn"));
        init_logging(&logging, Some("warn"));
    }
}
