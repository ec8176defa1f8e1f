//! Performa operator CLI (kop-performa) - Main entry point
//!
//! Inspects and maintains an organization's performa records from the
//! command line. Every command prints pretty JSON on stdout; logs go to
//! stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kop_common::config::{ConfigOverrides, ConfigResolver};
use kop_common::Cadence;
use kop_performa::models::Indicators;
use kop_performa::period::recent_periods;
use kop_performa::{HttpTransport, PerformaReconciler, PeriodKey};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for kop-performa
#[derive(Parser, Debug)]
#[command(name = "kop-performa")]
#[command(about = "Cooperative performance survey tool for Kopdesk")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token for the backend API
    #[arg(long, global = true)]
    token: Option<String>,

    /// Organization (cooperative) id
    #[arg(long, global = true, env = "KOP_ORG")]
    org: Option<String>,

    /// Survey cadence: monthly or yearly
    #[arg(long, global = true, value_parser = parse_cadence)]
    cadence: Option<Cadence>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the organization's recorded periods
    Periods,

    /// Periods a user may pick, newest first
    Choices {
        /// Earlier years to include besides the current one
        #[arg(long, default_value_t = 2)]
        years_back: u32,
    },

    /// Show the record for a period (default: current period)
    Show { period: Option<String> },

    /// Fetch the record for a period, creating it if missing
    Ensure { period: String },

    /// Save the headline indicators for a period
    Indicators {
        period: String,
        #[arg(long)]
        cdi: Option<f64>,
        #[arg(long)]
        bdi: Option<f64>,
        #[arg(long)]
        odi: Option<f64>,
        #[arg(long)]
        kuadrant: Option<u8>,
    },

    /// Questionnaire completion for a period (default: current period)
    Progress { period: Option<String> },

    /// Delete a performa record by id
    Delete { performa_id: u64 },
}

fn parse_cadence(raw: &str) -> std::result::Result<Cadence, String> {
    raw.parse::<Cadence>().map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct PeriodChoice {
    key: PeriodKey,
    label: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(ConfigOverrides {
        config_path: args.config.clone(),
        base_url: args.base_url.clone(),
        token: args.token.clone(),
        cadence: args.cadence,
    });
    let config = resolver.resolve().context("Failed to resolve configuration")?;

    // Logs on stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "kop_performa={level},kop_common={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting kop-performa (version {}, git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        base_url = %config.base_url,
        cadence = %config.cadence,
        authenticated = config.token.is_some(),
        "Configuration resolved"
    );

    let cadence = config.cadence;
    let period_arg = |raw: Option<&str>| -> Result<PeriodKey> {
        match raw {
            Some(raw) => PeriodKey::parse(raw, cadence).context("Invalid period argument"),
            None => Ok(PeriodKey::current(cadence)),
        }
    };

    if let Command::Choices { years_back } = &args.command {
        let today = kop_common::time::local_today();
        let choices: Vec<PeriodChoice> = recent_periods(cadence, today, *years_back)
            .into_iter()
            .map(|key| PeriodChoice {
                label: key.label(),
                key,
            })
            .collect();
        return print_json(&choices);
    }

    let org = args
        .org
        .as_deref()
        .context("--org (or KOP_ORG) is required for this command")?;

    let transport = HttpTransport::from_config(&config).context("Failed to build HTTP client")?;
    let reconciler = PerformaReconciler::new(transport, cadence).with_cache_ttl(config.cache_ttl);

    match &args.command {
        Command::Periods => print_json(&reconciler.list_periods(org).await?),
        Command::Choices { .. } => Ok(()),
        Command::Show { period } => {
            let period = period_arg(period.as_deref())?;
            print_json(&reconciler.performa(org, &period).await?)
        }
        Command::Ensure { period } => {
            let period = period_arg(Some(period.as_str()))?;
            print_json(&reconciler.get_or_create(org, &period).await?)
        }
        Command::Indicators {
            period,
            cdi,
            bdi,
            odi,
            kuadrant,
        } => {
            let period = period_arg(Some(period.as_str()))?;
            let indicators = Indicators {
                cdi: *cdi,
                bdi: *bdi,
                odi: *odi,
                kuadrant: *kuadrant,
            };
            print_json(&reconciler.save_indicators(org, &period, indicators).await?)
        }
        Command::Progress { period } => {
            let period = period_arg(period.as_deref())?;
            print_json(&reconciler.kuesioner_progress(org, &period).await?)
        }
        Command::Delete { performa_id } => {
            reconciler.delete_performa(org, *performa_id).await?;
            print_json(&serde_json::json!({ "deleted": performa_id }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
    println!("{}", rendered);
    Ok(())
}
