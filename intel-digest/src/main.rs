use clap::{Parser, Subcommand};
use intel_digest::notify::{NoopNotifier, WebhookNotifier};
use intel_digest::{canonicalize_url, AppConfig, DigestBuilder, DigestEntry, Notifier, PgStore};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "intel-digest", about = "Daily tiered intelligence digest")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build (or reuse) the digest for a date
    Generate {
        /// YYYY-MM-DD, defaults to today (UTC)
        #[arg(long)]
        date: Option<String>,
        /// Deliver the digest after building it
        #[arg(long)]
        send: bool,
    },
    /// Tier a JSON array of entries without touching storage
    Tier { input: PathBuf },
    /// Print canonical forms of URLs
    Normalize { urls: Vec<String> },
    /// Apply database migrations
    Migrate,
}

#[derive(Deserialize)]
struct TierInput {
    #[serde(flatten)]
    entry: DigestEntry,
    #[serde(default)]
    excluded: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate { date, send } => {
            let config = AppConfig::from_env()?;
            let date = date.unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());

            let store = Arc::new(PgStore::new(&config.database_url).await.map_err(|e| {
                error!("Failed to connect to database. Make sure PostgreSQL is running and DATABASE_URL is set");
                Box::new(e) as Box<dyn std::error::Error>
            })?);

            let notifier: Arc<dyn Notifier> = match &config.webhook_url {
                Some(url) => Arc::new(WebhookNotifier::new(
                    url.clone(),
                    store.clone(),
                    config.fallback_recipients.clone(),
                )),
                None => Arc::new(NoopNotifier),
            };

            let builder = DigestBuilder::new(store.clone(), store, notifier).with_config(config.builder);
            let outcome = builder.generate(&date, send).await?;

            info!(status = ?outcome.status, %date, "Digest run finished");
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Tier { input } => {
            let raw = std::fs::read_to_string(&input)?;
            let inputs: Vec<TierInput> = serde_json::from_str(&raw)?;
            let (entries, excluded): (Vec<DigestEntry>, Vec<bool>) =
                inputs.into_iter().map(|i| (i.entry, i.excluded)).unzip();

            let content = intel_digest::tier(entries, &excluded);
            println!("{}", serde_json::to_string_pretty(&content)?);
        }
        Command::Normalize { urls } => {
            for url in urls {
                match canonicalize_url(&url) {
                    Ok(canonical) => println!("{canonical}"),
                    Err(e) => error!("{}: {}", url, e),
                }
            }
        }
        Command::Migrate => {
            let config = AppConfig::from_env()?;
            let store = PgStore::new(&config.database_url).await?;
            store.run_migrations().await?;
        }
    }

    Ok(())
}
