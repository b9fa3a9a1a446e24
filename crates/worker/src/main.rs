use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pickem_core::ingest::extract::ScrapeTarget;
use pickem_core::ingest::fetch::PageFetcher;
use pickem_core::ingest::{LivePickemSource, SnapshotSource};

#[derive(Debug, Parser)]
#[command(name = "pickem_worker")]
struct Args {
    /// Skip the network and synthesize a snapshot from the baseline table.
    #[arg(long)]
    mock: bool,

    /// Override the scrape target URL.
    #[arg(long)]
    url: Option<String>,

    /// Pretty-print the snapshot JSON.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = pickem_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let snapshot = if args.mock {
        let mut rng = rand::thread_rng();
        pickem_core::fallback::jittered_baseline(&mut rng, chrono::Utc::now())
    } else {
        let mut target = ScrapeTarget::from_settings(&settings);
        if let Some(url) = args.url {
            target.url = url;
        }
        tracing::info!(url = %target.url, "fetching pickem snapshot");

        let fetcher = PageFetcher::new()?;
        let source = LivePickemSource::new(fetcher, target);
        source.load().await?
    };

    if let Err(err) = snapshot.validate().context("snapshot failed validation") {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");

    tracing::info!(
        total_participants = snapshot.total_participants,
        "snapshot emitted"
    );
    Ok(())
}

fn init_sentry(settings: &pickem_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
