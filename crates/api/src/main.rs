use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pickem_core::cache::SnapshotCache;
use pickem_core::domain::pickem::PickemSnapshot;
use pickem_core::ingest::extract::ScrapeTarget;
use pickem_core::ingest::fetch::PageFetcher;
use pickem_core::ingest::LivePickemSource;
use pickem_core::time::{refresh, SystemClock};

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

    let fetcher = PageFetcher::new()?;
    let target = ScrapeTarget::from_settings(&settings);
    tracing::info!(url = %target.url, "scrape target configured");

    let source = Arc::new(LivePickemSource::new(fetcher, target));
    let cache = Arc::new(SnapshotCache::new(source, Arc::new(SystemClock)));

    spawn_scheduled_refresh(cache.clone());
    spawn_warmup(cache.clone());

    let state = AppState { cache };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/pickem", get(get_pickem))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    cache: Arc<SnapshotCache>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
    message: String,
}

async fn get_pickem(
    State(state): State<AppState>,
) -> Result<Json<PickemSnapshot>, (StatusCode, Json<ApiError>)> {
    match state.cache.get().await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "pickem snapshot unavailable");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: "pickem data unavailable".to_string(),
                    message: format!("{err:#}"),
                }),
            ))
        }
    }
}

/// Refreshes the cache on aligned wall-clock boundaries, independent of
/// request traffic. Failures are logged and swallowed; the next tick always
/// runs.
fn spawn_scheduled_refresh(cache: Arc<SnapshotCache>) {
    tokio::spawn(async move {
        let period = refresh::refresh_period_from_env();
        loop {
            let delay = refresh::delay_until_next_tick(chrono::Utc::now(), period);
            tokio::time::sleep(delay).await;

            match cache.refresh().await {
                Ok(()) => tracing::info!("scheduled snapshot refresh complete"),
                Err(err) => {
                    sentry_anyhow::capture_anyhow(&err);
                    tracing::error!(error = %err, "scheduled snapshot refresh failed");
                }
            }
        }
    });
}

/// Primes the cache at startup so the first request does not pay the fetch.
fn spawn_warmup(cache: Arc<SnapshotCache>) {
    tokio::spawn(async move {
        match cache.get().await {
            Ok(snapshot) => tracing::info!(
                total_participants = snapshot.total_participants,
                "initial snapshot loaded"
            ),
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "initial snapshot load failed");
            }
        }
    });
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
