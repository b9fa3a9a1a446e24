use crate::domain::pickem::PickemSnapshot;
use crate::ingest::SnapshotSource;
use crate::time::Clock;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

const DEFAULT_TTL_SECS: i64 = 300;

#[derive(Debug, Clone)]
struct CachedSnapshot {
    snapshot: PickemSnapshot,
    fetched_at: DateTime<Utc>,
}

/// Single process-wide snapshot slot. All writes serialize on the slot mutex,
/// so an on-demand refresh and a scheduled refresh never interleave
/// (last write wins).
pub struct SnapshotCache {
    source: Arc<dyn SnapshotSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: tokio::sync::Mutex<Option<CachedSnapshot>>,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn SnapshotSource>, clock: Arc<dyn Clock>) -> Self {
        let ttl_secs = std::env::var("PICKEM_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_TTL_SECS);

        Self::with_ttl(source, clock, Duration::seconds(ttl_secs))
    }

    pub fn with_ttl(
        source: Arc<dyn SnapshotSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            clock,
            ttl,
            slot: tokio::sync::Mutex::new(None),
        }
    }

    /// Returns the cached snapshot while it is fresh; otherwise refreshes.
    /// A failed refresh degrades to the stale snapshot when one exists and
    /// propagates the error only with an empty cache.
    pub async fn get(&self) -> Result<PickemSnapshot> {
        let mut guard = self.slot.lock().await;

        if let Some(cached) = guard.as_ref() {
            if self.clock.now() - cached.fetched_at < self.ttl {
                return Ok(cached.snapshot.clone());
            }
        }

        match self.source.load().await {
            Ok(snapshot) => {
                *guard = Some(CachedSnapshot {
                    snapshot: snapshot.clone(),
                    fetched_at: self.clock.now(),
                });
                Ok(snapshot)
            }
            Err(err) => {
                if let Some(cached) = guard.as_ref() {
                    tracing::warn!(
                        source = self.source.source_name(),
                        error = %err,
                        "snapshot refresh failed; serving stale snapshot"
                    );
                    return Ok(cached.snapshot.clone());
                }
                Err(err)
            }
        }
    }

    /// Unconditionally reloads the slot, regardless of freshness. The
    /// scheduler path; its caller decides what to do with a failure.
    pub async fn refresh(&self) -> Result<()> {
        let mut guard = self.slot.lock().await;
        let snapshot = self.source.load().await?;
        *guard = Some(CachedSnapshot {
            snapshot,
            fetched_at: self.clock.now(),
        });
        Ok(())
    }
}
