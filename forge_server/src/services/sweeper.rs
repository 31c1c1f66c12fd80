//! Stuck-job sweeper — optional background task that fails jobs no
//! callback ever arrived for. The request path never waits on this;
//! it runs on its own interval, spawned from main when a TTL is set.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::metrics;
use crate::models::build_job::JobOutcome;
use crate::store::{Store, StoreError};

const SWEEP_INTERVAL_SECS: u64 = 60;

/// Run the sweep loop forever. Spawned as a background tokio task.
pub async fn run_sweeper(store: Arc<dyn Store>, ttl_min: i64) {
    tracing::info!(ttl_min, "Stuck-job sweeper started");

    loop {
        tokio::time::sleep(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS)).await;
        match sweep_once(store.as_ref(), ttl_min).await {
            Ok(0) => {}
            Ok(n) => tracing::warn!(swept = n, "Marked stuck jobs as failed"),
            Err(e) => tracing::error!("Sweeper error: {e}"),
        }
    }
}

/// Fail every non-terminal job older than the TTL. Jobs that race to a
/// terminal state between the query and the write are left alone by the
/// store's guarded transition.
pub async fn sweep_once(store: &dyn Store, ttl_min: i64) -> Result<usize, StoreError> {
    let cutoff = Utc::now() - Duration::minutes(ttl_min);
    let stale = store.stale_open_jobs(cutoff).await?;

    let outcome = JobOutcome::failed("timed out waiting for CI");
    let mut swept = 0;
    for job in stale {
        let result = store.finish_job_by_id(job.id, &outcome, Utc::now()).await?;
        if result.map(|o| o.applied).unwrap_or(false) {
            metrics::job_timed_out();
            metrics::job_status_changed("failed");
            tracing::warn!(
                job_id = job.id,
                link_id = job.link_id,
                platform = %job.platform,
                "Job timed out waiting for CI"
            );
            swept += 1;
        }
    }

    Ok(swept)
}
