//! Background tasks started with the server.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::main_lib::AppState;

/// Starts the cron-driven refresh jobs.
pub fn start_refresh_scheduler(state: &Arc<AppState>) {
    state.scheduler.start();
    let status = state.scheduler.status();
    for job in status.jobs {
        info!(
            "Scheduled job '{}' next fires at {:?}",
            job.name, job.next_fire_time
        );
    }
}

/// Periodically drops expired result cache entries.
pub fn start_cache_sweeper(state: Arc<AppState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Cache sweeper started ({}s interval)", period.as_secs());
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = state.cache.sweep();
            if removed > 0 {
                debug!("Cache sweep removed {} expired entries", removed);
            }
        }
    })
}
