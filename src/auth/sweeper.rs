//! Background reclamation of expired sessions

use crate::auth::SessionCache;
use crate::clock::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

/// Periodic task evicting expired sessions
///
/// The first sweep runs one full interval after spawn. The task exits as soon
/// as its cancellation token fires or the sweeper is dropped.
pub struct ExpirySweeper {
    token: CancellationToken,
    handle: JoinHandle<()>,
    _guard: DropGuard,
}

impl ExpirySweeper {
    /// Spawn the sweep loop on the current tokio runtime
    pub fn spawn(
        cache: Arc<SessionCache>,
        clock: Arc<dyn Clock>,
        period: Duration,
        token: CancellationToken,
    ) -> Self {
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            run(cache, clock, period, task_token).await;
        });

        Self {
            _guard: token.clone().drop_guard(),
            token,
            handle,
        }
    }

    /// Signal the loop to stop and wait for it to exit
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Session sweeper task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run(
    cache: Arc<SessionCache>,
    clock: Arc<dyn Clock>,
    period: Duration,
    token: CancellationToken,
) {
    // tokio panics on a zero period
    let period = period.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(interval_secs = period.as_secs(), "Session sweeper started");

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let removed = cache.delete_expired(clock.now());
                if removed > 0 {
                    info!(removed, remaining = cache.len(), "Evicted expired sessions");
                } else {
                    debug!(remaining = cache.len(), "Session sweep found nothing to evict");
                }
            }
        }
    }

    debug!("Session sweeper stopped");
}
