//! ReaperLoop - 放置された割り当ての回収
//!
//! # フロー
//! 1. `interval` ごとに起きる（起動直後ではなく 1 周期後から）
//! 2. TaskDispatcher::reclaim_stale(timeout) を呼ぶ
//! 3. shutdown が来たら抜ける

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::dispatcher::TaskDispatcher;

/// Reclaim schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclaimPolicy {
    /// Time between sweeps.
    pub interval: Duration,

    /// A Processing task older than this is reverted.
    pub timeout: Duration,
}

impl ReclaimPolicy {
    /// Longest interval or timeout the reaper accepts (about ten years).
    pub const MAX_PERIOD: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

    /// Shortest interval the reaper accepts.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// Copy with both durations pulled into the accepted range.
    pub fn clamped(self) -> Self {
        Self {
            interval: self.interval.clamp(Self::MIN_INTERVAL, Self::MAX_PERIOD),
            timeout: self.timeout.min(Self::MAX_PERIOD),
        }
    }
}

impl Default for ReclaimPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            timeout: Duration::from_secs(3 * 60 * 60),
        }
    }
}

/// Handle to the running reaper.
/// - `shutdown_and_join()` で停止して終了を待つ
/// - handle を drop しても sender が消えるのでループは止まる
pub struct ReaperLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ReaperLoop {
    pub fn spawn(dispatcher: Arc<TaskDispatcher>, policy: ReclaimPolicy) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(reaper_loop(dispatcher, policy, shutdown_rx));
        Self { shutdown_tx, join }
    }

    /// Request shutdown. An in-flight sweep finishes first.
    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "reaper task ended abnormally");
        }
    }
}

async fn reaper_loop(
    dispatcher: Arc<TaskDispatcher>,
    policy: ReclaimPolicy,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let requested = policy;
    let policy = policy.clamped();
    if policy != requested {
        tracing::warn!(
            requested_interval_secs = requested.interval.as_secs(),
            requested_timeout_secs = requested.timeout.as_secs(),
            interval_secs = policy.interval.as_secs(),
            timeout_secs = policy.timeout.as_secs(),
            "reclaim policy out of range, clamped"
        );
    }

    let start = tokio::time::Instant::now() + policy.interval;
    let mut ticker = tokio::time::interval_at(start, policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        interval_secs = policy.interval.as_secs(),
        timeout_secs = policy.timeout.as_secs(),
        "reaper started"
    );

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender dropped counts as shutdown
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let reclaimed = dispatcher.reclaim_stale(policy.timeout).await;
        tracing::debug!(reclaimed = reclaimed.len(), "reaper sweep done");
    }

    tracing::info!("reaper stopped");
}
