//! Real-time driver.
//!
//! Polls a monotonic clock on a fixed cadence and feeds the measured elapsed
//! time into [`Scheduler::advance`]. The scheduler itself never sleeps or
//! performs I/O; this loop is the only place that waits.

use std::future::Future;

use tokio::time::{self, Instant, MissedTickBehavior};

use super::scheduler::Scheduler;
use crate::graph::Network;

/// Drive `scheduler` over `network` until `shutdown` resolves.
///
/// Returns the scheduler's total tick count.
pub async fn run_until<F>(scheduler: &mut Scheduler, network: &mut Network, shutdown: F) -> u64
where
    F: Future<Output = ()>,
{
    let mut interval = time::interval(scheduler.config().poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut last = Instant::now();
    tracing::debug!(period = ?scheduler.clock().period(), "driver started");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            now = interval.tick() => {
                let elapsed = now.saturating_duration_since(last);
                last = now;
                for report in scheduler.advance(network, elapsed) {
                    if !report.is_clean() {
                        tracing::debug!(
                            tick = report.tick,
                            failures = report.failures.len(),
                            silent = report.silent.len(),
                            "tick finished with module errors"
                        );
                    }
                }
            }
        }
    }

    tracing::debug!(ticks = scheduler.tick_count(), "driver stopped");
    scheduler.tick_count()
}
