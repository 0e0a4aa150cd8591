//! Bounded background draining of destination calls abandoned by a race.
//!
//! Once a race has answered its caller, the calls still in flight are left
//! to finish on their own. A [`DrainBudget`] caps how many such calls may be
//! outstanding across every route sharing it. Calls that fit in the free
//! slots are drained; only the overflow is aborted.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinSet};
use tracing::Instrument;

use crate::stats::RouteStats;

/// Shared cap on abandoned-but-running destination calls. Cheap to clone.
#[derive(Clone, Debug)]
pub struct DrainBudget {
    semaphore: Arc<Semaphore>,
    max_pending: usize,
}

impl DrainBudget {
    /// Caps above [`Semaphore::MAX_PERMITS`] are clamped to it.
    pub fn new(max_pending: usize) -> Self {
        let max_pending = max_pending.min(Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(max_pending)),
            max_pending,
        }
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Slots not currently held by a draining call.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Drain as many of the still-running calls in `calls` as the budget
    /// has free slots for, on a detached task spawned onto `runtime`. Calls
    /// beyond the free slots are aborted, latest-submitted first.
    ///
    /// `handles` are the abort handles of every call spawned into `calls`,
    /// in submission order.
    pub(crate) fn drain<T>(
        &self,
        mut calls: JoinSet<T>,
        handles: &[AbortHandle],
        runtime: &Handle,
        correlation_id: &str,
        stats: &RouteStats,
    ) where
        T: Send + 'static,
    {
        let running: Vec<&AbortHandle> = handles.iter().filter(|h| !h.is_finished()).collect();
        if running.is_empty() {
            // Only finished, unread replies remain
            calls.detach_all();
            return;
        }

        // Non-blocking acquire: whatever does not fit is aborted, never waited on
        let wanted = running
            .len()
            .min(self.semaphore.available_permits())
            .min(u32::MAX as usize);
        let permit = u32::try_from(wanted)
            .ok()
            .filter(|&n| n > 0)
            .and_then(|n| Arc::clone(&self.semaphore).try_acquire_many_owned(n).ok());
        let admitted = if permit.is_some() { wanted } else { 0 };

        let overflow = &running[admitted..];
        if !overflow.is_empty() {
            tracing::warn!(
                correlation_id = %correlation_id,
                running = running.len(),
                aborted = overflow.len(),
                max_pending = self.max_pending,
                "Drain budget full, aborting abandoned destination calls"
            );
            for handle in overflow {
                handle.abort();
            }
            stats.add_aborted(overflow.len() as u64);
        }

        let Some(permit) = permit else {
            return;
        };

        let stats = stats.clone();
        let span = fanout_tracing::drain_span!(correlation_id, admitted);
        runtime.spawn(
            async move {
                let _permit = permit;
                let mut drained = 0_u64;
                while let Some(joined) = calls.join_next().await {
                    match joined {
                        Ok(_) => {
                            drained += 1;
                            stats.inc_drained();
                        }
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "Abandoned destination call did not complete");
                        }
                    }
                }
                tracing::Span::current().record("drained", drained);
                tracing::debug!(drained, "Background drain finished");
            }
            .instrument(span),
        );
    }
}
