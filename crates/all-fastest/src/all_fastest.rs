//! All-fastest fan-out: send a request to every child, answer with the first
//! acceptable reply.
//!
//! Children are started concurrently on the tokio runtime and their replies
//! are consumed in completion order. The first reply that is not a failover
//! error wins. If every child fails over, the reply that completed last is
//! returned. Calls still in flight when the caller is answered keep running;
//! their replies are discarded.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinSet};
use tracing::Instrument;

use crate::drain::DrainBudget;
use crate::factory::{ChildrenConfig, ConfigError, RouteHandleFactory};
use crate::null_route::NullRoute;
use crate::route::{ContextPtr, Operation, Reply, RouteError, RouteHandle, RouteHandlePtr};
use crate::stats::RouteStats;

/// Races every child and returns the fastest acceptable reply.
pub struct AllFastestRoute<Req, Rep> {
    children: Vec<RouteHandlePtr<Req, Rep>>,
    drain_budget: Option<DrainBudget>,
    stats: RouteStats,
}

impl<Req, Rep> AllFastestRoute<Req, Rep>
where
    Req: Clone + Send + Sync + 'static,
    Rep: Reply,
{
    pub const ROUTE_NAME: &'static str = "all-fastest";

    pub fn route_name() -> &'static str {
        Self::ROUTE_NAME
    }

    pub fn new(children: Vec<RouteHandlePtr<Req, Rep>>) -> Self {
        Self {
            children,
            drain_budget: None,
            stats: RouteStats::new(),
        }
    }

    /// Build from a route node: either a list of children or an object
    /// whose `children` field lists them.
    pub fn from_config<F>(factory: &F, node: &Value) -> Result<Self, ConfigError>
    where
        F: RouteHandleFactory<Req, Rep> + ?Sized,
    {
        let children = ChildrenConfig::resolve(node).expand(factory)?;
        Ok(Self::new(children))
    }

    /// Bound the number of abandoned calls left running in the background.
    /// Without a budget they are detached unconditionally.
    pub fn with_drain_budget(mut self, budget: DrainBudget) -> Self {
        self.drain_budget = Some(budget);
        self
    }

    /// Report into shared counters instead of private ones.
    pub fn with_stats(mut self, stats: RouteStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn children(&self) -> &[RouteHandlePtr<Req, Rep>] {
        &self.children
    }

    pub fn stats(&self) -> &RouteStats {
        &self.stats
    }

    async fn race(&self, req: &Req, op: Operation, ctx: &ContextPtr) -> Result<Rep, RouteError> {
        let runtime =
            Handle::try_current().map_err(|_| RouteError::NoRuntime(self.children.len()))?;
        self.stats.inc_races();

        let mut in_flight = InFlight {
            calls: JoinSet::new(),
            handles: Vec::with_capacity(self.children.len()),
            runtime: runtime.clone(),
            drain_budget: self.drain_budget.clone(),
            stats: self.stats.clone(),
            correlation_id: ctx.correlation_id().to_string(),
        };

        // One copy, shared read-only by every child call
        let shared = Arc::new(req.clone());
        for (index, child) in self.children.iter().enumerate() {
            let child = Arc::clone(child);
            let req = Arc::clone(&shared);
            let ctx = Arc::clone(ctx);
            let span = fanout_tracing::destination_call_span!(ctx.correlation_id(), index, child.name());
            let handle = in_flight.calls.spawn_on(
                async move { (index, child.route(&req, op, &ctx).await) }.instrument(span),
                &runtime,
            );
            in_flight.handles.push(handle);
        }

        let mut discarded = 0_u64;
        loop {
            let joined = in_flight
                .calls
                .join_next()
                .await
                .ok_or(RouteError::Exhausted(self.children.len()))?;

            let (index, reply) = match joined {
                Ok((index, Ok(reply))) => (index, reply),
                Ok((index, Err(e))) => {
                    tracing::warn!(index, error = %e, "Destination call failed, abandoning race");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Destination task failed, abandoning race");
                    return Err(e.into());
                }
            };

            if !reply.is_failover_error() || in_flight.calls.is_empty() {
                if reply.is_failover_error() {
                    self.stats.inc_all_failed();
                    tracing::debug!(index, "Every destination failed over, returning last reply");
                }
                let span = tracing::Span::current();
                span.record("winner", index);
                span.record("discarded", discarded);
                span.record("pending", in_flight.calls.len());
                return Ok(reply);
            }

            discarded += 1;
            self.stats.inc_failovers_skipped();
            tracing::debug!(index, remaining = in_flight.calls.len(), "Failover reply discarded");
        }
    }
}

/// Destination calls spawned by one race.
///
/// Owned by the `route` future, but dropping it never cancels a call: on
/// every exit (winner found, fatal error, or the caller dropping the future
/// mid-race) the calls still running are detached or handed to the drain
/// budget.
struct InFlight<Rep: Send + 'static> {
    calls: JoinSet<(usize, Result<Rep, RouteError>)>,
    handles: Vec<AbortHandle>,
    runtime: Handle,
    drain_budget: Option<DrainBudget>,
    stats: RouteStats,
    correlation_id: String,
}

impl<Rep: Send + 'static> Drop for InFlight<Rep> {
    fn drop(&mut self) {
        let mut calls = std::mem::take(&mut self.calls);
        if calls.is_empty() {
            return;
        }
        match &self.drain_budget {
            Some(budget) => budget.drain(
                calls,
                &self.handles,
                &self.runtime,
                &self.correlation_id,
                &self.stats,
            ),
            None => {
                self.stats.add_detached(calls.len() as u64);
                calls.detach_all();
            }
        }
    }
}

#[async_trait]
impl<Req, Rep> RouteHandle<Req, Rep> for AllFastestRoute<Req, Rep>
where
    Req: Clone + Send + Sync + 'static,
    Rep: Reply,
{
    fn name(&self) -> String {
        format!("{}|{}", Self::ROUTE_NAME, self.children.len())
    }

    async fn route(&self, req: &Req, op: Operation, ctx: &ContextPtr) -> Result<Rep, RouteError> {
        self.stats.inc_requests();

        match self.children.as_slice() {
            [] => {
                self.stats.inc_empty_routes();
                <NullRoute as RouteHandle<Req, Rep>>::route(&NullRoute, req, op, ctx).await
            }
            // Short circuit if one destination
            [only] => {
                self.stats.inc_short_circuits();
                only.route(req, op, ctx).await
            }
            children => {
                let span = fanout_tracing::fanout_route_span!(
                    Self::ROUTE_NAME,
                    ctx.correlation_id(),
                    op,
                    children.len()
                );
                self.race(req, op, ctx).instrument(span).await
            }
        }
    }

    fn could_route_to(
        &self,
        _req: &Req,
        _op: Operation,
        _ctx: &ContextPtr,
    ) -> Vec<RouteHandlePtr<Req, Rep>> {
        self.children.clone()
    }
}
