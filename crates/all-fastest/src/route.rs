//! Routing primitives shared by every node of a routing tree.
//!
//! A routing tree is built from [`RouteHandle`]s. Leaves talk to backends,
//! inner nodes (such as [`AllFastestRoute`](crate::AllFastestRoute)) combine
//! their children. Destination failures travel as reply values; the
//! `Err` side of a route call is reserved for scheduling failures.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;

use crate::correlation;

/// Operation tag carried alongside a request through the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Get,
    Set,
    Delete,
    Touch,
    Incr,
    Decr,
    Version,
}

/// Per-call state passed through the tree unmodified.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: String,
}

/// Shared handle to a [`RequestContext`].
pub type ContextPtr = Arc<RequestContext>;

impl RequestContext {
    /// A fresh context with a generated correlation ID.
    pub fn new() -> ContextPtr {
        Self::with_correlation_id(correlation::generate_id())
    }

    pub fn with_correlation_id(correlation_id: impl Into<String>) -> ContextPtr {
        Arc::new(Self {
            correlation_id: correlation_id.into(),
        })
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Classification every reply type exposes to routing strategies.
pub trait Reply: Send + 'static {
    /// True when the destination could not serve the request and another
    /// destination should be given the chance to answer.
    fn is_failover_error(&self) -> bool;

    /// The reply a no-op route produces for `op`.
    fn null_reply(op: Operation) -> Self
    where
        Self: Sized;
}

/// A node of the routing tree.
#[async_trait]
pub trait RouteHandle<Req, Rep>: Send + Sync {
    /// Human readable identity used in spans and logs.
    fn name(&self) -> String;

    /// Route `req` and produce exactly one reply.
    async fn route(&self, req: &Req, op: Operation, ctx: &ContextPtr) -> Result<Rep, RouteError>;

    /// Destinations this node would hand `req` to. Leaves touch none.
    fn could_route_to(
        &self,
        _req: &Req,
        _op: Operation,
        _ctx: &ContextPtr,
    ) -> Vec<RouteHandlePtr<Req, Rep>> {
        Vec::new()
    }
}

/// Shared, type-erased route handle.
pub type RouteHandlePtr<Req, Rep> = Arc<dyn RouteHandle<Req, Rep>>;

/// Failures of the scheduling machinery itself. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("no async runtime available to schedule {0} destination calls")]
    NoRuntime(usize),

    #[error("destination task did not complete: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("all {0} destination calls ended without a reply")]
    Exhausted(usize),
}
