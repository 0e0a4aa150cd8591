//! Simulated destinations with fixed latency and a fixed outcome.
//!
//! Used by the `all-fastest-sim` binary to exercise routing trees without a
//! backend, and by tests to pin down completion order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::all_fastest::AllFastestRoute;
use crate::drain::DrainBudget;
use crate::factory::{ConfigError, RouteHandleFactory};
use crate::null_route::NullRoute;
use crate::protocol::{McReply, McRequest, ReplyResult};
use crate::route::{ContextPtr, Operation, RouteError, RouteHandle, RouteHandlePtr};
use crate::stats::RouteStats;

/// Declarative description of a simulated destination.
#[derive(Debug, Clone, Deserialize)]
pub struct SimSpec {
    pub name: String,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default = "default_result")]
    pub result: ReplyResult,
}

fn default_result() -> ReplyResult {
    ReplyResult::Found
}

/// A destination that sleeps for `latency` and then answers with `result`.
///
/// Acceptable replies carry the destination name as their value, so callers
/// can tell which destination won.
pub struct SimRoute {
    name: String,
    latency: Duration,
    result: ReplyResult,
    calls: AtomicU64,
    completions: AtomicU64,
}

/// Call counters of one simulated destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimCounters {
    pub name: String,
    pub calls: u64,
    pub completions: u64,
}

impl SimRoute {
    pub fn new(name: impl Into<String>, latency: Duration, result: ReplyResult) -> Self {
        Self {
            name: name.into(),
            latency,
            result,
            calls: AtomicU64::new(0),
            completions: AtomicU64::new(0),
        }
    }

    pub fn from_spec(spec: &SimSpec) -> Self {
        Self::new(
            spec.name.clone(),
            Duration::from_millis(spec.latency_ms),
            spec.result,
        )
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn completions(&self) -> u64 {
        self.completions.load(Ordering::Relaxed)
    }

    pub fn counters(&self) -> SimCounters {
        SimCounters {
            name: self.name.clone(),
            calls: self.calls(),
            completions: self.completions(),
        }
    }
}

#[async_trait]
impl RouteHandle<McRequest, McReply> for SimRoute {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn route(
        &self,
        _req: &McRequest,
        _op: Operation,
        ctx: &ContextPtr,
    ) -> Result<McReply, RouteError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.latency).await;
        self.completions.fetch_add(1, Ordering::Relaxed);

        tracing::trace!(
            correlation_id = %ctx.correlation_id(),
            destination = %self.name,
            result = ?self.result,
            "Simulated destination replied"
        );

        let reply = McReply::new(self.result);
        if self.result.is_error() {
            Ok(reply)
        } else {
            Ok(reply.with_value(self.name.clone()))
        }
    }
}

/// Builds simulated routing trees from route nodes.
///
/// Node types, selected by the `type` field:
/// - `sim` (default): a [`SimSpec`]
/// - `all-fastest`: a nested fan-out; its node is read as list or record
/// - `null`: a [`NullRoute`]
///
/// Every `SimRoute` built is remembered so its counters can be reported.
#[derive(Default)]
pub struct SimFactory {
    drain_budget: Option<DrainBudget>,
    stats: RouteStats,
    destinations: Mutex<Vec<Arc<SimRoute>>>,
}

impl SimFactory {
    pub fn new(drain_budget: Option<DrainBudget>, stats: RouteStats) -> Self {
        Self {
            drain_budget,
            stats,
            destinations: Mutex::new(Vec::new()),
        }
    }

    /// Build a fan-out route sharing this factory's budget and stats.
    pub fn build_all_fastest(
        &self,
        node: &Value,
    ) -> Result<AllFastestRoute<McRequest, McReply>, ConfigError> {
        let route = AllFastestRoute::from_config(self, node)?.with_stats(self.stats.clone());
        Ok(match &self.drain_budget {
            Some(budget) => route.with_drain_budget(budget.clone()),
            None => route,
        })
    }

    pub fn destinations(&self) -> Vec<Arc<SimRoute>> {
        match self.destinations.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn remember(&self, route: Arc<SimRoute>) {
        match self.destinations.lock() {
            Ok(mut guard) => guard.push(route),
            Err(poisoned) => poisoned.into_inner().push(route),
        }
    }
}

impl RouteHandleFactory<McRequest, McReply> for SimFactory {
    fn create(&self, node: &Value) -> Result<RouteHandlePtr<McRequest, McReply>, ConfigError> {
        let Value::Object(fields) = node else {
            return Err(ConfigError::InvalidNode(format!(
                "expected an object, got `{node}`"
            )));
        };

        let kind = match fields.get("type") {
            None => "sim",
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => {
                return Err(ConfigError::InvalidNode(format!(
                    "`type` must be a string, got `{other}`"
                )))
            }
        };

        match kind {
            "sim" => {
                let spec: SimSpec = serde_json::from_value(node.clone())?;
                let route = Arc::new(SimRoute::from_spec(&spec));
                self.remember(Arc::clone(&route));
                Ok(route)
            }
            kind if kind == AllFastestRoute::<McRequest, McReply>::ROUTE_NAME => {
                Ok(Arc::new(self.build_all_fastest(node)?))
            }
            kind if kind == NullRoute::ROUTE_NAME => Ok(Arc::new(NullRoute)),
            other => Err(ConfigError::UnknownType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::route::RequestContext;

    #[test]
    fn test_create_sim_from_node() {
        let factory = SimFactory::default();
        let route = factory
            .create(&json!({"name": "east", "latency_ms": 5, "result": "timeout"}))
            .unwrap();
        assert_eq!(route.name(), "east");
        assert_eq!(factory.destinations().len(), 1);
    }

    #[test]
    fn test_nested_all_fastest() {
        let factory = SimFactory::default();
        let route = factory
            .create(&json!({
                "type": "all-fastest",
                "children": [
                    {"name": "a"},
                    {"type": "all-fastest", "children": [{"name": "b"}, {"name": "c"}]}
                ]
            }))
            .unwrap();
        assert_eq!(route.name(), "all-fastest|2");
        assert_eq!(factory.destinations().len(), 3);
    }

    #[test]
    fn test_factory_errors() {
        let factory = SimFactory::default();

        let err = factory.create(&json!({"type": "hash", "children": []})).err().unwrap();
        assert!(matches!(err, ConfigError::UnknownType(ref t) if t == "hash"));

        let err = factory.create(&json!("east")).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidNode(_)));

        let err = factory.create(&json!({"type": 3})).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidNode(_)));

        // Missing `name`
        let err = factory.create(&json!({"latency_ms": 1})).err().unwrap();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sim_route_counts_and_names_reply() {
        let sim = SimRoute::new("west", Duration::from_millis(3), ReplyResult::Found);
        let ctx = RequestContext::new();
        let reply = sim.route(&McRequest::new("k"), Operation::Get, &ctx).await.unwrap();

        assert_eq!(reply.result(), ReplyResult::Found);
        assert_eq!(reply.value().map(|v| v.as_ref()), Some(&b"west"[..]));
        assert_eq!(sim.calls(), 1);
        assert_eq!(sim.completions(), 1);
    }
}
