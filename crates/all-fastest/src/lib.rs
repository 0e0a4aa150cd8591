//! All-fastest fan-out route for a cache routing tree.
//!
//! [`AllFastestRoute`] sends one request to every child route at once and
//! answers with the fastest reply that is not a failover error. Calls that
//! lose the race run to completion in the background.

pub mod all_fastest;
pub mod config;
pub mod correlation;
pub mod drain;
pub mod factory;
pub mod null_route;
pub mod protocol;
pub mod route;
pub mod sim;
pub mod stats;

pub use all_fastest::AllFastestRoute;
pub use drain::DrainBudget;
pub use factory::{ChildrenConfig, ConfigError, RouteHandleFactory};
pub use null_route::NullRoute;
pub use protocol::{McReply, McRequest, ReplyResult};
pub use route::{
    ContextPtr, Operation, Reply, RequestContext, RouteError, RouteHandle, RouteHandlePtr,
};
pub use stats::{RouteStats, StatsSnapshot};
