//! Terminal route answering every request with the reply type's null reply.

use async_trait::async_trait;

use crate::route::{ContextPtr, Operation, Reply, RouteError, RouteHandle};

/// Route that never contacts a backend.
///
/// Used wherever a strategy has nothing to fan out to.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRoute;

impl NullRoute {
    pub const ROUTE_NAME: &'static str = "null";
}

#[async_trait]
impl<Req, Rep> RouteHandle<Req, Rep> for NullRoute
where
    Req: Sync,
    Rep: Reply,
{
    fn name(&self) -> String {
        Self::ROUTE_NAME.to_string()
    }

    async fn route(&self, _req: &Req, op: Operation, _ctx: &ContextPtr) -> Result<Rep, RouteError> {
        Ok(Rep::null_reply(op))
    }
}
