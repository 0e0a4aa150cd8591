//! Span builder macros for fan-out instrumentation.

/// Span covering one `route` call of a fan-out strategy.
///
/// Fields recorded once the race resolves:
/// - `winner`: index of the destination whose reply was returned
/// - `discarded`: failover replies skipped before the winner
/// - `pending`: destinations still in flight when the caller was answered
#[macro_export]
macro_rules! fanout_route_span {
    ($route:expr, $correlation_id:expr, $operation:expr, $destinations:expr) => {
        tracing::debug_span!(
            "fanout_route",
            route = %$route,
            correlation_id = %$correlation_id,
            operation = ?$operation,
            destinations = $destinations,
            winner = tracing::field::Empty,
            discarded = tracing::field::Empty,
            pending = tracing::field::Empty,
        )
    };
}

/// Span around a single destination call spawned by a fan-out.
#[macro_export]
macro_rules! destination_call_span {
    ($correlation_id:expr, $index:expr, $destination:expr) => {
        tracing::debug_span!(
            "destination_call",
            correlation_id = %$correlation_id,
            index = $index,
            destination = %$destination,
        )
    };
}

/// Span for the detached task that drains abandoned destination calls.
#[macro_export]
macro_rules! drain_span {
    ($correlation_id:expr, $pending:expr) => {
        tracing::debug_span!(
            "fanout_drain",
            correlation_id = %$correlation_id,
            pending = $pending,
            drained = tracing::field::Empty,
        )
    };
}
