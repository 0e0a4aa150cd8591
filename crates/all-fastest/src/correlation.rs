//! Correlation IDs tying a routed request to every destination call it spawns.

use uuid::Uuid;

/// Generate a new correlation ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
