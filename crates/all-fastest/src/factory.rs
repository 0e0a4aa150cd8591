//! Building destination sets from declarative route nodes.

use serde_json::Value;

use crate::route::RouteHandlePtr;

/// Errors raised while turning route nodes into route handles.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown route type `{0}`")]
    UnknownType(String),

    #[error("invalid route node: {0}")]
    InvalidNode(String),

    #[error("malformed route node: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Creates route handles from route nodes.
pub trait RouteHandleFactory<Req, Rep> {
    /// Build the route described by a single node.
    fn create(&self, node: &Value) -> Result<RouteHandlePtr<Req, Rep>, ConfigError>;

    /// Build one route per element of an array node; any other node yields
    /// a single route.
    fn create_list(&self, node: &Value) -> Result<Vec<RouteHandlePtr<Req, Rep>>, ConfigError> {
        match node {
            Value::Array(items) => items.iter().map(|item| self.create(item)).collect(),
            other => Ok(vec![self.create(other)?]),
        }
    }
}

/// The two accepted shapes of a fan-out route's configuration node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChildrenConfig<'a> {
    /// The node itself lists the children.
    List(&'a Value),
    /// An object; only its `children` field (if any) lists the children.
    Record { children: Option<&'a Value> },
}

impl<'a> ChildrenConfig<'a> {
    pub fn resolve(node: &'a Value) -> Self {
        match node {
            Value::Object(fields) => ChildrenConfig::Record {
                children: fields.get("children"),
            },
            other => ChildrenConfig::List(other),
        }
    }

    /// Expand into the destination set. A record without `children` is empty.
    pub fn expand<Req, Rep, F>(self, factory: &F) -> Result<Vec<RouteHandlePtr<Req, Rep>>, ConfigError>
    where
        F: RouteHandleFactory<Req, Rep> + ?Sized,
    {
        match self {
            ChildrenConfig::List(node) | ChildrenConfig::Record { children: Some(node) } => {
                factory.create_list(node)
            }
            ChildrenConfig::Record { children: None } => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resolve_shapes() {
        let list = json!(["a", "b"]);
        assert_eq!(ChildrenConfig::resolve(&list), ChildrenConfig::List(&list));

        let record = json!({"type": "all-fastest", "children": ["a"]});
        assert_eq!(
            ChildrenConfig::resolve(&record),
            ChildrenConfig::Record {
                children: Some(&json!(["a"]))
            }
        );

        let bare = json!({"type": "all-fastest"});
        assert_eq!(
            ChildrenConfig::resolve(&bare),
            ChildrenConfig::Record { children: None }
        );

        let single = json!("a");
        assert_eq!(ChildrenConfig::resolve(&single), ChildrenConfig::List(&single));
    }
}
