//! Cache request and reply values routed by the tree.
//!
//! Only the fields routing strategies look at are modelled here; encoding
//! them on the wire is the job of the surrounding proxy.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::route::{Operation, Reply};

/// A keyed cache request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McRequest {
    key: Bytes,
    value: Option<Bytes>,
    flags: u64,
    exptime: u32,
}

impl McRequest {
    pub fn new(key: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: None,
            flags: 0,
            exptime: 0,
        }
    }

    pub fn with_value(mut self, value: impl Into<Bytes>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_exptime(mut self, exptime: u32) -> Self {
        self.exptime = exptime;
        self
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    pub fn flags(&self) -> u64 {
        self.flags
    }

    pub fn exptime(&self) -> u32 {
        self.exptime
    }
}

/// Outcome carried by a [`McReply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyResult {
    Found,
    NotFound,
    Stored,
    NotStored,
    Exists,
    Deleted,
    Touched,
    Ok,
    ClientError,
    BadKey,
    Busy,
    TryAgain,
    Tko,
    LocalError,
    ConnectError,
    ConnectTimeout,
    Timeout,
    RemoteError,
}

impl ReplyResult {
    /// Results that say "ask someone else" rather than "this is the answer".
    pub fn is_failover_error(self) -> bool {
        matches!(
            self,
            ReplyResult::Busy
                | ReplyResult::TryAgain
                | ReplyResult::Tko
                | ReplyResult::LocalError
                | ReplyResult::ConnectError
                | ReplyResult::ConnectTimeout
                | ReplyResult::Timeout
                | ReplyResult::RemoteError
        )
    }

    pub fn is_error(self) -> bool {
        self.is_failover_error() || matches!(self, ReplyResult::ClientError | ReplyResult::BadKey)
    }
}

/// Reply to a [`McRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McReply {
    result: ReplyResult,
    value: Option<Bytes>,
}

impl McReply {
    pub fn new(result: ReplyResult) -> Self {
        Self {
            result,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Bytes>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn result(&self) -> ReplyResult {
        self.result
    }

    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }
}

impl Reply for McReply {
    fn is_failover_error(&self) -> bool {
        self.result.is_failover_error()
    }

    fn null_reply(op: Operation) -> Self {
        let result = match op {
            Operation::Set => ReplyResult::NotStored,
            Operation::Version => ReplyResult::Ok,
            Operation::Get
            | Operation::Delete
            | Operation::Touch
            | Operation::Incr
            | Operation::Decr => ReplyResult::NotFound,
        };
        McReply::new(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failover_classification() {
        for result in [
            ReplyResult::Busy,
            ReplyResult::TryAgain,
            ReplyResult::Tko,
            ReplyResult::LocalError,
            ReplyResult::ConnectError,
            ReplyResult::ConnectTimeout,
            ReplyResult::Timeout,
            ReplyResult::RemoteError,
        ] {
            assert!(McReply::new(result).is_failover_error(), "{result:?}");
        }

        // Client-side errors are final answers.
        assert!(!ReplyResult::ClientError.is_failover_error());
        assert!(ReplyResult::ClientError.is_error());
        assert!(!ReplyResult::NotFound.is_failover_error());
        assert!(!ReplyResult::NotFound.is_error());
    }

    #[test]
    fn test_null_reply_per_operation() {
        assert_eq!(McReply::null_reply(Operation::Get).result(), ReplyResult::NotFound);
        assert_eq!(McReply::null_reply(Operation::Set).result(), ReplyResult::NotStored);
        assert_eq!(McReply::null_reply(Operation::Version).result(), ReplyResult::Ok);
        assert!(McReply::null_reply(Operation::Delete).value().is_none());
    }

    #[test]
    fn test_request_builder() {
        let req = McRequest::new("user:42")
            .with_value("payload")
            .with_flags(7)
            .with_exptime(60);
        assert_eq!(req.key().as_ref(), b"user:42");
        assert_eq!(req.value().map(|v| v.as_ref()), Some(&b"payload"[..]));
        assert_eq!(req.flags(), 7);
        assert_eq!(req.exptime(), 60);
    }

    #[test]
    fn test_result_names() {
        let result: ReplyResult = serde_json::from_str("\"connect_timeout\"").unwrap();
        assert_eq!(result, ReplyResult::ConnectTimeout);
    }
}
