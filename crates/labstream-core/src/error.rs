//! Error taxonomy shared by the store, the sink and log replay.

use std::io;

use thiserror::Error;

use crate::reading::Timestamp;

/// Everything that can go wrong talking to the store or its durable logs.
///
/// None of these are fatal to the process: producers log them and move on to
/// the next tick, and the HTTP surface maps them to status codes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lookup by channel id found nothing. Client error.
    #[error("unknown channel '{0}'")]
    UnknownChannel(String),

    /// The append would break the strictly increasing timestamp order.
    /// The history was left untouched.
    #[error("out-of-order reading for '{channel}': {attempted} is not after {last}")]
    OutOfOrder {
        channel: String,
        attempted: Timestamp,
        last: Timestamp,
    },

    /// The durable log could not be written or read. Any in-memory append
    /// that preceded the write stands.
    #[error("persistence failed for '{channel}': {source}")]
    Persistence {
        channel: String,
        #[source]
        source: io::Error,
    },

    /// A durable log row could not be parsed back into a reading.
    #[error("corrupt log for '{channel}' at line {line}: {reason}")]
    CorruptLog {
        channel: String,
        line: usize,
        reason: String,
    },
}

impl StoreError {
    /// Whether the error is the caller's fault rather than the store's.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::UnknownChannel(_) | StoreError::OutOfOrder { .. }
        )
    }
}
