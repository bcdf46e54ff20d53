//! The incoming record type.

use serde::{Deserialize, Serialize};

use crate::headers::{HeaderValue, Headers};

/// A record delivered by the consumer loop.
///
/// The resolution core treats this as an opaque value: handlers may receive
/// it whole, and extractors read pieces of it (currently only
/// [`headers`](Self::headers)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerRecord {
    /// Topic the record was read from.
    pub topic: String,

    /// Partition within the topic.
    #[serde(default)]
    pub partition: i32,

    /// Offset within the partition.
    #[serde(default)]
    pub offset: i64,

    /// Timestamp in milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: i64,

    /// Record key, if any.
    #[serde(default)]
    pub key: Option<Vec<u8>>,

    /// Record payload, if any.
    #[serde(default)]
    pub value: Option<Vec<u8>>,

    /// Record headers, either mapping- or sequence-shaped.
    #[serde(default)]
    pub headers: Headers,
}

impl ConsumerRecord {
    /// Creates an empty record for `topic` at partition 0, offset 0.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition: 0,
            offset: 0,
            timestamp: 0,
            key: None,
            value: None,
            headers: Headers::default(),
        }
    }

    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Replaces the whole header collection.
    pub fn with_headers(mut self, headers: impl Into<Headers>) -> Self {
        self.headers = headers.into();
        self
    }

    /// Adds one header, see [`Headers::push`].
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.push(key, value);
        self
    }
}
