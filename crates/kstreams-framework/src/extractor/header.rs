use async_trait::async_trait;
use kstreams_core::{ConsumerRecord, HeaderValue, Headers};

use super::Extract;
use crate::argument::Argument;
use crate::error::{ExtractError, ExtractResult};

/// Reads the header stored under a fixed key.
///
/// When the key repeats, the **last** occurrence wins. The value is returned
/// as delivered, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderExtractor {
    key: String,
}

impl HeaderExtractor {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The header name this extractor looks up.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Looks the key up in `headers`.
    pub fn lookup(&self, headers: &Headers) -> ExtractResult<HeaderValue> {
        headers
            .last(&self.key)
            .cloned()
            .ok_or_else(|| ExtractError::HeaderNotFound {
                key: self.key.clone(),
            })
    }
}

#[async_trait]
impl Extract for HeaderExtractor {
    async fn extract(&self, record: &ConsumerRecord) -> ExtractResult<Argument> {
        self.lookup(&record.headers).map(Argument::Header)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio_test::{assert_ready, task};

    use super::*;

    fn record(headers: impl Into<Headers>) -> ConsumerRecord {
        ConsumerRecord::new("events").with_headers(headers)
    }

    #[test]
    fn test_single_match() {
        let headers = Headers::from([("event-type", "hello")]);
        let value = HeaderExtractor::new("event-type").lookup(&headers).unwrap();
        assert_eq!(value, "hello");
    }

    #[test]
    fn test_last_duplicate_wins() {
        let headers = Headers::from([("k", "a"), ("other", "x"), ("k", "b")]);
        let value = HeaderExtractor::new("k").lookup(&headers).unwrap();
        assert_eq!(value, "b");
    }

    #[test]
    fn test_missing_key() {
        let headers = Headers::from([("event_type", "hello")]);
        let err = HeaderExtractor::new("event-type")
            .lookup(&headers)
            .unwrap_err();
        assert_eq!(
            err,
            ExtractError::HeaderNotFound {
                key: "event-type".into()
            }
        );
    }

    #[test]
    fn test_key_match_is_exact() {
        let headers = Headers::from([("Event-Type", "hello"), ("event-type ", "x")]);
        assert!(HeaderExtractor::new("event-type").lookup(&headers).is_err());
    }

    #[test]
    fn test_mapping_headers() {
        let mut map = HashMap::new();
        map.insert("event-type".to_string(), HeaderValue::from("hello"));
        let value = HeaderExtractor::new("event-type")
            .lookup(&Headers::Map(map))
            .unwrap();
        assert_eq!(value, "hello");
    }

    #[test]
    fn test_bytes_are_not_converted() {
        let headers = Headers::from([("trace-id", b"\x00\x01".to_vec())]);
        let value = HeaderExtractor::new("trace-id").lookup(&headers).unwrap();
        assert_eq!(value, HeaderValue::Bytes(vec![0, 1]));
    }

    #[test]
    fn test_extract_never_suspends() {
        let extractor = HeaderExtractor::new("event-type");
        let record = record([("event-type", "hello")]);

        let mut fut = task::spawn(extractor.extract(&record));
        let argument = assert_ready!(fut.poll()).unwrap();

        assert!(matches!(argument, Argument::Header(value) if value == "hello"));
    }
}
