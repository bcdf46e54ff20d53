//! Record headers.
//!
//! Kafka clients hand headers over in two shapes: a mapping of key to value
//! (after a deserializer rewrote them) or the wire-level ordered sequence of
//! `(key, bytes)` pairs, which may repeat keys. [`Headers`] keeps whichever
//! shape it was given and exposes [`Headers::iter`] to walk both as ordered
//! `(key, value)` pairs.

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::slice;

use serde::{Deserialize, Serialize};

// ============================================================================
// HeaderValue
// ============================================================================

/// A single header value, exactly as delivered.
///
/// No conversion ever happens between the two variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    /// Text value, as produced by mapping-style headers.
    Text(String),
    /// Raw bytes, as carried by encoded Kafka headers.
    Bytes(Vec<u8>),
}

impl HeaderValue {
    /// Returns the text if this is a [`HeaderValue::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the underlying bytes of either variant.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for HeaderValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl PartialEq<str> for HeaderValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for HeaderValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

// ============================================================================
// Headers
// ============================================================================

/// The header collection of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Headers {
    /// Key to value mapping. Keys are unique.
    Map(HashMap<String, HeaderValue>),
    /// Ordered `(key, value)` pairs. Keys may repeat.
    Pairs(Vec<(String, HeaderValue)>),
}

impl Default for Headers {
    fn default() -> Self {
        Self::Pairs(Vec::new())
    }
}

impl Headers {
    /// Creates an empty, sequence-shaped header collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates over all headers as `(key, value)` pairs.
    ///
    /// Sequence-shaped headers are yielded in their original order, including
    /// repeated keys. Mapping-shaped headers are yielded in map order.
    pub fn iter(&self) -> Iter<'_> {
        let inner = match self {
            Self::Map(map) => IterInner::Map(map.iter()),
            Self::Pairs(pairs) => IterInner::Pairs(pairs.iter()),
        };
        Iter { inner }
    }

    /// Returns every value stored under `key`, in order.
    pub fn get_all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a HeaderValue> {
        self.iter()
            .filter(move |(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    /// Returns the last value stored under `key`.
    pub fn last(&self, key: &str) -> Option<&HeaderValue> {
        self.get_all(key).last()
    }

    /// Adds a header.
    ///
    /// Sequence-shaped headers append (keeping earlier entries with the same
    /// key); mapping-shaped headers replace.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<HeaderValue>) {
        match self {
            Self::Map(map) => {
                map.insert(key.into(), value.into());
            }
            Self::Pairs(pairs) => pairs.push((key.into(), value.into())),
        }
    }

    /// Number of entries, counting repeated keys.
    pub fn len(&self) -> usize {
        match self {
            Self::Map(map) => map.len(),
            Self::Pairs(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a HeaderValue);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Pairs(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Headers
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<Vec<(String, HeaderValue)>> for Headers {
    fn from(pairs: Vec<(String, HeaderValue)>) -> Self {
        Self::Pairs(pairs)
    }
}

impl From<HashMap<String, HeaderValue>> for Headers {
    fn from(map: HashMap<String, HeaderValue>) -> Self {
        Self::Map(map)
    }
}

/// Iterator over [`Headers`] entries.
pub struct Iter<'a> {
    inner: IterInner<'a>,
}

enum IterInner<'a> {
    Map(hash_map::Iter<'a, String, HeaderValue>),
    Pairs(slice::Iter<'a, (String, HeaderValue)>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a HeaderValue);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterInner::Map(iter) => iter.next().map(|(key, value)| (key.as_str(), value)),
            IterInner::Pairs(iter) => iter.next().map(|(key, value)| (key.as_str(), value)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Map(iter) => iter.size_hint(),
            IterInner::Pairs(iter) => iter.size_hint(),
        }
    }
}
