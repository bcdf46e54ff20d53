//! Extractors.
//!
//! An extractor is the executable half of a parameter binding: a recipe,
//! created once at build time by a [`Marker`](crate::marker::Marker), that
//! produces a value from whatever record it is later handed.
//!
//! # Core Concept
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait Extract: Send + Sync {
//!     async fn extract(&self, record: &ConsumerRecord) -> ExtractResult<Argument>;
//! }
//! ```
//!
//! Extraction is asynchronous so that future variants may await I/O. The
//! header variant never suspends.
//!
//! # Identity
//!
//! Extractors compare and hash by kind and key only. The plan uses this to
//! run each distinct extraction once per record even when several parameters
//! request it.

pub mod header;

use std::fmt;

use async_trait::async_trait;
use kstreams_core::ConsumerRecord;

use crate::argument::Argument;
use crate::error::ExtractResult;

pub use header::HeaderExtractor;

/// Produces a value from a record.
///
/// Implementors must not keep any reference to the record after `extract`
/// returns.
#[async_trait]
pub trait Extract: Send + Sync {
    /// Runs the extraction against `record`.
    async fn extract(&self, record: &ConsumerRecord) -> ExtractResult<Argument>;
}

/// Kind tag of an [`Extractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorKind {
    Header,
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
        }
    }
}

/// Every extractor a resolution plan can hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extractor {
    /// Reads a record header.
    Header(HeaderExtractor),
}

impl Extractor {
    pub fn kind(&self) -> ExtractorKind {
        match self {
            Self::Header(_) => ExtractorKind::Header,
        }
    }

    /// The extraction key, e.g. the header name.
    pub fn key(&self) -> &str {
        match self {
            Self::Header(header) => header.key(),
        }
    }
}

impl fmt::Display for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.key())
    }
}

#[async_trait]
impl Extract for Extractor {
    async fn extract(&self, record: &ConsumerRecord) -> ExtractResult<Argument> {
        match self {
            Self::Header(header) => header.extract(record).await,
        }
    }
}

impl From<HeaderExtractor> for Extractor {
    fn from(header: HeaderExtractor) -> Self {
        Self::Header(header)
    }
}
