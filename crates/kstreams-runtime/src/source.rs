//! Record sources.
//!
//! A [`RecordSource`] yields the records a stream processes, one at a time,
//! until it is exhausted. The runtime never talks to a broker itself: a
//! consumer loop feeds a [`ChannelSource`], or any `futures::Stream` of
//! records is wrapped in a [`StreamSource`].

use async_trait::async_trait;
use futures::StreamExt;
use kstreams_core::ConsumerRecord;
use tokio::sync::mpsc;

/// Produces records for a stream.
#[async_trait]
pub trait RecordSource: Send + 'static {
    /// Returns the next record, or `None` once the source is exhausted.
    async fn next_record(&mut self) -> Option<ConsumerRecord>;
}

/// A type-erased record source.
pub type BoxedSource = Box<dyn RecordSource>;

#[async_trait]
impl RecordSource for BoxedSource {
    async fn next_record(&mut self) -> Option<ConsumerRecord> {
        (**self).next_record().await
    }
}

/// Records pushed through a tokio channel.
///
/// The source ends when every sender has been dropped and the buffer is
/// drained.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<ConsumerRecord>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<ConsumerRecord>) -> Self {
        Self { rx }
    }

    /// Creates a bounded channel and returns its sender with the source.
    pub fn channel(buffer: usize) -> (mpsc::Sender<ConsumerRecord>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl RecordSource for ChannelSource {
    async fn next_record(&mut self) -> Option<ConsumerRecord> {
        self.rx.recv().await
    }
}

/// Adapts any `futures::Stream` of records.
#[derive(Debug)]
pub struct StreamSource<S> {
    inner: S,
}

impl<S> StreamSource<S>
where
    S: futures::Stream<Item = ConsumerRecord> + Unpin + Send + 'static,
{
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<I> StreamSource<futures::stream::Iter<I>>
where
    I: Iterator<Item = ConsumerRecord> + Unpin + Send + 'static,
{
    /// A source replaying a fixed set of records, in order.
    pub fn iter<T>(records: T) -> Self
    where
        T: IntoIterator<Item = ConsumerRecord, IntoIter = I>,
    {
        Self::new(futures::stream::iter(records))
    }
}

#[async_trait]
impl<S> RecordSource for StreamSource<S>
where
    S: futures::Stream<Item = ConsumerRecord> + Unpin + Send + 'static,
{
    async fn next_record(&mut self) -> Option<ConsumerRecord> {
        self.inner.next().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, mut source) = ChannelSource::channel(4);
        tx.send(ConsumerRecord::new("a")).await.unwrap();
        tx.send(ConsumerRecord::new("b")).await.unwrap();
        drop(tx);

        assert_eq!(source.next_record().await.unwrap().topic, "a");
        assert_eq!(source.next_record().await.unwrap().topic, "b");
        assert!(source.next_record().await.is_none());
    }

    #[tokio::test]
    async fn test_iter_source_preserves_order() {
        let records = (0..3).map(|i| ConsumerRecord::new("events").with_offset(i));
        let mut source: BoxedSource = Box::new(StreamSource::iter(records));

        let mut offsets = Vec::new();
        while let Some(record) = source.next_record().await {
            offsets.push(record.offset);
        }
        assert_eq!(offsets, [0, 1, 2]);
    }
}
