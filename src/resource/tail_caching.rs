use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::OnceCell;
use url::Url;

use super::{Consume, Resource, ResourceProperties};
use crate::error::ReadResult;
use crate::range;

/// Resource caching the suffix of its upstream starting at a fixed offset.
///
/// Container formats such as ZIP keep their directory at the end of the
/// file, and readers go back to it several times before anything else. Ranges
/// starting at or after `cache_from_offset` are served from a tail fetched
/// once; ranges ending before it go straight to the upstream. A whole read
/// (`None`) fetches the head from upstream and the rest from the tail.
pub struct TailCachingResource<R> {
    upstream: R,
    cache_from_offset: u64,
    tail: OnceCell<ReadResult<Arc<[u8]>>>,
}

impl<R: Resource> TailCachingResource<R> {
    pub fn new(upstream: R, cache_from_offset: u64) -> Self {
        Self {
            upstream,
            cache_from_offset,
            tail: OnceCell::new(),
        }
    }

    pub fn cache_from_offset(&self) -> u64 {
        self.cache_from_offset
    }

    pub fn upstream(&self) -> &R {
        &self.upstream
    }

    async fn tail(&self) -> ReadResult<Arc<[u8]>> {
        self.tail
            .get_or_init(|| async {
                debug!("caching resource tail from offset {}", self.cache_from_offset);
                self.upstream
                    .read(Some(self.cache_from_offset..u64::MAX))
                    .await
                    .map(Arc::from)
            })
            .await
            .clone()
    }

    /// Serves an absolute range starting at or after the cache offset.
    async fn read_tail(&self, range: Range<u64>, consume: &mut Consume<'_>) -> ReadResult<()> {
        let relative = range::shift_down(range, self.cache_from_offset)?;
        let tail = self.tail().await?;
        consume(range::slice(&tail, Some(relative)));
        Ok(())
    }
}

#[async_trait]
impl<R: Resource> Resource for TailCachingResource<R> {
    fn source_url(&self) -> Option<&Url> {
        self.upstream.source_url()
    }

    async fn properties(&self) -> ReadResult<ResourceProperties> {
        self.upstream.properties().await
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        self.upstream.estimated_length().await
    }

    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()> {
        // Whole reads are the head followed by the cached tail.
        let range = range.unwrap_or(0..u64::MAX);

        let offset = self.cache_from_offset;
        if range.start >= offset {
            return self.read_tail(range, consume).await;
        }
        if range.end <= offset {
            return self.upstream.stream(Some(range), consume).await;
        }

        // Straddles the offset: head from upstream, the rest from the tail.
        let head = self.upstream.read(Some(range.start..offset)).await?;
        let tail = self.tail().await?;
        let rest = range::slice(&tail, Some(range::shift_down(offset..range.end, offset)?));
        if !head.is_empty() {
            consume(&head);
        }
        if !rest.is_empty() || head.is_empty() {
            consume(rest);
        }
        Ok(())
    }
}
