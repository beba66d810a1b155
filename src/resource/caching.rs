use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::OnceCell;
use url::Url;

use super::{Consume, Resource, ResourceProperties};
use crate::error::ReadResult;
use crate::range;

/// Resource reading its whole upstream once, then serving every range from
/// memory.
///
/// The first read of any range fetches the full content; the outcome,
/// success or failure, is kept for the lifetime of the resource. Only use it
/// for resources that comfortably fit in memory.
pub struct CachingResource<R> {
    upstream: R,
    cache: OnceCell<ReadResult<Arc<[u8]>>>,
}

impl<R: Resource> CachingResource<R> {
    pub fn new(upstream: R) -> Self {
        Self {
            upstream,
            cache: OnceCell::new(),
        }
    }

    pub fn upstream(&self) -> &R {
        &self.upstream
    }

    async fn data(&self) -> ReadResult<Arc<[u8]>> {
        self.cache
            .get_or_init(|| async {
                debug!(
                    "caching the full content of {:?}",
                    self.upstream.source_url().map(Url::as_str)
                );
                self.upstream.read(None).await.map(Arc::from)
            })
            .await
            .clone()
    }
}

#[async_trait]
impl<R: Resource> Resource for CachingResource<R> {
    fn source_url(&self) -> Option<&Url> {
        self.upstream.source_url()
    }

    async fn properties(&self) -> ReadResult<ResourceProperties> {
        self.upstream.properties().await
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        match self.cache.get() {
            Some(Ok(data)) => Ok(Some(data.len() as u64)),
            _ => self.upstream.estimated_length().await,
        }
    }

    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()> {
        let data = self.data().await?;
        consume(range::slice(&data, range));
        Ok(())
    }
}
