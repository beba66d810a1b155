use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::OnceCell;

use super::{Consume, Resource, ResourceProperties};
use crate::error::ReadResult;
use crate::range;

type Transform = Box<dyn Fn(Vec<u8>) -> ReadResult<Vec<u8>> + Send + Sync>;

/// Resource applying a transform to the whole content of its upstream.
///
/// Used for transforms that need to see everything at once, like block
/// cipher decryption or text substitution. The upstream is read in full on
/// first access and the transformed output is memoised. Upstream failures
/// skip the transform and are replayed as-is.
///
/// The output length is unknown until read, and it no longer maps to the
/// upstream's physical location, so `estimated_length` is always `None` and
/// there is no source URL.
pub struct TransformingResource<R> {
    upstream: R,
    transform: Transform,
    data: OnceCell<ReadResult<Arc<[u8]>>>,
}

impl<R: Resource> TransformingResource<R> {
    pub fn new<F>(upstream: R, transform: F) -> Self
    where
        F: Fn(Vec<u8>) -> ReadResult<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            upstream,
            transform: Box::new(transform),
            data: OnceCell::new(),
        }
    }

    pub fn upstream(&self) -> &R {
        &self.upstream
    }

    async fn data(&self) -> ReadResult<Arc<[u8]>> {
        self.data.get_or_init(|| self.transformed()).await.clone()
    }

    async fn transformed(&self) -> ReadResult<Arc<[u8]>> {
        let content = self.upstream.read(None).await?;
        debug!("transforming {} bytes of content", content.len());
        (self.transform)(content).map(Arc::from)
    }
}

#[async_trait]
impl<R: Resource> Resource for TransformingResource<R> {
    async fn properties(&self) -> ReadResult<ResourceProperties> {
        self.upstream.properties().await
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        Ok(None)
    }

    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()> {
        let data = self.data().await?;
        consume(range::slice(&data, range));
        Ok(())
    }
}
