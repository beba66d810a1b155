use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use log::trace;
use tokio::sync::OnceCell;
use url::Url;

use super::{Consume, Resource, ResourceProperties};
use crate::error::ReadResult;
use crate::range;

type Produced = Pin<Box<dyn Future<Output = ReadResult<Vec<u8>>> + Send>>;
type Producer = Box<dyn Fn() -> Produced + Send + Sync>;

enum Content {
    Literal(Arc<[u8]>),
    Lazy {
        producer: Producer,
        data: OnceCell<ReadResult<Arc<[u8]>>>,
    },
}

/// Resource serving in-memory bytes.
///
/// Literal data reports its exact length. Data produced by a deferred
/// function ([`DataResource::lazy`]) is computed once on first read and
/// reports an unknown length, since the producer may fail.
pub struct DataResource {
    content: Content,
    source_url: Option<Url>,
    properties: ResourceProperties,
}

impl DataResource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self::with_content(Content::Literal(Arc::from(data.into())))
    }

    /// Builds the content on first access with `producer`, then memoises it.
    pub fn lazy<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ReadResult<Vec<u8>>> + Send + 'static,
    {
        Self::with_content(Content::Lazy {
            producer: Box::new(move || {
                let produced: Produced = Box::pin(producer());
                produced
            }),
            data: OnceCell::new(),
        })
    }

    fn with_content(content: Content) -> Self {
        Self {
            content,
            source_url: None,
            properties: ResourceProperties::default(),
        }
    }

    pub fn with_source_url(mut self, url: Url) -> Self {
        self.source_url = Some(url);
        self
    }

    pub fn with_properties(mut self, properties: ResourceProperties) -> Self {
        self.properties = properties;
        self
    }

    async fn data(&self) -> ReadResult<Arc<[u8]>> {
        match &self.content {
            Content::Literal(data) => Ok(data.clone()),
            Content::Lazy { producer, data } => data
                .get_or_init(|| async {
                    trace!("producing deferred resource content");
                    producer().await.map(Arc::from)
                })
                .await
                .clone(),
        }
    }
}

impl From<Vec<u8>> for DataResource {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for DataResource {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl From<String> for DataResource {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}

impl From<&str> for DataResource {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

#[async_trait]
impl Resource for DataResource {
    fn source_url(&self) -> Option<&Url> {
        self.source_url.as_ref()
    }

    async fn properties(&self) -> ReadResult<ResourceProperties> {
        Ok(self.properties.clone())
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        Ok(match &self.content {
            Content::Literal(data) => Some(data.len() as u64),
            Content::Lazy { .. } => None,
        })
    }

    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()> {
        let data = self.data().await?;
        consume(range::slice(&data, range));
        Ok(())
    }
}
