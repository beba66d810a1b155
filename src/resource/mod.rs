//! The [`Resource`] abstraction and its decorators.
//!
//! A resource is an asynchronous, range-readable byte source. Terminal
//! resources ([`DataResource`], [`FailureResource`], and the file/HTTP
//! resources in [`crate::io`]) produce bytes themselves; decorators wrap
//! another resource and keep the same contract:
//!
//! - [`BufferingResource`] keeps a bounded window of recently read bytes.
//! - [`CachingResource`] reads its upstream once and serves everything from memory.
//! - [`TailCachingResource`] caches the suffix starting at a fixed offset.
//! - [`TransformingResource`] applies a whole-content transform once.
//!
//! Chains are usually built with [`ResourceExt`]:
//!
//! ```no_run
//! use bookres::{DataResource, Resource, ResourceExt};
//!
//! # async fn demo() -> bookres::ReadResult<()> {
//! let resource = DataResource::from("Hello, world")
//!     .buffered(4096)
//!     .map_as_string(|text| text.to_uppercase());
//! assert_eq!(resource.read_as_string(Some(0..5)).await?, "HELLO");
//! # Ok(())
//! # }
//! ```

mod buffering;
mod caching;
mod container;
mod data;
mod failure;
mod properties;
mod tail_caching;
mod transforming;

pub use buffering::BufferingResource;
pub use caching::CachingResource;
pub use container::{Container, MemoryContainer};
pub use data::DataResource;
pub use failure::FailureResource;
pub use properties::{FILENAME_KEY, MEDIA_TYPE_KEY, ResourceProperties, media_type_for_path};
pub use tail_caching::TailCachingResource;
pub use transforming::TransformingResource;

use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::{ReadError, ReadResult};

/// Callback receiving successive chunks of a [`Resource::stream`] call.
pub type Consume<'a> = dyn FnMut(&[u8]) + Send + 'a;

/// Random access, asynchronous byte source.
///
/// Implementations must clamp requested ranges to `[0, length)`. A range that
/// clamps to empty results in a single `consume(&[])` call and `Ok(())`.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Where the bytes physically reside, if anywhere.
    fn source_url(&self) -> Option<&Url> {
        None
    }

    /// Metadata about the resource.
    async fn properties(&self) -> ReadResult<ResourceProperties> {
        Ok(ResourceProperties::default())
    }

    /// Best-effort length in bytes. `Ok(None)` means the length is unknown.
    ///
    /// This is a hint: only rely on it for optimisations.
    async fn estimated_length(&self) -> ReadResult<Option<u64>>;

    /// Reads `range` (or everything for `None`) and passes the bytes to
    /// `consume`, possibly in several chunks delivered in order.
    ///
    /// If an error is returned after `consume` was called, the bytes already
    /// delivered are incomplete and must be discarded.
    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()>;

    /// Reads `range` (or everything for `None`) into memory.
    async fn read(&self, range: Option<Range<u64>>) -> ReadResult<Vec<u8>> {
        let mut data = Vec::new();
        self.stream(range, &mut |chunk: &[u8]| data.extend_from_slice(chunk))
            .await?;
        Ok(data)
    }

    /// Reads `range` and decodes it as UTF-8.
    async fn read_as_string(&self, range: Option<Range<u64>>) -> ReadResult<String> {
        let data = self.read(range).await?;
        String::from_utf8(data)
            .map_err(|e| ReadError::decoding_with("content is not valid UTF-8", e))
    }

    /// Reads `range` and parses it as a JSON document.
    async fn read_as_json(&self, range: Option<Range<u64>>) -> ReadResult<serde_json::Value> {
        let data = self.read(range).await?;
        serde_json::from_slice(&data)
            .map_err(|e| ReadError::decoding_with("content is not valid JSON", e))
    }
}

#[async_trait]
impl<R: Resource + ?Sized> Resource for Arc<R> {
    fn source_url(&self) -> Option<&Url> {
        (**self).source_url()
    }

    async fn properties(&self) -> ReadResult<ResourceProperties> {
        (**self).properties().await
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        (**self).estimated_length().await
    }

    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()> {
        (**self).stream(range, consume).await
    }

    async fn read(&self, range: Option<Range<u64>>) -> ReadResult<Vec<u8>> {
        (**self).read(range).await
    }
}

#[async_trait]
impl<R: Resource + ?Sized> Resource for Box<R> {
    fn source_url(&self) -> Option<&Url> {
        (**self).source_url()
    }

    async fn properties(&self) -> ReadResult<ResourceProperties> {
        (**self).properties().await
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        (**self).estimated_length().await
    }

    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()> {
        (**self).stream(range, consume).await
    }

    async fn read(&self, range: Option<Range<u64>>) -> ReadResult<Vec<u8>> {
        (**self).read(range).await
    }
}

/// Decorator and composition helpers available on every sized resource.
pub trait ResourceExt: Resource + Sized + 'static {
    /// Wraps `self` in a [`BufferingResource`] with the given window size.
    fn buffered(self, buffer_size: usize) -> BufferingResource<Self> {
        BufferingResource::new(self, buffer_size)
    }

    /// Wraps `self` in a [`CachingResource`].
    fn cached(self) -> CachingResource<Self> {
        CachingResource::new(self)
    }

    /// Wraps `self` in a [`TailCachingResource`] caching from `offset`.
    fn tail_cached(self, offset: u64) -> TailCachingResource<Self> {
        TailCachingResource::new(self, offset)
    }

    /// Applies a byte-level transform to the whole content.
    fn map<F>(self, transform: F) -> TransformingResource<Self>
    where
        F: Fn(Vec<u8>) -> ReadResult<Vec<u8>> + Send + Sync + 'static,
    {
        TransformingResource::new(self, transform)
    }

    /// Applies a string-level transform to the whole content.
    ///
    /// The content is decoded as UTF-8; invalid data fails the read with
    /// [`ReadError::Decoding`].
    fn map_as_string<F>(self, transform: F) -> TransformingResource<Self>
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.map(move |data| {
            let text = String::from_utf8(data)
                .map_err(|e| ReadError::decoding_with("content is not valid UTF-8", e))?;
            Ok(transform(text).into_bytes())
        })
    }

    /// Erases the concrete type behind a shared trait object.
    fn into_shared(self) -> Arc<dyn Resource> {
        Arc::new(self)
    }
}

impl<R: Resource + 'static> ResourceExt for R {}
