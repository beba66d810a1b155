use std::ops::Range;

use async_trait::async_trait;
use log::trace;
use tokio::sync::Mutex;
use url::Url;

use super::{Consume, Resource, ResourceProperties};
use crate::error::ReadResult;
use crate::range;

/// Window of upstream bytes kept between reads.
struct Buffer {
    data: Vec<u8>,
    /// Absolute range of the upstream represented by `data`.
    range: Range<u64>,
}

/// Resource keeping a bounded window of recently read bytes.
///
/// Meant for expensive upstreams read mostly sequentially, such as HTTP or
/// per-block decryption. Each miss issues exactly one upstream read of at
/// least `buffer_size` bytes (when the resource is long enough), and keeps
/// the last `buffer_size` bytes of it for the next call. Whole-resource reads
/// and upstreams of unknown length are passed through untouched.
pub struct BufferingResource<R> {
    upstream: R,
    buffer_size: u64,
    buffer: Mutex<Option<Buffer>>,
}

impl<R: Resource> BufferingResource<R> {
    pub const DEFAULT_BUFFER_SIZE: usize = 8192;

    /// A `buffer_size` of zero is treated as one.
    pub fn new(upstream: R, buffer_size: usize) -> Self {
        Self {
            upstream,
            buffer_size: buffer_size.max(1) as u64,
            buffer: Mutex::new(None),
        }
    }

    pub fn with_default_size(upstream: R) -> Self {
        Self::new(upstream, Self::DEFAULT_BUFFER_SIZE)
    }

    pub fn upstream(&self) -> &R {
        &self.upstream
    }

    /// Range to fetch for a miss on `requested`, at least `buffer_size`
    /// bytes long when `length` allows it.
    fn fetch_range(&self, requested: &Range<u64>, length: u64) -> Range<u64> {
        let end = requested
            .end
            .max(requested.start.saturating_add(self.buffer_size))
            .min(length);
        let start = requested.start.min(end.saturating_sub(self.buffer_size));
        start..end
    }
}

#[async_trait]
impl<R: Resource> Resource for BufferingResource<R> {
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
        let Some(range) = range else {
            return self.upstream.stream(None, consume).await;
        };
        let Some(length) = self.upstream.estimated_length().await? else {
            return self.upstream.stream(Some(range), consume).await;
        };

        let requested = range::clamp(range, length);
        if requested.is_empty() {
            consume(&[]);
            return Ok(());
        }

        let mut buffer = self.buffer.lock().await;

        let mut prefix: &[u8] = &[];
        let mut fetch = self.fetch_range(&requested, length);
        if let Some(current) = buffer.as_ref() {
            if range::contains(&current.range, &requested) {
                let start = (requested.start - current.range.start) as usize;
                let end = (requested.end - current.range.start) as usize;
                consume(&current.data[start..end]);
                return Ok(());
            }
            if current.range.contains(&requested.start) {
                prefix = &current.data[(requested.start - current.range.start) as usize..];
                fetch = current.range.end..fetch.end.max(current.range.end);
            }
        }

        trace!(
            "buffer miss for {}..{}, fetching {}..{} ({} bytes reused)",
            requested.start,
            requested.end,
            fetch.start,
            fetch.end,
            prefix.len()
        );
        let fetched = self.upstream.read(Some(fetch.clone())).await?;

        // `data` covers `data_start..data_start + data.len()` of the upstream.
        let data_start = fetch.start - prefix.len() as u64;
        let mut data = Vec::with_capacity(prefix.len() + fetched.len());
        data.extend_from_slice(prefix);
        data.extend_from_slice(&fetched);

        let offset = ((requested.start - data_start) as usize).min(data.len());
        let end = ((requested.end - data_start) as usize).min(data.len());
        consume(&data[offset..end]);

        let kept = data.len().min(self.buffer_size as usize);
        let kept_start = data_start + (data.len() - kept) as u64;
        data.drain(..data.len() - kept);
        *buffer = Some(Buffer {
            range: kept_start..kept_start + kept as u64,
            data,
        });

        Ok(())
    }
}
