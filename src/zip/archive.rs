use std::collections::BTreeMap;
use std::io::Read;
use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use flate2::read::DeflateDecoder;
use log::{debug, trace};
use serde_json::json;
use tokio::sync::OnceCell;

use super::parser::{TRAILER_SIZE, ZipParser};
use super::structures::{CompressionMethod, ZipEntry};
use crate::error::{ReadError, ReadResult};
use crate::range;
use crate::resource::{
    Consume, Container, Resource, ResourceExt, ResourceProperties, TailCachingResource,
    media_type_for_path,
};

/// Key of the archive entry properties added to every entry resource.
pub const ARCHIVE_KEY: &str = "archive";

/// ZIP archive exposing each entry as a [`Resource`].
///
/// The archive trailer is read through a [`TailCachingResource`], so locating
/// the end of central directory costs a single upstream request.
pub struct ZipArchive {
    reader: Arc<TailCachingResource<Arc<dyn Resource>>>,
    entries: BTreeMap<String, ZipEntry>,
}

impl ZipArchive {
    /// Reads the central directory of the archive held by `resource`.
    pub async fn open(resource: Arc<dyn Resource>) -> ReadResult<Self> {
        let size = resource
            .estimated_length()
            .await?
            .ok_or_else(|| ReadError::decoding("cannot open a ZIP archive of unknown length"))?;

        let reader = Arc::new(resource.tail_cached(size.saturating_sub(TRAILER_SIZE)));
        let entries = ZipParser::new(reader.as_ref(), size).list_entries().await?;
        debug!("opened ZIP archive with {} entries", entries.len());

        Ok(Self {
            reader,
            entries: entries
                .into_iter()
                .filter(|entry| !entry.is_directory())
                .map(|entry| (entry.path.clone(), entry))
                .collect(),
        })
    }

    /// File entries of the archive, sorted by path.
    pub fn entries(&self) -> impl Iterator<Item = &ZipEntry> {
        self.entries.values()
    }

    /// Resource reading the entry at `path`.
    pub fn entry(&self, path: &str) -> ReadResult<ZipEntryResource> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let entry = self.entries.get(path).ok_or_else(ReadError::not_found)?;
        Ok(ZipEntryResource {
            archive: self.reader.clone(),
            entry: entry.clone(),
            data_offset: OnceCell::new(),
        })
    }
}

impl Container for ZipArchive {
    fn entries(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn get(&self, href: &str) -> Option<Arc<dyn Resource>> {
        self.entry(href).ok().map(ResourceExt::into_shared)
    }
}

/// Resource reading one entry of a [`ZipArchive`].
///
/// Stored entries map ranges directly onto the archive. Deflated entries are
/// inflated from the start and the bytes before the requested range are
/// skipped.
pub struct ZipEntryResource {
    archive: Arc<TailCachingResource<Arc<dyn Resource>>>,
    entry: ZipEntry,
    data_offset: OnceCell<ReadResult<u64>>,
}

impl ZipEntryResource {
    pub fn entry(&self) -> &ZipEntry {
        &self.entry
    }

    async fn data_offset(&self) -> ReadResult<u64> {
        self.data_offset.get_or_init(|| self.read_data_offset()).await.clone()
    }

    async fn read_data_offset(&self) -> ReadResult<u64> {
        let size = self.archive.estimated_length().await?.unwrap_or(u64::MAX);
        ZipParser::new(self.archive.as_ref(), size).data_offset(&self.entry).await
    }

    /// Absolute range of the entry's stored bytes in the archive.
    async fn data_range(&self) -> ReadResult<Range<u64>> {
        let offset = self.data_offset().await?;
        let stored_len = match self.entry.compression_method {
            CompressionMethod::Stored => self.entry.uncompressed_size,
            _ => self.entry.compressed_size,
        };
        let end = offset.checked_add(stored_len).ok_or_else(|| self.out_of_bounds())?;
        if let Some(size) = self.archive.estimated_length().await? {
            if end > size {
                return Err(self.out_of_bounds());
            }
        }
        Ok(offset..end)
    }

    fn out_of_bounds(&self) -> ReadError {
        ReadError::decoding(format!("data of {} lies outside the archive", self.entry.path))
    }

    /// Streams the inflated bytes of `wanted` out of the compressed data.
    fn inflate(
        &self,
        compressed: &[u8],
        wanted: Range<u64>,
        consume: &mut Consume<'_>,
    ) -> ReadResult<()> {
        let mut decoder = DeflateDecoder::new(compressed);
        let mut buf = vec![0u8; 32 * 1024];
        let mut position = 0u64;
        let mut delivered = false;
        while position < wanted.end {
            let n = decoder.read(&mut buf).map_err(|e| {
                ReadError::decoding_with(format!("failed to inflate {}", self.entry.path), e)
            })?;
            if n == 0 {
                break;
            }
            let part = range::intersect(position..position + n as u64, wanted.clone());
            if !part.is_empty() {
                consume(&buf[(part.start - position) as usize..(part.end - position) as usize]);
                delivered = true;
            }
            position += n as u64;
        }
        if position < wanted.end {
            return Err(ReadError::decoding(format!(
                "{} inflates to {} bytes, {} expected",
                self.entry.path, position, self.entry.uncompressed_size
            )));
        }
        if !delivered {
            consume(&[]);
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for ZipEntryResource {
    async fn properties(&self) -> ReadResult<ResourceProperties> {
        let mut properties = ResourceProperties::new();
        properties.set_filename(self.entry.file_name());
        if let Some(media_type) = media_type_for_path(&self.entry.path) {
            properties.set_media_type(media_type);
        }
        properties.insert(
            ARCHIVE_KEY,
            json!({
                "entryLength": self.entry.compressed_size,
                "isEntryCompressed": self.entry.is_compressed(),
            }),
        );
        Ok(properties)
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        Ok(Some(self.entry.uncompressed_size))
    }

    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()> {
        let length = self.entry.uncompressed_size;
        let wanted = range::clamp(range.unwrap_or(0..length), length);
        if wanted.is_empty() {
            consume(&[]);
            return Ok(());
        }

        match self.entry.compression_method {
            CompressionMethod::Stored => {
                // `wanted` lies within the entry, so this cannot overflow.
                let data = self.data_range().await?;
                let absolute = data.start + wanted.start..data.start + wanted.end;
                self.archive.stream(Some(absolute), consume).await
            }
            CompressionMethod::Deflate => {
                let data = self.data_range().await?;
                trace!("inflating {} for {}..{}", self.entry.path, wanted.start, wanted.end);
                let compressed = self.archive.read(Some(data)).await?;
                self.inflate(&compressed, wanted, consume)
            }
            CompressionMethod::Unknown(method) => Err(ReadError::decoding(format!(
                "unsupported compression method {} for {}",
                method, self.entry.path
            ))),
        }
    }
}
