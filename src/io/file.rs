use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::trace;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use url::Url;

use crate::error::ReadResult;
use crate::range;
use crate::resource::{Consume, Resource, ResourceProperties, media_type_for_path};

/// Size of the chunks handed to `consume` while streaming a file.
const CHUNK_SIZE: u64 = 32 * 1024;

/// Local file with random access support.
///
/// The file is opened on every read, so a resource can be shared between
/// concurrent readers without a shared seek position.
pub struct FileResource {
    path: PathBuf,
    url: Option<Url>,
}

impl FileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let url = Url::from_file_path(&path).ok();
        Self { path, url }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Resource for FileResource {
    fn source_url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    async fn properties(&self) -> ReadResult<ResourceProperties> {
        let mut properties = ResourceProperties::new();
        if let Some(name) = self.path.file_name().map(|n| n.to_string_lossy()) {
            if let Some(media_type) = media_type_for_path(&name) {
                properties.set_media_type(media_type);
            }
            properties.set_filename(name);
        }
        Ok(properties)
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        Ok(Some(tokio::fs::metadata(&self.path).await?.len()))
    }

    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()> {
        let mut file = File::open(&self.path).await?;
        let length = file.metadata().await?.len();
        let range = range::clamp(range.unwrap_or(0..length), length);
        if range.is_empty() {
            consume(&[]);
            return Ok(());
        }

        trace!("reading {}..{} of {}", range.start, range.end, self.path.display());
        file.seek(SeekFrom::Start(range.start)).await?;

        let mut remaining = range::count(&range);
        let mut buf = vec![0u8; remaining.min(CHUNK_SIZE) as usize];
        while remaining > 0 {
            let wanted = remaining.min(buf.len() as u64) as usize;
            let n = file.read(&mut buf[..wanted]).await?;
            if n == 0 {
                // Truncated while reading.
                break;
            }
            consume(&buf[..n]);
            remaining -= n as u64;
        }

        Ok(())
    }
}
