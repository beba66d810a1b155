use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_TYPE, HeaderName, RANGE};
use reqwest::{Client, Response, StatusCode};
use tokio::sync::OnceCell;
use url::Url;

use crate::error::{ReadError, ReadResult};
use crate::range;
use crate::resource::{Consume, Resource, ResourceProperties, media_type_for_path};

/// Settings of the HTTP client shared by [`HttpResource`]s.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Timeout applied to each request.
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn build_client(&self) -> ReadResult<Client> {
        let mut builder = Client::builder().timeout(self.timeout);
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        builder.build().map_err(ReadError::other)
    }
}

/// What a HEAD request told us about the remote resource.
#[derive(Debug, Clone)]
struct Head {
    length: Option<u64>,
    media_type: Option<String>,
    accepts_ranges: bool,
}

/// Remote resource read with HTTP Range requests.
///
/// Nothing is requested until the first read. The HEAD response is fetched
/// once and gives the length and media type. Servers ignoring `Range` are
/// tolerated by skipping the unwanted part of the body.
pub struct HttpResource {
    client: Client,
    url: Url,
    head: OnceCell<ReadResult<Head>>,
}

impl HttpResource {
    pub fn new(client: Client, url: Url) -> Self {
        Self {
            client,
            url,
            head: OnceCell::new(),
        }
    }

    async fn head(&self) -> ReadResult<Head> {
        self.head.get_or_init(|| self.fetch_head()).await.clone()
    }

    async fn fetch_head(&self) -> ReadResult<Head> {
        debug!("HEAD {}", self.url);
        let resp = self
            .client
            .head(self.url.clone())
            .send()
            .await
            .map_err(request_error)?;
        if !resp.status().is_success() {
            return Err(status_error(resp.status()));
        }

        let header = |name: HeaderName| resp.headers().get(name).and_then(|v| v.to_str().ok());
        Ok(Head {
            length: header(CONTENT_LENGTH).and_then(|s| s.parse().ok()),
            media_type: header(CONTENT_TYPE)
                .map(|s| s.split(';').next().unwrap_or(s).trim().to_string()),
            accepts_ranges: header(ACCEPT_RANGES).is_some_and(|s| s.contains("bytes")),
        })
    }

    async fn get(&self, range: Option<&Range<u64>>) -> ReadResult<Response> {
        let mut request = self.client.get(self.url.clone());
        match range {
            Some(range) if range.end == u64::MAX => {
                request = request.header(RANGE, format!("bytes={}-", range.start));
            }
            Some(range) => {
                let value = format!("bytes={}-{}", range.start, range.end - 1);
                request = request.header(RANGE, value);
            }
            None => {}
        }
        request.send().await.map_err(request_error)
    }
}

#[async_trait]
impl Resource for HttpResource {
    fn source_url(&self) -> Option<&Url> {
        Some(&self.url)
    }

    async fn properties(&self) -> ReadResult<ResourceProperties> {
        let head = self.head().await?;
        let mut properties = ResourceProperties::new();
        let filename = self
            .url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty());
        if let Some(filename) = filename {
            properties.set_filename(filename);
        }
        if let Some(media_type) = head
            .media_type
            .as_deref()
            .or_else(|| filename.and_then(media_type_for_path))
        {
            properties.set_media_type(media_type);
        }
        Ok(properties)
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        Ok(self.head().await?.length)
    }

    async fn stream(
        &self,
        range: Option<Range<u64>>,
        consume: &mut Consume<'_>,
    ) -> ReadResult<()> {
        let Some(range) = range else {
            let resp = self.get(None).await?;
            if !resp.status().is_success() {
                return Err(status_error(resp.status()));
            }
            return stream_body(resp, 0..u64::MAX, 0, consume).await;
        };

        let head = self.head().await?;
        let range = match head.length {
            Some(length) => range::clamp(range, length),
            None => range.start..range.end.max(range.start),
        };
        if range.is_empty() {
            consume(&[]);
            return Ok(());
        }
        if !head.accepts_ranges {
            trace!("{} does not advertise byte ranges", self.url);
        }

        let resp = self.get(Some(&range)).await?;
        match resp.status() {
            StatusCode::PARTIAL_CONTENT => {
                stream_body(resp, range.clone(), range.start, consume).await
            }
            // The server ignored the Range header and sent everything.
            StatusCode::OK => stream_body(resp, range, 0, consume).await,
            StatusCode::RANGE_NOT_SATISFIABLE => {
                consume(&[]);
                Ok(())
            }
            status => Err(status_error(status)),
        }
    }
}

/// Delivers the part of `resp` covering `wanted`, the body starting at
/// absolute offset `body_start`.
async fn stream_body(
    mut resp: Response,
    wanted: Range<u64>,
    body_start: u64,
    consume: &mut Consume<'_>,
) -> ReadResult<()> {
    let mut position = body_start;
    let mut delivered = false;
    while position < wanted.end {
        let Some(chunk) = resp.chunk().await.map_err(request_error)? else {
            break;
        };
        let chunk_range = position..position + chunk.len() as u64;
        let part = range::intersect(chunk_range, wanted.clone());
        if !part.is_empty() {
            let from = (part.start - position) as usize;
            let to = (part.end - position) as usize;
            consume(&chunk[from..to]);
            delivered = true;
        }
        position += chunk.len() as u64;
    }
    if !delivered {
        consume(&[]);
    }
    Ok(())
}

/// Maps an HTTP status code to a [`ReadError`].
pub fn status_error(status: StatusCode) -> ReadError {
    let cause = Some(Arc::new(HttpStatusError(status)) as crate::error::Cause);
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => ReadError::NotFound(cause),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReadError::Forbidden(cause),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            ReadError::Unavailable(cause)
        }
        status if status.is_server_error() => ReadError::Unavailable(cause),
        status => ReadError::other(HttpStatusError(status)),
    }
}

fn request_error(err: reqwest::Error) -> ReadError {
    if let Some(status) = err.status() {
        return status_error(status);
    }
    if err.is_timeout() || err.is_connect() {
        return ReadError::Unavailable(Some(Arc::new(err)));
    }
    if err.is_decode() || err.is_body() {
        return ReadError::Decoding {
            message: Some("invalid HTTP response body".to_string()),
            cause: Some(Arc::new(err)),
        };
    }
    ReadError::other(err)
}

/// Unexpected HTTP status returned by a server.
#[derive(Debug, thiserror::Error)]
#[error("HTTP request failed with status: {0}")]
pub struct HttpStatusError(pub StatusCode);
