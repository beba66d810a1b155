use std::sync::Arc;

use log::{debug, trace};
use reqwest::Client;
use url::Url;

use super::{FileResource, HttpConfig, HttpResource};
use crate::error::{MakeError, ReadError, ReadResult};
use crate::resource::{FailureResource, Resource};

/// Turns an absolute URL into a terminal [`Resource`].
///
/// Construction performs no I/O: failures to reach the bytes surface on the
/// first read.
pub trait ResourceFactory: Send + Sync {
    fn make(&self, url: &Url) -> Result<Arc<dyn Resource>, MakeError>;
}

/// Tries a list of factories in order, the first success wins.
///
/// A factory failing with [`MakeError::SchemeNotSupported`] hands over to the
/// next one. Any other error is returned immediately.
#[derive(Default)]
pub struct CompositeResourceFactory {
    factories: Vec<Box<dyn ResourceFactory>>,
}

impl CompositeResourceFactory {
    pub fn new(factories: Vec<Box<dyn ResourceFactory>>) -> Self {
        Self { factories }
    }

    pub fn push(&mut self, factory: impl ResourceFactory + 'static) {
        self.factories.push(Box::new(factory));
    }
}

impl ResourceFactory for CompositeResourceFactory {
    fn make(&self, url: &Url) -> Result<Arc<dyn Resource>, MakeError> {
        for factory in &self.factories {
            match factory.make(url) {
                Ok(resource) => return Ok(resource),
                Err(err) if err.is_scheme_not_supported() => continue,
                Err(err) => return Err(err),
            }
        }
        debug!("no factory supports {}", url);
        Err(MakeError::SchemeNotSupported(url.scheme().to_string()))
    }
}

/// Factory for `file:` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResourceFactory;

impl ResourceFactory for FileResourceFactory {
    fn make(&self, url: &Url) -> Result<Arc<dyn Resource>, MakeError> {
        if url.scheme() != "file" {
            return Err(MakeError::SchemeNotSupported(url.scheme().to_string()));
        }
        match url.to_file_path() {
            Ok(path) => {
                trace!("file resource for {}", path.display());
                Ok(Arc::new(FileResource::new(path)))
            }
            // Hosts are not supported in file URLs.
            Err(()) => Ok(Arc::new(FailureResource::new(ReadError::not_found()))),
        }
    }
}

/// Factory for `http:` and `https:` URLs sharing one client.
#[derive(Clone)]
pub struct HttpResourceFactory {
    client: Client,
}

impl HttpResourceFactory {
    pub fn new(config: &HttpConfig) -> ReadResult<Self> {
        Ok(Self::with_client(config.build_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl ResourceFactory for HttpResourceFactory {
    fn make(&self, url: &Url) -> Result<Arc<dyn Resource>, MakeError> {
        match url.scheme() {
            "http" | "https" => Ok(Arc::new(HttpResource::new(self.client.clone(), url.clone()))),
            scheme => Err(MakeError::SchemeNotSupported(scheme.to_string())),
        }
    }
}
