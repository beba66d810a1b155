//! Terminal resources backed by physical sources, and the factories turning
//! URLs into them.

mod factory;
mod file;
mod http;

pub use factory::{
    CompositeResourceFactory, FileResourceFactory, HttpResourceFactory, ResourceFactory,
};
pub use file::FileResource;
pub use http::{HttpConfig, HttpResource, HttpStatusError, status_error};

/// Factory handling `file:`, `http:` and `https:` URLs.
pub fn default_factory(config: &HttpConfig) -> crate::ReadResult<CompositeResourceFactory> {
    let mut factory = CompositeResourceFactory::default();
    factory.push(FileResourceFactory);
    factory.push(HttpResourceFactory::new(config)?);
    Ok(factory)
}
