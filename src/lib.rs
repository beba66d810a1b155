//! # bookres
//!
//! Asynchronous, range-readable access to the resources of a publication.
//!
//! Everything revolves around the [`Resource`] trait: a byte source that can
//! report its properties and length, and stream any byte range. Resources
//! come from files, HTTP servers (using Range requests), memory, or entries
//! of a ZIP archive, and can be wrapped in decorators that buffer, cache or
//! transform the bytes without changing the contract.
//!
//! ## Features
//!
//! - File and HTTP/HTTPS resources, created from URLs by composable factories
//! - Buffering, whole-content caching, tail caching and transforming decorators
//! - ZIP archives (including ZIP64) as containers of lazily read entries
//! - Bidirectional iteration over the text and audio content of a publication
//!
//! ## Example
//!
//! ```no_run
//! use bookres::io::{HttpConfig, ResourceFactory, default_factory};
//! use bookres::{ResourceExt, ZipArchive};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let factory = default_factory(&HttpConfig::default())?;
//!     let url = Url::parse("https://example.com/book.epub")?;
//!     let resource = factory.make(&url)?.buffered(64 * 1024);
//!     let archive = ZipArchive::open(resource.into_shared()).await?;
//!
//!     for entry in archive.entries() {
//!         println!("{}", entry.path);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod content;
pub mod error;
pub mod io;
pub mod range;
pub mod resource;
pub mod zip;

pub use cli::Cli;
pub use content::{
    ContentElement, ContentIterator, Link, Locator, Publication, PublicationContentIterator,
};
pub use error::{MakeError, ReadError, ReadResult};
pub use io::{CompositeResourceFactory, FileResource, HttpResource, ResourceFactory};
pub use resource::{
    BufferingResource, CachingResource, Container, DataResource, FailureResource, Resource,
    ResourceExt, ResourceProperties, TailCachingResource, TransformingResource,
};
pub use zip::{ZipArchive, ZipEntryResource};
