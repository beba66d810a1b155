//! Lazy iteration over the content of a publication.
//!
//! [`PublicationContentIterator`] walks the reading order of a
//! [`Publication`] and delegates each resource to the first
//! [`ResourceContentIteratorFactory`] recognising it. Resources nobody
//! recognises, or that are missing from the container, are skipped.

mod audio;
mod iterator;
mod publication;
mod text;

pub use audio::{AudioContentIterator, AudioContentIteratorFactory};
pub use iterator::PublicationContentIterator;
pub use publication::{Link, Locator, Publication};
pub use text::{TextContentIterator, TextContentIteratorFactory};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ReadResult;
use crate::resource::Resource;

/// Element of content found in a publication.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentElement {
    /// Where the element is located in the publication.
    pub locator: Locator,
    pub kind: ContentKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentKind {
    /// A paragraph of text.
    Text { text: String },
    /// A whole audio clip.
    Audio { link: Link },
}

impl ContentElement {
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ContentKind::Text { text } => Some(text),
            ContentKind::Audio { .. } => None,
        }
    }
}

/// Bidirectional cursor over content elements.
///
/// The cursor sits between two elements: `next` returns the element after
/// it and moves forward, `previous` the one before it and moves backward.
/// `Ok(None)` means there is nothing left in that direction.
#[async_trait]
pub trait ContentIterator: Send {
    async fn previous(&mut self) -> ReadResult<Option<ContentElement>>;

    async fn next(&mut self) -> ReadResult<Option<ContentElement>>;
}

/// Creates the content iterator of a single reading order resource.
pub trait ResourceContentIteratorFactory: Send + Sync {
    /// Returns `None` when the resource's format is not supported.
    ///
    /// `locator` gives the starting position inside the resource.
    fn make(
        &self,
        publication: &Publication,
        reading_order_index: usize,
        resource: Arc<dyn Resource>,
        locator: &Locator,
    ) -> Option<Box<dyn ContentIterator>>;
}

/// Factories for every format supported out of the box.
pub fn default_factories() -> Vec<Box<dyn ResourceContentIteratorFactory>> {
    vec![
        Box::new(TextContentIteratorFactory),
        Box::new(AudioContentIteratorFactory),
    ]
}
