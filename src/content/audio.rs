use std::sync::Arc;

use async_trait::async_trait;

use super::{
    ContentElement, ContentIterator, ContentKind, Link, Locator, Publication,
    ResourceContentIteratorFactory,
};
use crate::error::ReadResult;
use crate::resource::Resource;

/// Yields a single element standing for a whole audio resource.
///
/// Nothing is read: the audio clip is referenced by its link.
pub struct AudioContentIterator {
    element: ContentElement,
    /// Whether the cursor is after the element.
    passed: bool,
}

impl AudioContentIterator {
    pub fn new(link: Link, locator: &Locator) -> Self {
        Self {
            passed: locator.progression.is_some_and(|p| p >= 1.0),
            element: ContentElement {
                locator: Locator::for_link(&link, 0.0),
                kind: ContentKind::Audio { link },
            },
        }
    }
}

#[async_trait]
impl ContentIterator for AudioContentIterator {
    async fn previous(&mut self) -> ReadResult<Option<ContentElement>> {
        if !self.passed {
            return Ok(None);
        }
        self.passed = false;
        Ok(Some(self.element.clone()))
    }

    async fn next(&mut self) -> ReadResult<Option<ContentElement>> {
        if self.passed {
            return Ok(None);
        }
        self.passed = true;
        Ok(Some(self.element.clone()))
    }
}

/// Recognises `audio/*` resources.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioContentIteratorFactory;

impl ResourceContentIteratorFactory for AudioContentIteratorFactory {
    fn make(
        &self,
        publication: &Publication,
        reading_order_index: usize,
        _resource: Arc<dyn Resource>,
        locator: &Locator,
    ) -> Option<Box<dyn ContentIterator>> {
        let link = publication.reading_order().get(reading_order_index)?;
        if !link.media_type_starts_with("audio/") {
            return None;
        }
        Some(Box::new(AudioContentIterator::new(link.clone(), locator)))
    }
}
