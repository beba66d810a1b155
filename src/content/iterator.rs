use std::sync::Arc;

use log::{trace, warn};

use super::{
    ContentElement, ContentIterator, Locator, Publication, ResourceContentIteratorFactory,
    default_factories,
};
use crate::error::ReadResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Iterator of the reading order resource at `index`.
struct IndexedIterator {
    index: usize,
    iterator: Box<dyn ContentIterator>,
}

/// Iterates over the content of a whole publication, resource after
/// resource.
///
/// When the current resource is exhausted in one direction, the iterator
/// moves to the neighbouring reading order resource, skipping the ones no
/// factory supports or the container lacks. Running past either end of the
/// reading order yields `Ok(None)`, and the iterator stays on the last
/// resource so that moving back works.
pub struct PublicationContentIterator {
    publication: Arc<Publication>,
    start: Option<Locator>,
    factories: Vec<Box<dyn ResourceContentIteratorFactory>>,
    current: Option<IndexedIterator>,
    started: bool,
}

impl PublicationContentIterator {
    /// Iterator starting at `start`, or at the beginning of the publication.
    pub fn new(
        publication: Arc<Publication>,
        start: Option<Locator>,
        factories: Vec<Box<dyn ResourceContentIteratorFactory>>,
    ) -> Self {
        Self {
            publication,
            start,
            factories,
            current: None,
            started: false,
        }
    }

    /// Iterator using [`default_factories`].
    pub fn with_default_factories(publication: Arc<Publication>, start: Option<Locator>) -> Self {
        Self::new(publication, start, default_factories())
    }

    pub async fn previous(&mut self) -> ReadResult<Option<ContentElement>> {
        self.step(Direction::Backward).await
    }

    pub async fn next(&mut self) -> ReadResult<Option<ContentElement>> {
        self.step(Direction::Forward).await
    }

    async fn step(&mut self, direction: Direction) -> ReadResult<Option<ContentElement>> {
        if !self.started {
            self.started = true;
            self.current = self.initial_iterator(direction);
        }

        loop {
            let Some(current) = self.current.as_mut() else {
                return Ok(None);
            };
            let element = match direction {
                Direction::Forward => current.iterator.next().await?,
                Direction::Backward => current.iterator.previous().await?,
            };
            if element.is_some() {
                return Ok(element);
            }

            let index = current.index;
            match self.next_iterator(direction, index) {
                Some(next) => self.current = Some(next),
                None => return Ok(None),
            }
        }
    }

    /// Iterator of the starting resource. When it is not supported, the
    /// nearest supported resource in `direction` is used, then the nearest
    /// one in the other direction.
    fn initial_iterator(&self, direction: Direction) -> Option<IndexedIterator> {
        let reading_order = self.publication.reading_order();
        if reading_order.is_empty() {
            return None;
        }

        let (index, locator) = match &self.start {
            Some(locator) => match self.publication.index_of(&locator.href) {
                Some(index) => (index, locator.clone()),
                None => {
                    warn!(
                        "{} is not in the reading order, starting from the beginning",
                        locator.href
                    );
                    (0, Locator::for_link(&reading_order[0], 0.0))
                }
            },
            None => (0, Locator::for_link(&reading_order[0], 0.0)),
        };

        self.load_iterator(index, &locator)
            .or_else(|| self.next_iterator(direction, index))
            .or_else(|| self.next_iterator(direction.reversed(), index))
    }

    /// First supported resource after (or before) `index`.
    fn next_iterator(&self, direction: Direction, index: usize) -> Option<IndexedIterator> {
        let reading_order = self.publication.reading_order();
        let mut index = index;
        loop {
            index = match direction {
                Direction::Forward => index
                    .checked_add(1)
                    .filter(|i| *i < reading_order.len())?,
                Direction::Backward => index.checked_sub(1)?,
            };
            let progression = match direction {
                Direction::Forward => 0.0,
                Direction::Backward => 1.0,
            };
            let locator = Locator::for_link(&reading_order[index], progression);
            if let Some(iterator) = self.load_iterator(index, &locator) {
                return Some(iterator);
            }
        }
    }

    fn load_iterator(&self, index: usize, locator: &Locator) -> Option<IndexedIterator> {
        let link = self.publication.reading_order().get(index)?;
        let Some(resource) = self.publication.get(link) else {
            warn!("skipping {}, missing from the container", link.href);
            return None;
        };

        let iterator = self.factories.iter().find_map(|factory| {
            factory.make(&self.publication, index, resource.clone(), locator)
        });
        if iterator.is_none() {
            trace!(
                "skipping {}, no content iterator for {:?}",
                link.href, link.media_type
            );
        }
        iterator.map(|iterator| IndexedIterator { index, iterator })
    }
}
