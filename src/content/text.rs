use std::sync::Arc;

use async_trait::async_trait;

use super::{
    ContentElement, ContentIterator, ContentKind, Link, Locator, Publication,
    ResourceContentIteratorFactory,
};
use crate::error::ReadResult;
use crate::resource::Resource;

/// Iterates over the paragraphs of a plain text resource.
///
/// Paragraphs are separated by blank lines. The resource is read on the
/// first move, and the cursor starts at the paragraph matching the
/// progression of the starting locator.
pub struct TextContentIterator {
    resource: Arc<dyn Resource>,
    link: Link,
    progression: f64,
    elements: Option<Vec<ContentElement>>,
    cursor: usize,
}

impl TextContentIterator {
    pub fn new(resource: Arc<dyn Resource>, link: Link, locator: &Locator) -> Self {
        Self {
            resource,
            link,
            progression: locator.progression.unwrap_or(0.0).clamp(0.0, 1.0),
            elements: None,
            cursor: 0,
        }
    }

    async fn load(&mut self) -> ReadResult<()> {
        if self.elements.is_none() {
            let text = self.resource.read_as_string(None).await?;
            let elements = paragraphs(&text, &self.link);
            self.cursor = (self.progression * elements.len() as f64).floor() as usize;
            self.elements = Some(elements);
        }
        Ok(())
    }
}

#[async_trait]
impl ContentIterator for TextContentIterator {
    async fn previous(&mut self) -> ReadResult<Option<ContentElement>> {
        self.load().await?;
        let Some(elements) = self.elements.as_ref() else {
            return Ok(None);
        };
        if self.cursor == 0 {
            return Ok(None);
        }
        self.cursor -= 1;
        Ok(elements.get(self.cursor).cloned())
    }

    async fn next(&mut self) -> ReadResult<Option<ContentElement>> {
        self.load().await?;
        let Some(elements) = self.elements.as_ref() else {
            return Ok(None);
        };
        let element = elements.get(self.cursor).cloned();
        if element.is_some() {
            self.cursor += 1;
        }
        Ok(element)
    }
}

fn paragraphs(text: &str, link: &Link) -> Vec<ContentElement> {
    let text = text.replace("\r\n", "\n");
    let paragraphs: Vec<String> = text
        .split("\n\n")
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect();

    let count = paragraphs.len();
    paragraphs
        .into_iter()
        .enumerate()
        .map(|(i, text)| ContentElement {
            locator: Locator::for_link(link, i as f64 / count as f64),
            kind: ContentKind::Text { text },
        })
        .collect()
}

/// Recognises `text/plain` resources.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextContentIteratorFactory;

impl ResourceContentIteratorFactory for TextContentIteratorFactory {
    fn make(
        &self,
        publication: &Publication,
        reading_order_index: usize,
        resource: Arc<dyn Resource>,
        locator: &Locator,
    ) -> Option<Box<dyn ContentIterator>> {
        let link = publication.reading_order().get(reading_order_index)?;
        if !link.media_type_starts_with("text/plain") {
            return None;
        }
        Some(Box::new(TextContentIterator::new(resource, link.clone(), locator)))
    }
}
