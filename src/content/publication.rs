use std::sync::Arc;

use crate::resource::{Container, Resource, media_type_for_path};

/// Reference to a resource of a publication.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Path of the resource in the publication container.
    pub href: String,
    pub media_type: Option<String>,
    pub title: Option<String>,
}

impl Link {
    /// A link whose media type is guessed from the extension of `href`.
    pub fn new(href: impl Into<String>) -> Self {
        let href = href.into();
        let media_type = media_type_for_path(&href).map(str::to_string);
        Self {
            href,
            media_type,
            title: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Whether the declared media type matches `prefix`, such as `"audio/"`.
    pub fn media_type_starts_with(&self, prefix: &str) -> bool {
        self.media_type.as_deref().is_some_and(|m| m.starts_with(prefix))
    }
}

/// Location in a publication.
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    pub href: String,
    pub media_type: Option<String>,
    /// Position in the resource, between 0.0 and 1.0.
    pub progression: Option<f64>,
}

impl Locator {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            media_type: None,
            progression: None,
        }
    }

    pub fn with_progression(mut self, progression: f64) -> Self {
        self.progression = Some(progression);
        self
    }

    /// Locator at `progression` in the resource of `link`.
    pub fn for_link(link: &Link, progression: f64) -> Self {
        Self {
            href: link.href.clone(),
            media_type: link.media_type.clone(),
            progression: Some(progression),
        }
    }
}

/// The parts of a publication needed to iterate over its content.
pub struct Publication {
    reading_order: Vec<Link>,
    container: Arc<dyn Container>,
}

impl Publication {
    pub fn new(reading_order: Vec<Link>, container: Arc<dyn Container>) -> Self {
        Self {
            reading_order,
            container,
        }
    }

    pub fn reading_order(&self) -> &[Link] {
        &self.reading_order
    }

    /// Index of the reading order resource at `href`.
    pub fn index_of(&self, href: &str) -> Option<usize> {
        let href = href.strip_prefix('/').unwrap_or(href);
        self.reading_order
            .iter()
            .position(|link| link.href.strip_prefix('/').unwrap_or(&link.href) == href)
    }

    /// Resource of `link`, if the container has it.
    pub fn get(&self, link: &Link) -> Option<Arc<dyn Resource>> {
        self.container.get(&link.href)
    }
}
