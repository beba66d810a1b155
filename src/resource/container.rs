use std::collections::BTreeMap;
use std::sync::Arc;

use super::Resource;

/// Set of resources addressed by relative paths, such as the entries of a
/// publication package.
pub trait Container: Send + Sync {
    /// Paths of every resource in the container.
    fn entries(&self) -> Vec<String>;

    /// Looks up the resource at `href`. A leading `/` is ignored.
    fn get(&self, href: &str) -> Option<Arc<dyn Resource>>;
}

/// Container backed by a map of in-memory or otherwise prepared resources.
#[derive(Default)]
pub struct MemoryContainer {
    resources: BTreeMap<String, Arc<dyn Resource>>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, href: impl Into<String>, resource: Arc<dyn Resource>) {
        let href = href.into();
        let href = href.strip_prefix('/').map(str::to_owned).unwrap_or(href);
        self.resources.insert(href, resource);
    }

    pub fn with(mut self, href: impl Into<String>, resource: Arc<dyn Resource>) -> Self {
        self.insert(href, resource);
        self
    }
}

impl Container for MemoryContainer {
    fn entries(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    fn get(&self, href: &str) -> Option<Arc<dyn Resource>> {
        self.resources
            .get(href.strip_prefix('/').unwrap_or(href))
            .cloned()
    }
}
