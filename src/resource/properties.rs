use std::collections::BTreeMap;

use serde_json::Value;

/// Key of the file name property.
pub const FILENAME_KEY: &str = "filename";
/// Key of the declared media type property.
pub const MEDIA_TYPE_KEY: &str = "mediaType";

/// Open, string-keyed bag of metadata attached to a resource.
///
/// Only [`FILENAME_KEY`] and [`MEDIA_TYPE_KEY`] have typed accessors; other
/// keys are left to format-specific code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceProperties(BTreeMap<String, Value>);

impl ResourceProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn filename(&self) -> Option<&str> {
        self.get(FILENAME_KEY).and_then(Value::as_str)
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.insert(FILENAME_KEY, filename.into());
    }

    pub fn media_type(&self) -> Option<&str> {
        self.get(MEDIA_TYPE_KEY).and_then(Value::as_str)
    }

    pub fn set_media_type(&mut self, media_type: impl Into<String>) {
        self.insert(MEDIA_TYPE_KEY, media_type.into());
    }

    /// Copies every entry of `other` into `self`, overwriting existing keys.
    pub fn merge(&mut self, other: ResourceProperties) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for ResourceProperties {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Guesses a media type from the extension of a path or file name.
pub fn media_type_for_path(path: &str) -> Option<&'static str> {
    let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
    let media_type = match extension.as_str() {
        "epub" => "application/epub+zip",
        "zip" => "application/zip",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "xml" | "opf" => "application/xml",
        "ncx" => "application/x-dtbncx+xml",
        "xhtml" => "application/xhtml+xml",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",
        "mp3" => "audio/mpeg",
        "m4a" | "aac" => "audio/mp4",
        "ogg" => "audio/ogg",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(media_type)
}
