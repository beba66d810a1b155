use std::io::Write;

use url::Url;

use bookres::io::{HttpConfig, default_factory};
use bookres::{MakeError, ReadError, Resource, ResourceFactory};

#[test]
fn unsupported_scheme_tries_every_factory() {
    let factory = default_factory(&HttpConfig::default()).unwrap();
    let err = factory.make(&Url::parse("ftp://example.com/book.epub").unwrap()).err();
    assert_eq!(err, Some(MakeError::SchemeNotSupported("ftp".into())));
}

#[tokio::test]
async fn file_urls_read_local_files() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"Chapter one.\n\nChapter two.").unwrap();
    file.flush().unwrap();

    let factory = default_factory(&HttpConfig::default()).unwrap();
    let url = Url::from_file_path(file.path()).unwrap();
    let resource = factory.make(&url).unwrap();

    assert_eq!(resource.source_url(), Some(&url));
    assert_eq!(resource.estimated_length().await.unwrap(), Some(26));
    assert_eq!(resource.read_as_string(Some(14..26)).await.unwrap(), "Chapter two.");
    assert_eq!(resource.read(Some(26..40)).await.unwrap(), b"");

    let properties = resource.properties().await.unwrap();
    assert_eq!(properties.media_type(), Some("text/plain"));
}

#[tokio::test]
async fn missing_files_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::from_file_path(dir.path().join("missing.epub")).unwrap();

    let factory = default_factory(&HttpConfig::default()).unwrap();
    let resource = factory.make(&url).unwrap();
    assert!(matches!(resource.read(None).await, Err(ReadError::NotFound(_))));
    assert!(matches!(resource.estimated_length().await, Err(ReadError::NotFound(_))));
}
