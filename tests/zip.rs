mod common;

use std::io::Write;
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;

use bookres::resource::Container;
use bookres::zip::ARCHIVE_KEY;
use bookres::{DataResource, ReadError, Resource, ResourceExt, ZipArchive};
use common::{CountingResource, sample_bytes};

struct Entry<'a> {
    path: &'a str,
    data: &'a [u8],
    deflate: bool,
    /// Uncompressed size written to the headers instead of the real one.
    declared_length: Option<u32>,
    /// Compressed size written to a ZIP64 extra field of the central
    /// directory.
    zip64_compressed_size: Option<u64>,
}

impl<'a> Entry<'a> {
    fn stored(path: &'a str, data: &'a [u8]) -> Self {
        Self {
            path,
            data,
            deflate: false,
            declared_length: None,
            zip64_compressed_size: None,
        }
    }

    fn deflated(path: &'a str, data: &'a [u8]) -> Self {
        Self {
            deflate: true,
            ..Self::stored(path, data)
        }
    }
}

/// Builds a ZIP archive with the given entries and archive comment.
fn build_zip(entries: &[Entry<'_>], comment: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for entry in entries {
        let payload = if entry.deflate {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(entry.data).unwrap();
            encoder.finish().unwrap()
        } else {
            entry.data.to_vec()
        };
        let method: u16 = if entry.deflate { 8 } else { 0 };
        let offset = out.len() as u32;
        let length = entry.declared_length.unwrap_or(entry.data.len() as u32);

        out.extend_from_slice(b"PK\x03\x04");
        out.write_u16::<LittleEndian>(20).unwrap(); // version needed
        out.write_u16::<LittleEndian>(0).unwrap(); // flags
        out.write_u16::<LittleEndian>(method).unwrap();
        out.write_u16::<LittleEndian>(0x6000).unwrap(); // 12:00
        out.write_u16::<LittleEndian>(0x5a21).unwrap(); // 2025-01-01
        out.write_u32::<LittleEndian>(0).unwrap(); // crc32
        out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(length).unwrap();
        out.write_u16::<LittleEndian>(entry.path.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(4).unwrap(); // extra field length
        out.extend_from_slice(entry.path.as_bytes());
        out.extend_from_slice(&[0xca, 0xfe, 0, 0]);
        out.extend_from_slice(&payload);

        central.extend_from_slice(b"PK\x01\x02");
        central.write_u16::<LittleEndian>(20).unwrap(); // version made by
        central.write_u16::<LittleEndian>(20).unwrap(); // version needed
        central.write_u16::<LittleEndian>(0).unwrap(); // flags
        central.write_u16::<LittleEndian>(method).unwrap();
        central.write_u16::<LittleEndian>(0x6000).unwrap();
        central.write_u16::<LittleEndian>(0x5a21).unwrap();
        central.write_u32::<LittleEndian>(0).unwrap();
        let compressed_size = match entry.zip64_compressed_size {
            Some(_) => 0xFFFF_FFFF,
            None => payload.len() as u32,
        };
        let extra_len: u16 = if entry.zip64_compressed_size.is_some() { 12 } else { 0 };
        central.write_u32::<LittleEndian>(compressed_size).unwrap();
        central.write_u32::<LittleEndian>(length).unwrap();
        central.write_u16::<LittleEndian>(entry.path.len() as u16).unwrap();
        central.write_u16::<LittleEndian>(extra_len).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap(); // comment length
        central.write_u16::<LittleEndian>(0).unwrap(); // disk number
        central.write_u16::<LittleEndian>(0).unwrap(); // internal attributes
        central.write_u32::<LittleEndian>(0).unwrap(); // external attributes
        central.write_u32::<LittleEndian>(offset).unwrap();
        central.extend_from_slice(entry.path.as_bytes());
        if let Some(size) = entry.zip64_compressed_size {
            central.write_u16::<LittleEndian>(0x0001).unwrap();
            central.write_u16::<LittleEndian>(8).unwrap();
            central.write_u64::<LittleEndian>(size).unwrap();
        }
    }

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&central);

    out.extend_from_slice(b"PK\x05\x06");
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(cd_offset).unwrap();
    out.write_u16::<LittleEndian>(comment.len() as u16).unwrap();
    out.extend_from_slice(comment);
    out
}

const CHAPTER: &[u8] = b"It was the best of times, it was the worst of times.";

fn sample_zip(comment: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let large = sample_bytes(200_000);
    let zip = build_zip(
        &[
            Entry::stored("mimetype", b"application/epub+zip"),
            Entry::stored("OEBPS/", b""),
            Entry::deflated("OEBPS/chapter1.txt", CHAPTER),
            Entry::deflated("OEBPS/large.bin", &large),
        ],
        comment,
    );
    (zip, large)
}

#[tokio::test]
async fn lists_file_entries() {
    let (zip, _) = sample_zip(b"");
    let archive = ZipArchive::open(DataResource::new(zip).into_shared()).await.unwrap();

    let paths: Vec<_> = archive.entries().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["OEBPS/chapter1.txt", "OEBPS/large.bin", "mimetype"]);
    assert_eq!(
        Container::entries(&archive),
        vec!["OEBPS/chapter1.txt", "OEBPS/large.bin", "mimetype"]
    );

    let entry = archive.entries().next().unwrap();
    assert_eq!(entry.mod_date(), (2025, 1, 1));
    assert_eq!(entry.mod_time(), (12, 0, 0));
}

#[tokio::test]
async fn archive_comments_are_skipped() {
    let (zip, _) = sample_zip(b"generated for a test");
    let archive = ZipArchive::open(DataResource::new(zip).into_shared()).await.unwrap();
    let mimetype = archive.entry("mimetype").unwrap();
    assert_eq!(mimetype.read_as_string(None).await.unwrap(), "application/epub+zip");
}

#[tokio::test]
async fn reads_stored_and_deflated_entries() {
    let (zip, large) = sample_zip(b"");
    let archive = ZipArchive::open(DataResource::new(zip).into_shared()).await.unwrap();

    let mimetype = archive.entry("mimetype").unwrap();
    assert_eq!(mimetype.estimated_length().await.unwrap(), Some(20));
    assert_eq!(mimetype.read_as_string(Some(12..16)).await.unwrap(), "epub");

    let chapter = archive.entry("/OEBPS/chapter1.txt").unwrap();
    assert_eq!(chapter.read(None).await.unwrap(), CHAPTER);
    assert_eq!(chapter.read_as_string(Some(7..20)).await.unwrap(), "the best of t");
    assert_eq!(chapter.read(Some(500..600)).await.unwrap(), b"");

    let entry = archive.entry("OEBPS/large.bin").unwrap();
    assert_eq!(entry.read(Some(150_000..150_100)).await.unwrap(), &large[150_000..150_100]);
    assert_eq!(entry.read(None).await.unwrap(), large);
}

#[tokio::test]
async fn entry_properties_describe_the_archive_entry() {
    let (zip, _) = sample_zip(b"");
    let archive = ZipArchive::open(DataResource::new(zip).into_shared()).await.unwrap();

    let properties = archive.entry("OEBPS/chapter1.txt").unwrap().properties().await.unwrap();
    assert_eq!(properties.filename(), Some("chapter1.txt"));
    assert_eq!(properties.media_type(), Some("text/plain"));
    let info = properties.get(ARCHIVE_KEY).unwrap();
    assert_eq!(info["isEntryCompressed"], true);

    let properties = archive.entry("mimetype").unwrap().properties().await.unwrap();
    let info = properties.get(ARCHIVE_KEY).unwrap();
    assert_eq!(info["isEntryCompressed"], false);
    assert_eq!(info["entryLength"], 20);
}

#[tokio::test]
async fn missing_entries_are_not_found() {
    let (zip, _) = sample_zip(b"");
    let archive = ZipArchive::open(DataResource::new(zip).into_shared()).await.unwrap();

    assert!(matches!(archive.entry("OEBPS/missing.txt"), Err(ReadError::NotFound(_))));
    assert!(archive.entry("OEBPS/").is_err());
    assert!(archive.get("OEBPS/missing.txt").is_none());
    assert!(archive.get("OEBPS/chapter1.txt").is_some());
}

#[tokio::test]
async fn opening_reads_the_trailer_once() {
    let (zip, _) = sample_zip(b"");
    let upstream = Arc::new(CountingResource::new(zip));
    let archive = ZipArchive::open(upstream.clone().into_shared()).await.unwrap();
    assert_eq!(upstream.reads(), 1);

    archive.entry("mimetype").unwrap().read(None).await.unwrap();
    assert!(upstream.reads() <= 3);
}

#[tokio::test]
async fn garbage_is_not_an_archive() {
    let result = ZipArchive::open(DataResource::new(sample_bytes(1000)).into_shared()).await;
    assert!(matches!(result, Err(ReadError::Decoding { .. })));

    let result = ZipArchive::open(DataResource::new(b"PK".to_vec()).into_shared()).await;
    assert!(matches!(result, Err(ReadError::Decoding { .. })));
}

#[tokio::test]
async fn oversized_zip64_sizes_are_rejected() {
    let zip = build_zip(
        &[Entry {
            zip64_compressed_size: Some(u64::MAX - 5),
            ..Entry::deflated("huge.txt", CHAPTER)
        }],
        b"",
    );
    let archive = ZipArchive::open(DataResource::new(zip).into_shared()).await.unwrap();
    let entry = archive.entry("huge.txt").unwrap();
    assert_eq!(entry.entry().compressed_size, u64::MAX - 5);
    assert!(matches!(entry.read(None).await, Err(ReadError::Decoding { .. })));
    assert!(matches!(entry.read(Some(0..4)).await, Err(ReadError::Decoding { .. })));
}

#[tokio::test]
async fn entry_data_past_the_archive_end_is_rejected() {
    let zip = build_zip(
        &[Entry {
            zip64_compressed_size: Some(1 << 20),
            ..Entry::deflated("long.txt", CHAPTER)
        }],
        b"",
    );
    let archive = ZipArchive::open(DataResource::new(zip).into_shared()).await.unwrap();
    let entry = archive.entry("long.txt").unwrap();
    assert!(matches!(entry.read(None).await, Err(ReadError::Decoding { .. })));
}

#[tokio::test]
async fn short_inflation_is_a_decoding_error() {
    let zip = build_zip(
        &[Entry {
            declared_length: Some(CHAPTER.len() as u32 + 10),
            ..Entry::deflated("short.txt", CHAPTER)
        }],
        b"",
    );
    let archive = ZipArchive::open(DataResource::new(zip).into_shared()).await.unwrap();
    let entry = archive.entry("short.txt").unwrap();

    assert!(matches!(entry.read(None).await, Err(ReadError::Decoding { .. })));
    // Ranges within the real content still inflate.
    assert_eq!(entry.read(Some(0..6)).await.unwrap(), b"It was");
}
