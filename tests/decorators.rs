mod common;

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bookres::resource::Consume;
use bookres::{
    BufferingResource, CachingResource, DataResource, FailureResource, ReadError, ReadResult,
    Resource, ResourceExt, TailCachingResource,
};
use common::{CountingResource, sample_bytes};

/// Upstream whose content is the number of reads it served so far.
#[derive(Default)]
struct StampingResource {
    reads: AtomicUsize,
}

#[async_trait]
impl Resource for StampingResource {
    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        Ok(None)
    }

    async fn stream(
        &self,
        _range: Option<Range<u64>>,
        consume: &mut Consume<'_>,
    ) -> ReadResult<()> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        consume(format!("read #{n}").as_bytes());
        Ok(())
    }
}

#[tokio::test]
async fn buffered_then_cached_million_bytes() {
    let reference = sample_bytes(1_000_000);
    let upstream = Arc::new(CountingResource::new(reference.clone()));
    let resource = upstream.clone().buffered(4096).cached();

    let first = resource.read(Some(0..100)).await.unwrap();
    assert_eq!(first, &reference[0..100]);
    let reads_after_caching = upstream.reads();

    let second = resource.read(Some(50..150)).await.unwrap();
    assert_eq!(second, &reference[50..150]);

    let empty = resource.read(Some(1_000_000..1_000_000)).await.unwrap();
    assert!(empty.is_empty());

    assert!(reads_after_caching <= 1);
    assert_eq!(upstream.reads(), reads_after_caching);
}

#[tokio::test]
async fn failure_resource_never_consumes() {
    let resource = FailureResource::new(ReadError::forbidden());

    assert!(matches!(resource.estimated_length().await, Err(ReadError::Forbidden(_))));
    assert!(matches!(resource.properties().await, Err(ReadError::Forbidden(_))));

    let mut consumed = 0usize;
    let result = resource
        .stream(Some(0..10), &mut |chunk: &[u8]| consumed += chunk.len() + 1)
        .await;
    assert!(matches!(result, Err(ReadError::Forbidden(_))));
    assert_eq!(consumed, 0);
}

#[tokio::test]
async fn random_reads_match_reference() {
    let reference = sample_bytes(50_000);
    let length = reference.len() as u64;
    let buffered = BufferingResource::new(CountingResource::new(reference.clone()), 1024);
    let tail = TailCachingResource::new(CountingResource::new(reference.clone()), 40_000);
    let cached = CachingResource::new(CountingResource::new(reference.clone()));

    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..1000 {
        let start = rng.gen_range(0..=length + 10);
        let end = start + rng.gen_range(0..4096);
        let expected = bookres::range::slice(&reference, Some(start..end));

        let buffered_bytes = buffered.read(Some(start..end)).await.unwrap();
        assert_eq!(buffered_bytes, expected, "buffered {start}..{end}");
        assert_eq!(tail.read(Some(start..end)).await.unwrap(), expected, "tail {start}..{end}");
        assert_eq!(cached.read(Some(start..end)).await.unwrap(), expected, "cached {start}..{end}");
    }
    assert_eq!(cached.upstream().reads(), 1);
}

#[tokio::test]
async fn sequential_buffered_reads_reuse_the_window() {
    let reference = sample_bytes(100_000);
    let upstream = Arc::new(CountingResource::new(reference.clone()));
    let resource = upstream.clone().buffered(8192);

    let mut data = Vec::new();
    for start in (0..16_384u64).step_by(64) {
        data.extend(resource.read(Some(start..start + 64)).await.unwrap());
    }
    assert_eq!(data, &reference[..16_384]);
    assert_eq!(upstream.reads(), 2);
}

#[tokio::test]
async fn caching_is_idempotent() {
    let resource = StampingResource::default().cached();
    let first = resource.read_as_string(None).await.unwrap();
    let second = resource.read_as_string(None).await.unwrap();
    assert_eq!(first, "read #0");
    assert_eq!(first, second);
    assert_eq!(resource.read_as_string(Some(5..7)).await.unwrap(), "#0");
}

#[tokio::test]
async fn concurrent_cached_reads_share_one_fetch() {
    let upstream = Arc::new(CountingResource::new(sample_bytes(10_000)));
    let resource = Arc::new(upstream.clone().cached());

    let (a, b, c) = tokio::join!(
        resource.read(Some(0..10)),
        resource.read(Some(5_000..5_010)),
        resource.read(None),
    );
    assert_eq!(a.unwrap().len(), 10);
    assert_eq!(b.unwrap().len(), 10);
    assert_eq!(c.unwrap().len(), 10_000);
    assert_eq!(upstream.reads(), 1);
}

#[tokio::test]
async fn tail_cache_boundary() {
    let reference = sample_bytes(1000);
    let upstream = Arc::new(CountingResource::new(reference.clone()));
    let resource = upstream.clone().tail_cached(900);

    assert_eq!(resource.read(Some(850..950)).await.unwrap(), &reference[850..950]);
    assert_eq!(resource.read(Some(900..1000)).await.unwrap(), &reference[900..1000]);
    assert_eq!(resource.read(Some(950..960)).await.unwrap(), &reference[950..960]);
    assert_eq!(upstream.reads(), 2);

    assert_eq!(resource.read(Some(100..900)).await.unwrap(), &reference[100..900]);
    assert_eq!(upstream.reads(), 3);
}

#[tokio::test]
async fn transforms_are_deterministic() {
    let transforms = Arc::new(AtomicUsize::new(0));
    let counter = transforms.clone();
    let resource = DataResource::from("The quick brown fox").map_as_string(move |text| {
        counter.fetch_add(1, Ordering::SeqCst);
        text.to_uppercase()
    });

    assert_eq!(resource.estimated_length().await.unwrap(), None);
    assert_eq!(resource.read_as_string(None).await.unwrap(), "THE QUICK BROWN FOX");
    assert_eq!(resource.read_as_string(Some(4..9)).await.unwrap(), "QUICK");
    assert_eq!(resource.read_as_string(Some(16..100)).await.unwrap(), "FOX");
    assert_eq!(transforms.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_utf8_fails_string_transforms() {
    let resource = DataResource::new(vec![0xff, 0xfe]).map_as_string(|text| text);
    assert!(matches!(resource.read(None).await, Err(ReadError::Decoding { .. })));
}

#[tokio::test]
async fn empty_ranges_on_every_decorator() {
    let data = sample_bytes(100);
    let resources: Vec<Arc<dyn Resource>> = vec![
        DataResource::new(data.clone()).into_shared(),
        DataResource::new(data.clone()).buffered(16).into_shared(),
        DataResource::new(data.clone()).cached().into_shared(),
        DataResource::new(data.clone()).tail_cached(50).into_shared(),
        DataResource::new(data.clone()).map(Ok).into_shared(),
    ];

    for resource in resources {
        for range in [10..10, 100..100, 500..600, 30..20] {
            let mut calls = 0;
            let mut bytes = 0;
            resource
                .stream(Some(range.clone()), &mut |chunk: &[u8]| {
                    calls += 1;
                    bytes += chunk.len();
                })
                .await
                .unwrap();
            assert_eq!(bytes, 0, "{range:?}");
            assert!(calls >= 1, "{range:?}");
        }
    }
}
