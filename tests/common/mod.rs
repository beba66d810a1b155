#![allow(dead_code)]

use std::ops::Range;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use bookres::ReadResult;
use bookres::resource::{Consume, Resource};

/// In-memory upstream counting the reads it serves.
pub struct CountingResource {
    data: Vec<u8>,
    reads: AtomicUsize,
    ranges: Mutex<Vec<Option<Range<u64>>>>,
}

impl CountingResource {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            reads: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn ranges(&self) -> Vec<Option<Range<u64>>> {
        self.ranges.lock().unwrap().clone()
    }
}

#[async_trait]
impl Resource for CountingResource {
    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        Ok(Some(self.data.len() as u64))
    }

    async fn stream(&self, range: Option<Range<u64>>, consume: &mut Consume<'_>) -> ReadResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.ranges.lock().unwrap().push(range.clone());
        consume(bookres::range::slice(&self.data, range));
        Ok(())
    }
}

/// `0, 1, 2, ..., 255, 0, 1, ...` of the given length.
pub fn sample_bytes(length: usize) -> Vec<u8> {
    (0..length).map(|i| (i % 256) as u8).collect()
}
