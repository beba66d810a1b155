use std::ops::Range;

use async_trait::async_trait;

use super::{Consume, Resource, ResourceProperties};
use crate::error::{ReadError, ReadResult};

/// Resource standing for a location that could not be resolved.
///
/// Every operation fails with the same error and nothing is ever consumed.
#[derive(Debug, Clone)]
pub struct FailureResource {
    error: ReadError,
}

impl FailureResource {
    pub fn new(error: ReadError) -> Self {
        Self { error }
    }

    pub fn error(&self) -> &ReadError {
        &self.error
    }
}

#[async_trait]
impl Resource for FailureResource {
    async fn properties(&self) -> ReadResult<ResourceProperties> {
        Err(self.error.clone())
    }

    async fn estimated_length(&self) -> ReadResult<Option<u64>> {
        Err(self.error.clone())
    }

    async fn stream(
        &self,
        _range: Option<Range<u64>>,
        _consume: &mut Consume<'_>,
    ) -> ReadResult<()> {
        Err(self.error.clone())
    }
}
