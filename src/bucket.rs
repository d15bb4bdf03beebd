// ABOUTME: Bucket emptier seam used during application teardown.
// ABOUTME: Regional buckets must be emptied before their stacks can be deleted.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BucketError {
    #[error("bucket {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

/// Removes every object from a bucket. Implementations are constructed per
/// region via [`BucketEmptierProvider`].
#[async_trait]
pub trait BucketEmptier: Send + Sync {
    async fn empty_bucket(&self, bucket: &str) -> Result<(), BucketError>;
}

/// Builds an emptier for the given region.
pub type BucketEmptierProvider =
    Box<dyn Fn(&str) -> Result<Box<dyn BucketEmptier>, BucketError> + Send + Sync>;
