// ABOUTME: Backend implementations of the store, deployer, secret, and bucket seams.
// ABOUTME: Currently a single JSON-file-backed driver for local use and testing.

mod local;

pub use local::{EnvDeleter, LocalBackend, LocalBucketEmptier, TaskDeleter, WorkloadDeleter};
