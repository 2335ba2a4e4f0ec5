//! Object-store backends the transfer pipeline reads from and copies into.

mod local;
mod memory;
#[cfg(feature = "s3")]
mod s3;

pub use local::LocalStore;
pub use memory::MemoryStore;
#[cfg(feature = "s3")]
pub use s3::{S3Credentials, S3Store};

use crate::error::Result;

/// Minimal bucket/key object store.
///
/// Implementations must be `Sync` so a store can be shared with worker threads.
pub trait ObjectStore: Sync {
    /// List every key in `bucket`, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if the bucket cannot be listed.
    fn list_objects(&self, bucket: &str) -> Result<Vec<String>>;

    /// Read the full body of `bucket/key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if the object is missing or unreadable.
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Server-side copy of `src_bucket/src_key` to `dst_bucket/dst_key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if the source is missing or the write fails.
    fn copy_object(&self, src_bucket: &str, src_key: &str, dst_bucket: &str, dst_key: &str)
        -> Result<()>;
}
