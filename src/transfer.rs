//! Copy opaque images from one bucket to another.
//!
//! Every object in the source bucket is fetched and classified. Opaque images
//! are copied to the destination bucket under the same key; transparent ones
//! are only logged. Objects that cannot be fetched, decoded, or copied are
//! reported as failures and never copied.

use crate::classifier;
use crate::error::Result;
use crate::store::ObjectStore;

/// Options controlling a bucket transfer.
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// Classify only, copy nothing.
    pub dry_run: bool,
    /// Only consider keys starting with this prefix.
    pub prefix: Option<String>,
}

/// What happened to one source object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Opaque image, copied (or would be, in a dry run).
    Copied,
    /// Image with transparent pixels, left in place.
    Skipped,
    /// Fetch, decode, or copy failed.
    Failed(String),
}

/// Result of transferring a single object.
#[derive(Debug, Clone)]
pub struct TransferResult {
    /// Object key in the source bucket.
    pub key: String,
    /// Transfer outcome.
    pub outcome: Outcome,
}

/// Classify every object in `src_bucket` and copy the opaque ones to `dst_bucket`.
///
/// Results are returned in key order. Classification runs in parallel when
/// the `cli` feature is enabled (via rayon); fetches and copies are sequential.
///
/// # Errors
///
/// Returns [`crate::Error::Store`] if the source bucket cannot be listed. Per-object
/// failures are reported through [`Outcome::Failed`].
pub fn transfer(
    store: &dyn ObjectStore,
    src_bucket: &str,
    dst_bucket: &str,
    opts: &TransferOptions,
) -> Result<Vec<TransferResult>> {
    log::info!("Transfer started: {src_bucket} -> {dst_bucket}");

    let keys: Vec<String> = store
        .list_objects(src_bucket)?
        .into_iter()
        .filter(|key| opts.prefix.as_deref().is_none_or(|p| key.starts_with(p)))
        .collect();
    log::debug!("{} objects listed in {src_bucket}", keys.len());

    let fetched: Vec<(String, Result<Vec<u8>>)> = keys
        .into_iter()
        .map(|key| {
            let body = store.get_object(src_bucket, &key);
            (key, body)
        })
        .collect();

    let classified = classify_all(fetched);

    let results = classified
        .into_iter()
        .map(|(key, verdict)| {
            let outcome = match verdict {
                Ok(true) => {
                    log::info!("{key} has transparent pixels");
                    Outcome::Skipped
                }
                Ok(false) if opts.dry_run => {
                    log::info!("{key} is opaque (dry run, not copied)");
                    Outcome::Copied
                }
                Ok(false) => match store.copy_object(src_bucket, &key, dst_bucket, &key) {
                    Ok(()) => {
                        log::info!("Object copied: {key}");
                        Outcome::Copied
                    }
                    Err(e) => {
                        log::error!("{e}");
                        Outcome::Failed(e.to_string())
                    }
                },
                Err(e) => {
                    log::error!("{key}: {e}");
                    Outcome::Failed(e.to_string())
                }
            };
            TransferResult { key, outcome }
        })
        .collect();

    log::info!("Transfer completed");
    Ok(results)
}

fn classify_one(body: Result<Vec<u8>>) -> Result<bool> {
    Ok(classifier::classify(&body?)?)
}

fn classify_all(fetched: Vec<(String, Result<Vec<u8>>)>) -> Vec<(String, Result<bool>)> {
    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;
        fetched
            .into_par_iter()
            .map(|(key, body)| (key, classify_one(body)))
            .collect()
    }

    #[cfg(not(feature = "cli"))]
    {
        fetched
            .into_iter()
            .map(|(key, body)| (key, classify_one(body)))
            .collect()
    }
}

/// Count `(copied, skipped, failed)` outcomes.
#[must_use]
pub fn summarize(results: &[TransferResult]) -> (usize, usize, usize) {
    results
        .iter()
        .fold((0, 0, 0), |(copied, skipped, failed), r| match r.outcome {
            Outcome::Copied => (copied + 1, skipped, failed),
            Outcome::Skipped => (copied, skipped + 1, failed),
            Outcome::Failed(_) => (copied, skipped, failed + 1),
        })
}
