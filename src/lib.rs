//! Detect image transparency and copy opaque images between buckets.
//!
//! The core is [`classify`]: decode an image buffer and report whether any
//! pixel is not fully opaque. Around it sit a bucket [`transfer`] pipeline
//! over pluggable [`store::ObjectStore`] backends, local file and directory
//! checks, and (with the `faces` feature) face annotation.
//!
//! # Quick Start
//!
//! ```no_run
//! let bytes = std::fs::read("logo.png").unwrap();
//! if transparency_sieve::classify(&bytes).unwrap() {
//!     println!("logo.png has transparent pixels");
//! }
//! ```
//!
//! # Transfer
//!
//! ```no_run
//! use transparency_sieve::store::LocalStore;
//! use transparency_sieve::{transfer, TransferOptions};
//!
//! let store = LocalStore::new("/srv/buckets");
//! let results = transfer(&store, "uploads", "opaque", &TransferOptions::default()).unwrap();
//! println!("{} objects processed", results.len());
//! ```

#![deny(missing_docs)]

pub mod classifier;
pub mod decode;
mod engine;
pub mod error;
#[cfg(feature = "faces")]
pub mod faces;
#[cfg(feature = "cli")]
pub mod logging;
pub mod store;
mod transfer;

pub use classifier::{classify, has_transparency};
pub use decode::{ColorCount, ColorMode, DecodedImage, TransparencyMarker};
pub use engine::{check_directory, check_file, is_supported_image, CheckResult};
pub use error::{DecodeError, Error, Result};
pub use transfer::{summarize, transfer, Outcome, TransferOptions, TransferResult};
