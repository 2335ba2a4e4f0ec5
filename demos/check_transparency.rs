//! Report whether each given image has transparent pixels.
//!
//! Usage:
//! ```sh
//! cargo run --example check_transparency -- logo.png photo.jpg
//! ```

use std::env;
use std::process;

use transparency_sieve::{has_transparency, DecodedImage};

fn main() {
    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: check_transparency <image>...");
        process::exit(1);
    }

    let mut failed = false;
    for path in &paths {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("{path}: {e}");
                failed = true;
                continue;
            }
        };

        match DecodedImage::decode(&bytes) {
            Ok(image) => println!(
                "{path}: {:?} {:?} {}x{} transparent={}",
                image.format(),
                image.mode(),
                image.width(),
                image.height(),
                has_transparency(&image),
            ),
            Err(e) => {
                eprintln!("{path}: {e}");
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}
