//! Logger setup for the command-line tool.
//!
//! Records are formatted as `timestamp | LEVEL | message` and written to
//! stdout, and additionally appended to a log file when one is given.
//! `RUST_LOG` overrides the level chosen from the command-line flags.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Writes every buffer to stdout and to a file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

/// Level for the `--verbose` / `--quiet` flags. Quiet wins.
#[must_use]
pub fn level_for(verbose: bool, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Install the global logger.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a logger is already set.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> io::Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(level.as_str()));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} | {} | {}",
            buf.timestamp(),
            record.level(),
            record.args()
        )
    });

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.target(Target::Pipe(Box::new(Tee { file })));
        }
        None => {
            builder.target(Target::Stdout);
        }
    }

    builder.try_init().map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(level_for(false, false), LevelFilter::Info);
        assert_eq!(level_for(true, false), LevelFilter::Debug);
        assert_eq!(level_for(true, true), LevelFilter::Warn);
    }

    #[test]
    fn tee_writes_through_to_file() {
        let path = std::env::temp_dir().join(format!("tsieve-tee-{}.log", std::process::id()));
        let file = File::create(&path).unwrap();
        let mut tee = Tee { file };
        tee.write_all(b"12:00 | INFO | hello\n").unwrap();
        tee.flush().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "12:00 | INFO | hello\n");
        std::fs::remove_file(&path).unwrap();
    }
}
