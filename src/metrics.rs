//! Wrapped-counter persistence.
//!
//! A single integer in a text file, counting how many "wrapped" summaries
//! have been generated since a fixed date. Reads self-heal: a missing or
//! corrupt file becomes zero on disk again. All file access happens under
//! one lock so concurrent increments never lose counts.

use std::fs;
use std::io;
use std::path::PathBuf;

use parking_lot::Mutex;

/// File-backed wrapped counter.
pub struct WrappedCounter {
    path: PathBuf,
    since: String,
    lock: Mutex<()>,
}

impl WrappedCounter {
    /// Create a counter stored at `path`, labelled with its start date.
    pub fn new(path: impl Into<PathBuf>, since: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            since: since.into(),
            lock: Mutex::new(()),
        }
    }

    /// The date this counter started, for display next to the value.
    pub fn since(&self) -> &str {
        &self.since
    }

    /// Current count. Missing or corrupt files heal to zero.
    pub fn read(&self) -> io::Result<u64> {
        let _guard = self.lock.lock();
        self.read_unlocked()
    }

    /// Increment the count by one and return the new value.
    pub fn increment(&self) -> io::Result<u64> {
        let _guard = self.lock.lock();
        let count = self.read_unlocked()? + 1;
        fs::write(&self.path, count.to_string())?;
        Ok(count)
    }

    fn read_unlocked(&self) -> io::Result<u64> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match contents.trim().parse::<u64>() {
                Ok(count) => Ok(count),
                Err(_) => {
                    tracing::warn!(path = %self.path.display(), "corrupt counter file, resetting");
                    fs::write(&self.path, "0")?;
                    Ok(0)
                }
            },
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, "0")?;
                Ok(0)
            }
            Err(error) => Err(error),
        }
    }
}
