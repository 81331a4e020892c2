//! Append-only record of identifiers confirmed to exist.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::debug;

/// Errors from the identifier log.
#[derive(Debug, Error)]
pub enum IdLogError {
    /// Opening, writing or flushing the log file failed.
    #[error("IO error on identifier log {path}: {source}")]
    Io {
        /// Log file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Line-per-identifier log shared by all workers.
///
/// The file is opened in append mode and never truncated or read back. A
/// mutex around the buffered writer makes each `id\n` line a single unit, so
/// concurrent appends never interleave.
#[derive(Debug)]
pub struct IdLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl IdLog {
    /// Opens (creating if absent) the log at `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns [`IdLogError::Io`] if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IdLogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| IdLogError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "identifier log opened");
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one identifier as its own line.
    ///
    /// # Errors
    ///
    /// Returns [`IdLogError::Io`] if the write fails.
    pub async fn append(&self, id: &str) -> Result<(), IdLogError> {
        let mut line = Vec::with_capacity(id.len() + 1);
        line.extend_from_slice(id.as_bytes());
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await.map_err(|e| self.io(e))
    }

    /// Flushes buffered lines to disk.
    ///
    /// # Errors
    ///
    /// Returns [`IdLogError::Io`] if the flush fails.
    pub async fn flush(&self) -> Result<(), IdLogError> {
        let mut writer = self.writer.lock().await;
        writer.flush().await.map_err(|e| self.io(e))
    }

    fn io(&self, source: std::io::Error) -> IdLogError {
        IdLogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_append_writes_one_line_per_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");
        let log = IdLog::open(&path).await.unwrap();

        log.append("abcde").await.unwrap();
        log.append("ABCDEFG").await.unwrap();
        log.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "abcde\nABCDEFG\n");
    }

    #[tokio::test]
    async fn test_open_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");
        std::fs::write(&path, "first\n").unwrap();

        let log = IdLog::open(&path).await.unwrap();
        log.append("second").await.unwrap();
        log.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_open_missing_directory_fails_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("ids.txt");

        let err = IdLog::open(&path).await.unwrap_err();
        assert!(err.to_string().contains("ids.txt"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_never_interleave() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");
        let log = Arc::new(IdLog::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for task in 0..8 {
            let log = Arc::clone(&log);
            handles.push(tokio::spawn(async move {
                let id = format!("{task}").repeat(7);
                for _ in 0..200 {
                    log.append(&id).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        log.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 8 * 200);
        for line in lines {
            assert_eq!(line.len(), 7, "torn line: {line:?}");
            let first = line.as_bytes()[0];
            assert!(line.bytes().all(|b| b == first), "mixed line: {line:?}");
        }
    }
}
