use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::message::Message;

/// Append-only line-delimited JSON log. Appends are serialized through an
/// internal lock so concurrent producers never interleave partial lines.
/// I/O errors are logged and absorbed — the live admission path does not
/// depend on the WAL succeeding.
pub struct WriteAheadLog {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl WriteAheadLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = fs::create_dir_all(parent) {
                    tracing::warn!(?err, path = %parent.display(), "failed to create WAL parent directory");
                }
            }
        }
        Self { path, append_lock: Mutex::new(()) }
    }

    pub fn append(&self, msg: &Message) {
        let _guard = self.append_lock.lock();
        let line = match serde_json::to_string(msg) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(?err, id = %msg.id, "failed to serialize message for WAL");
                return;
            }
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| {
                writeln!(file, "{}", line)?;
                file.sync_all()
            });
        if let Err(err) = result {
            tracing::error!(?err, path = %self.path.display(), id = %msg.id, "WAL append failed");
        }
    }

    /// Line-iterates the WAL file, decoding each record. Used for recovery
    /// replay (each record is re-injected via `Broker::enqueue_from_peer`).
    pub fn replay(&self) -> Vec<Message> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(?err, path = %self.path.display(), "WAL replay read failed");
                return Vec::new();
            }
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Message>(line) {
                Ok(msg) => Some(msg),
                Err(err) => {
                    tracing::warn!(?err, "skipping malformed WAL line");
                    None
                }
            })
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str) -> Message {
        Message::new(id.to_string(), "payload".to_string(), 1, None, None)
    }

    #[test]
    fn append_then_replay_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let wal = WriteAheadLog::new(dir.path().join("wal.log"));
        wal.append(&msg("a"));
        wal.append(&msg("b"));
        let replayed = wal.replay();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].id, "a");
        assert_eq!(replayed[1].id, "b");
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/dir/wal.log");
        let wal = WriteAheadLog::new(&nested);
        wal.append(&msg("a"));
        assert!(nested.exists());
    }

    #[test]
    fn replay_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let wal = WriteAheadLog::new(dir.path().join("missing.log"));
        assert!(wal.replay().is_empty());
    }
}
