//! JSONL record store with a process-local cache
//!
//! The backing file holds one JSON object per line and is append-only. The
//! first load (or a forced one) reads the whole file into an immutable
//! snapshot shared by `Arc`; later cached loads hand out the same snapshot.
//! Appends never touch the cache, so newly written records are only visible
//! after an explicit reload.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::record::AccessibilityRecord;
use crate::Result;

/// Shared, immutable view of the dataset
pub type Snapshot = Arc<Vec<AccessibilityRecord>>;

/// Dataset loader, cache and single writer for one JSONL file
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    cache: RwLock<Option<Snapshot>>,
    /// Serializes appends so concurrent batches never interleave lines
    writer: Mutex<()>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return all records, reading the file when `force` is set or nothing is cached
    ///
    /// Never fails: a missing file yields an empty set (with a warning) and
    /// malformed lines are logged and skipped.
    ///
    /// A successful read is always cached. An empty result from a missing or
    /// unreadable file is cached only on a forced load, so that a reload and
    /// the cached loads after it serve the same snapshot.
    pub fn load(&self, force: bool) -> Snapshot {
        if !force {
            let cached = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(snapshot) = cached.as_ref() {
                return Arc::clone(snapshot);
            }
        }

        let (snapshot, cache) = match read_records(&self.path) {
            Ok(Some(records)) => {
                info!("Loaded {} records from {}", records.len(), self.path.display());
                (Arc::new(records), true)
            }
            Ok(None) => {
                warn!("Dataset file not found: {}", self.path.display());
                (Arc::new(Vec::new()), force)
            }
            Err(e) => {
                error!("Error loading dataset {}: {}", self.path.display(), e);
                (Arc::new(Vec::new()), force)
            }
        };

        if cache {
            *self.cache.write().unwrap_or_else(PoisonError::into_inner) =
                Some(Arc::clone(&snapshot));
        }
        snapshot
    }

    /// Drop the cache and read the file again
    pub fn reload(&self) -> Snapshot {
        self.load(true)
    }

    /// Look up one record by its `file_path` in the cached snapshot
    pub fn find(&self, file_path: &str) -> Option<AccessibilityRecord> {
        self.load(false)
            .iter()
            .find(|r| r.file_path == file_path)
            .cloned()
    }

    /// Append one record as a single line, creating the file if needed
    pub async fn append(&self, record: &AccessibilityRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.writer.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("Appended {} to {}", record.file_path, self.path.display());
        Ok(())
    }
}

/// Parse the backing file; `Ok(None)` when it does not exist
fn read_records(path: &Path) -> Result<Option<Vec<AccessibilityRecord>>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    for (idx, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let line_num = idx + 1;
        let line = match std::str::from_utf8(raw) {
            Ok(text) => text.trim(),
            Err(e) => {
                error!("Invalid UTF-8 at line {}: {}", line_num, e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<AccessibilityRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => error!("JSON decode error at line {}: {}", line_num, e),
        }
    }

    Ok(Some(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::WidthClass;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("gt.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_empty_and_not_cached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.jsonl");
        let store = RecordStore::new(&path);

        assert!(store.load(false).is_empty());

        std::fs::write(&path, "{\"file_path\": \"batch_00/a.webp\"}\n").unwrap();
        assert_eq!(store.load(false).len(), 1);
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "{\"file_path\": \"batch_00/a.webp\", \"has_step\": true}\n\
             {not json\n\
             \n\
             {\"has_step\": false}\n\
             {\"file_path\": \"batch_00/b.webp\"}\n",
        );
        let store = RecordStore::new(path);

        let records = store.load(false);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file_path, "batch_00/a.webp");
        assert!(records[0].has_step);
        assert_eq!(records[1].file_path, "batch_00/b.webp");
    }

    #[test]
    fn test_null_and_unknown_values_keep_the_record() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "{\"file_path\": \"batch_00/a.webp\", \"has_step\": null, \"width_class\": [\"wide\"]}\n\
             {\"file_path\": \"batch_00/b.webp\", \"chair\": null, \"width_class\": [\"huge\"]}\n",
        );
        let store = RecordStore::new(path);

        let records = store.load(false);
        assert_eq!(records.len(), 2);
        assert!(!records[0].has_step);
        assert!(records[0].has_width(WidthClass::Wide));
        assert!(records[1].width_class.is_empty());
        assert!(!records[1].chair.has_movable_chair);
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gt.jsonl");
        let mut bytes = b"{\"file_path\": \"a/1.jpg\"}\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        bytes.extend_from_slice(b"{\"file_path\": \"a/2.jpg\"}");
        std::fs::write(&path, bytes).unwrap();

        let store = RecordStore::new(path);
        assert_eq!(store.load(false).len(), 2);
    }

    #[test]
    fn test_cached_load_returns_same_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "{\"file_path\": \"batch_00/a.webp\"}\n");
        let store = RecordStore::new(&path);

        let first = store.load(false);
        std::fs::write(&path, "").unwrap();
        let second = store.load(false);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        let reloaded = store.reload();
        assert!(reloaded.is_empty());
        assert!(!Arc::ptr_eq(&first, &reloaded));
    }

    #[test]
    fn test_reload_of_deleted_file_replaces_cache() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "{\"file_path\": \"batch_00/a.webp\"}\n");
        let store = RecordStore::new(&path);
        assert_eq!(store.load(false).len(), 1);

        std::fs::remove_file(&path).unwrap();
        let reloaded = store.reload();
        assert!(reloaded.is_empty());

        let cached = store.load(false);
        assert!(cached.is_empty());
        assert!(Arc::ptr_eq(&reloaded, &cached));
        assert!(store.find("batch_00/a.webp").is_none());
    }

    #[test]
    fn test_unreadable_dataset_on_reload_is_cached_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "{\"file_path\": \"batch_00/a.webp\"}\n");
        let store = RecordStore::new(&path);
        assert_eq!(store.load(false).len(), 1);

        // A directory in place of the file makes the read fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.reload().is_empty());
        assert!(store.load(false).is_empty());
    }

    #[test]
    fn test_find_by_file_path() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "{\"file_path\": \"batch_00/a.webp\"}\n{\"file_path\": \"batch_01/b.webp\", \"has_step\": true}\n",
        );
        let store = RecordStore::new(path);

        let found = store.find("batch_01/b.webp").unwrap();
        assert!(found.has_step);
        assert!(store.find("batch_01/missing.webp").is_none());
    }

    #[tokio::test]
    async fn test_append_does_not_invalidate_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("gt.jsonl");
        let store = RecordStore::new(&path);

        store.append(&AccessibilityRecord::new("batch_00/a.webp")).await.unwrap();
        assert_eq!(store.load(false).len(), 1);

        store.append(&AccessibilityRecord::new("batch_00/b.webp")).await.unwrap();
        assert_eq!(store.load(false).len(), 1);
        assert_eq!(store.reload().len(), 2);
    }
}
