//! Integration tests for the JSONL record store
//!
//! Covers the append path under concurrency and reload behavior as seen by
//! a caller that only uses the public API.

use std::sync::Arc;

use dongjeop_common::{AccessibilityRecord, ChairInfo, RecordStore, WidthClass};
use tempfile::TempDir;

fn labeled(i: usize) -> AccessibilityRecord {
    let mut record = AccessibilityRecord::new(format!("batch_{:02}/photo{}.webp", i % 4, i));
    record.batch = Some(format!("batch_{:02}", i % 4));
    record.has_step = i % 2 == 1;
    record.width_class.insert(WidthClass::Normal);
    record.chair = ChairInfo {
        has_movable_chair: true,
        ..ChairInfo::default()
    };
    record.confidence = Some(0.9);
    record
}

#[tokio::test]
async fn test_concurrent_appends_produce_whole_lines() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RecordStore::new(dir.path().join("gt.jsonl")));

    let mut handles = Vec::new();
    for i in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.append(&labeled(i)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let records = store.reload();
    assert_eq!(records.len(), 32);

    let contents = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(contents.lines().count(), 32);
    assert!(contents
        .lines()
        .all(|line| serde_json::from_str::<AccessibilityRecord>(line).is_ok()));
}

#[tokio::test]
async fn test_appended_records_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = RecordStore::new(dir.path().join("gt.jsonl"));

    let original = labeled(3);
    store.append(&original).await.unwrap();

    let records = store.reload();
    assert_eq!(records.as_slice(), &[original]);
}

#[tokio::test]
async fn test_malformed_line_between_appends() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gt.jsonl");
    let store = RecordStore::new(&path);

    store.append(&labeled(0)).await.unwrap();
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{\"file_path\": \"batch_00/broken.webp\", \"has_step\": \"yes\"}}").unwrap();
        writeln!(file, "garbage").unwrap();
    }
    store.append(&labeled(1)).await.unwrap();

    let records = store.load(false);
    let paths: Vec<&str> = records.iter().map(|r| r.file_path.as_str()).collect();
    assert_eq!(paths, vec!["batch_00/photo0.webp", "batch_01/photo1.webp"]);
}
