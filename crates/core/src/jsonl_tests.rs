// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestRecord {
    id: u32,
    name: String,
}

fn record(id: u32, name: &str) -> TestRecord {
    TestRecord {
        id,
        name: name.into(),
    }
}

#[test]
fn read_all_returns_empty_for_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.jsonl");

    let records: Vec<TestRecord> = read_all(&path).unwrap();
    assert!(records.is_empty());
}

#[test]
fn write_and_read_preserves_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.jsonl");

    let records = vec![record(1, "first"), record(2, "second"), record(3, "third")];
    write_all(&path, &records).unwrap();

    let read: Vec<TestRecord> = read_all(&path).unwrap();
    assert_eq!(read, records);
}

#[test]
fn read_all_skips_empty_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.jsonl");

    std::fs::write(
        &path,
        "{\"id\":1,\"name\":\"a\"}\n\n   \n{\"id\":2,\"name\":\"b\"}\n",
    )
    .unwrap();

    let records: Vec<TestRecord> = read_all(&path).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn read_all_fails_on_corrupt_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.jsonl");

    std::fs::write(&path, "{\"id\":1,\"name\":\"a\"}\nnot json\n").unwrap();

    let result: Result<Vec<TestRecord>> = read_all(&path);
    assert!(matches!(result, Err(crate::Error::Json(_))));
}

#[test]
fn write_all_replaces_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.jsonl");

    write_all(&path, &[record(1, "first"), record(2, "second")]).unwrap();
    write_all(&path, &[record(3, "replaced")]).unwrap();

    let records: Vec<TestRecord> = read_all(&path).unwrap();
    assert_eq!(records, vec![record(3, "replaced")]);
}

#[test]
fn write_all_empty_truncates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.jsonl");

    write_all(&path, &[record(1, "first")]).unwrap();
    write_all::<TestRecord>(&path, &[]).unwrap();

    assert!(path.exists());
    let records: Vec<TestRecord> = read_all(&path).unwrap();
    assert!(records.is_empty());
}

#[test]
fn write_all_creates_parent_dirs_and_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("test.jsonl");

    write_all(&path, &[record(1, "first")]).unwrap();

    assert!(path.exists());
    assert!(!path.with_file_name("test.jsonl.tmp").exists());
}
