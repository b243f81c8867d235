// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[test]
fn test_config_error_display() {
    let err = Error::Config("failed to parse config: bad key".to_string());
    assert_eq!(
        err.to_string(),
        "config error: failed to parse config: bad key"
    );
}

#[test]
fn test_invalid_data_has_hint() {
    let err = Error::InvalidData("expected value at line 1".to_string());
    let msg = err.to_string();
    assert!(msg.contains("invalid data"));
    assert!(msg.contains("hint:"));
    assert!(msg.contains("{\"name\":\"x\"}"));
}

#[test]
fn test_sync_error_is_transparent() {
    let core = offsync_core::Error::InvalidMutation("collection is required".into());
    let expected = core.to_string();
    let err: Error = SyncError::from(core).into();
    assert_eq!(err.to_string(), expected);
}

#[test]
fn test_io_error_from() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: Error = io.into();
    assert!(err.to_string().starts_with("io error:"));
}
