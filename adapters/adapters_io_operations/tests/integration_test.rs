//! Integration tests for adapters_io_operations crate
//!
//! These tests verify a frame over a named file across reconnects.

use adapters_io_operations::*;
use entities_io_operations::{CloseStatus, OpenStatus, Position};

#[test]
fn test_frame_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.dat");

    let mut file = OpenFile::new();
    file.open(OpenStatus::New, Position::Rewind, Some(&path)).unwrap();
    let mut frame = FileFrame::new();
    frame.write_frame(&mut file, 0, b"line one\n").unwrap();
    frame.write_frame(&mut file, 9, b"line two\n").unwrap();
    frame.flush(&mut file).unwrap();
    file.close(CloseStatus::Keep).unwrap();

    let mut file = OpenFile::new();
    file.open(OpenStatus::Old, Position::Rewind, Some(&path)).unwrap();
    let mut frame = FileFrame::new();
    assert_eq!(frame.read_frame(&mut file, 9, 256).unwrap(), 9);
    assert_eq!(frame.bytes_at(9, 8), b"line two");
    file.close(CloseStatus::Delete).unwrap();
    assert!(!path.exists());
}

#[test]
fn test_replace_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replace.dat");
    std::fs::write(&path, b"old contents").unwrap();
    let mut file = OpenFile::new();
    file.open(OpenStatus::Replace, Position::AsIs, Some(&path)).unwrap();
    let mut frame = FileFrame::new();
    assert_eq!(frame.read_frame(&mut file, 0, 16).unwrap(), 0);
    file.close(CloseStatus::Keep).unwrap();
}
