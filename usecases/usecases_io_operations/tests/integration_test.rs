//! Integration tests for usecases_io_operations crate
//!
//! These tests drive whole statements against external units backed by
//! temporary files.

use std::sync::Arc;
use std::thread;

use entities_io_operations::{
    Access, CloseStatus, ConnectionForm, Direction, FieldSource, HandlerFlags, Iostat, MutableModes,
    OpenStatus, Position, Terminator,
};
use usecases_io_operations::*;

fn terminator() -> Terminator {
    Terminator::new(Some("integration_test.f90"), 1)
}

#[test]
fn test_direct_access_records_in_any_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("direct.bin");
    let unit = ExternalFileUnit::new(30);

    let mut stmt = unit.begin_io_statement(StatementKind::Open, terminator());
    let form = ConnectionForm {
        access: Access::Direct,
        is_formatted: false,
        record_length: Some(4),
    };
    assert!(stmt.open_unit(OpenStatus::New, Position::AsIs, Some(path.clone()), form));
    stmt.end_io_statement();

    for record in [3u64, 1, 2] {
        let mut stmt = unit.begin_io_statement(StatementKind::Unformatted(Direction::Output), terminator());
        assert!(stmt.set_record_number(record));
        assert!(stmt.emit(&(record as u32 * 10).to_ne_bytes()));
        assert_eq!(stmt.end_io_statement(), Iostat::Ok);
    }

    let mut stmt = unit.begin_io_statement(StatementKind::Unformatted(Direction::Input), terminator());
    assert!(stmt.set_record_number(2));
    let mut bytes = [0u8; 4];
    assert!(stmt.receive(&mut bytes));
    assert_eq!(u32::from_ne_bytes(bytes), 20);
    assert_eq!(stmt.end_io_statement(), Iostat::Ok);

    let mut stmt = unit.begin_io_statement(StatementKind::Close, terminator());
    assert!(stmt.close_unit(CloseStatus::Keep));
    stmt.end_io_statement();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 12);
}

#[test]
fn test_append_position_adds_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.txt");
    std::fs::write(&path, b"existing\n").unwrap();
    let unit = ExternalFileUnit::new(31);

    let mut stmt = unit.begin_io_statement(StatementKind::Open, terminator());
    assert!(stmt.open_unit(OpenStatus::Old, Position::Append, Some(path.clone()), ConnectionForm::default()));
    stmt.end_io_statement();

    let mut stmt = unit.begin_io_statement(StatementKind::ExternalList(Direction::Output), terminator());
    assert!(stmt.emit(b" added"));
    stmt.end_io_statement();

    let mut stmt = unit.begin_io_statement(StatementKind::Close, terminator());
    stmt.close_unit(CloseStatus::Keep);
    stmt.end_io_statement();
    assert_eq!(std::fs::read(&path).unwrap(), b"existing\n added\n");
}

#[test]
fn test_scratch_unit_reads_back_after_rewind_by_reopen() {
    let unit = ExternalFileUnit::new(32);
    let mut stmt = unit.begin_io_statement(StatementKind::Open, terminator());
    assert!(stmt.open_unit(OpenStatus::Scratch, Position::AsIs, None, ConnectionForm::default()));
    stmt.end_io_statement();

    let mut stmt = unit.begin_io_statement(StatementKind::ExternalFormatted(Direction::Output), terminator());
    assert!(stmt.emit(b"scratch"));
    stmt.end_io_statement();

    let mut stmt = unit.begin_io_statement(StatementKind::Close, terminator());
    assert!(stmt.close_unit(CloseStatus::Keep));
    stmt.end_io_statement();
    assert!(!unit.is_open());
}

#[test]
fn test_statements_on_one_unit_do_not_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.txt");
    let unit = Arc::new(ExternalFileUnit::new(33));
    let mut stmt = unit.begin_io_statement(StatementKind::Open, terminator());
    assert!(stmt.open_unit(OpenStatus::Replace, Position::Rewind, Some(path.clone()), ConnectionForm::default()));
    stmt.end_io_statement();

    let writers: Vec<_> = (0..4u8)
        .map(|id| {
            let unit = Arc::clone(&unit);
            thread::spawn(move || {
                for _ in 0..25 {
                    let mut stmt =
                        unit.begin_io_statement(StatementKind::ExternalFormatted(Direction::Output), terminator());
                    for _ in 0..8 {
                        assert!(stmt.emit(&[b'a' + id]));
                    }
                    assert_eq!(stmt.end_io_statement(), Iostat::Ok);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let mut stmt = unit.begin_io_statement(StatementKind::Close, terminator());
    stmt.close_unit(CloseStatus::Keep);
    stmt.end_io_statement();
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 100);
    for line in lines {
        assert_eq!(line.len(), 8);
        assert!(line.bytes().all(|byte| byte == line.as_bytes()[0]));
    }
}

#[test]
fn test_end_with_iostat_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, b"").unwrap();
    let unit = ExternalFileUnit::new(34);
    let mut stmt = unit.begin_io_statement(StatementKind::Open, terminator());
    assert!(stmt.open_unit(OpenStatus::Old, Position::Rewind, Some(path), ConnectionForm::default()));
    stmt.end_io_statement();

    let mut stmt = unit.begin_io_statement(StatementKind::ExternalList(Direction::Input), terminator());
    stmt.enable_handlers(HandlerFlags::IOSTAT);
    assert_eq!(stmt.next_char(), None);
    assert_eq!(stmt.end_io_statement(), Iostat::End);
    assert_eq!(Iostat::End.code(), -1);
}

#[test]
fn test_internal_unit_formatted_write() {
    let mut buffer = [0u8; 6];
    let mut unit = InternalUnit::for_output(&mut buffer, 6, terminator());
    assert!(unit.emit(b"42"));
    assert_eq!(unit.end_io_statement(), Iostat::Ok);
    assert_eq!(&buffer, b"42    ");
}

fn open_with(unit: &ExternalFileUnit, status: OpenStatus, path: &std::path::Path, form: ConnectionForm) {
    let mut stmt = unit.begin_io_statement(StatementKind::Open, terminator());
    assert!(stmt.open_unit(status, Position::Rewind, Some(path.to_path_buf()), form));
    assert_eq!(stmt.end_io_statement(), Iostat::Ok);
}

fn close(unit: &ExternalFileUnit) {
    let mut stmt = unit.begin_io_statement(StatementKind::Close, terminator());
    assert!(stmt.close_unit(CloseStatus::Keep));
    stmt.end_io_statement();
}

fn write_record(unit: &ExternalFileUnit, text: &str) {
    let mut stmt = unit.begin_io_statement(StatementKind::ExternalFormatted(Direction::Output), terminator());
    assert!(stmt.emit(text.as_bytes()));
    assert_eq!(stmt.end_io_statement(), Iostat::Ok);
}

fn read_bytes(unit: &ExternalFileUnit, count: usize) -> (Vec<u8>, Iostat) {
    let mut stmt = unit.begin_io_statement(StatementKind::Unformatted(Direction::Input), terminator());
    stmt.enable_handlers(HandlerFlags::IOSTAT | HandlerFlags::END);
    let mut bytes = vec![0u8; count];
    stmt.receive(&mut bytes);
    let stat = stmt.end_io_statement();
    (bytes, stat)
}

#[test]
fn test_reopen_old_same_file_keeps_form() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form.txt");
    let unit = ExternalFileUnit::new(35);
    open_with(&unit, OpenStatus::Replace, &path, ConnectionForm::default());
    write_record(&unit, "one");

    let unformatted = ConnectionForm {
        is_formatted: false,
        record_length: Some(8),
        ..ConnectionForm::default()
    };
    let mut stmt = unit.begin_io_statement(StatementKind::Open, terminator());
    assert!(stmt.open_unit(OpenStatus::Old, Position::AsIs, Some(path.clone()), unformatted));
    assert!(stmt.connection_mut().is_formatted);
    assert_eq!(stmt.connection_mut().record_length, None);
    stmt.end_io_statement();

    write_record(&unit, "two");
    close(&unit);
    assert_eq!(std::fs::read(&path).unwrap(), b"one\ntwo\n");
}

#[test]
fn test_open_over_open_closes_old_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.bin");
    let unit = ExternalFileUnit::new(36);
    open_with(&unit, OpenStatus::Replace, &first, ConnectionForm::default());
    write_record(&unit, "kept");

    let unformatted = ConnectionForm {
        is_formatted: false,
        ..ConnectionForm::default()
    };
    open_with(&unit, OpenStatus::Replace, &second, unformatted);
    assert_eq!(std::fs::read(&first).unwrap(), b"kept\n");

    let mut stmt = unit.begin_io_statement(StatementKind::Unformatted(Direction::Output), terminator());
    assert!(stmt.emit(&[9, 8]));
    assert_eq!(stmt.end_io_statement(), Iostat::Ok);
    close(&unit);

    let mut expected = 2u32.to_ne_bytes().to_vec();
    expected.extend_from_slice(&[9, 8]);
    expected.extend_from_slice(&2u32.to_ne_bytes());
    assert_eq!(std::fs::read(&second).unwrap(), expected);
    assert_eq!(std::fs::read(&first).unwrap(), b"kept\n");
}

#[test]
fn test_stream_reads_continue_where_the_last_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stream.bin");
    std::fs::write(&path, [1u8, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    let unit = ExternalFileUnit::new(37);
    let stream = ConnectionForm {
        access: Access::Stream,
        is_formatted: false,
        record_length: None,
    };
    open_with(&unit, OpenStatus::Old, &path, stream);

    assert_eq!(read_bytes(&unit, 4), (vec![1, 2, 3, 4], Iostat::Ok));
    assert_eq!(read_bytes(&unit, 4), (vec![5, 6, 7, 8], Iostat::Ok));
    assert_eq!(read_bytes(&unit, 1).1, Iostat::End);
}

#[test]
fn test_stream_write_then_read_without_markers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.bin");
    let unit = ExternalFileUnit::new(38);
    let stream = ConnectionForm {
        access: Access::Stream,
        is_formatted: false,
        record_length: None,
    };
    open_with(&unit, OpenStatus::Replace, &path, stream);
    for chunk in [[1u8, 2], [3, 4]] {
        let mut stmt = unit.begin_io_statement(StatementKind::Unformatted(Direction::Output), terminator());
        assert!(stmt.emit(&chunk));
        assert_eq!(stmt.end_io_statement(), Iostat::Ok);
    }
    close(&unit);
    assert_eq!(std::fs::read(&path).unwrap(), [1, 2, 3, 4]);
}

#[test]
fn test_formatted_stream_records_end_at_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lines.txt");
    std::fs::write(&path, b"ab\ncd\n").unwrap();
    let unit = ExternalFileUnit::new(39);
    let stream = ConnectionForm {
        access: Access::Stream,
        ..ConnectionForm::default()
    };
    open_with(&unit, OpenStatus::Old, &path, stream);

    for expected in ["ab", "cd"] {
        let mut stmt = unit.begin_io_statement(StatementKind::ExternalFormatted(Direction::Input), terminator());
        let mut text = String::new();
        while let Some(ch) = stmt.next_char() {
            text.push(ch);
            FieldSource::handle_relative_position(&mut stmt, 1);
        }
        assert_eq!(stmt.end_io_statement(), Iostat::Ok);
        assert_eq!(text, expected);
    }
}

fn no_pad() -> MutableModes {
    MutableModes {
        pad: false,
        ..MutableModes::default()
    }
}

#[test]
fn test_non_advancing_read_past_record_end_moves_to_next_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixed.txt");
    std::fs::write(&path, b"abcdefgh").unwrap();
    let unit = ExternalFileUnit::new(40);
    let fixed = ConnectionForm {
        record_length: Some(4),
        ..ConnectionForm::default()
    };
    open_with(&unit, OpenStatus::Old, &path, fixed);

    let mut stmt = unit.begin_io_statement(StatementKind::ExternalFormatted(Direction::Input), terminator());
    stmt.enable_handlers(HandlerFlags::EOR);
    stmt.set_non_advancing(true);
    let mut remaining = Some(6);
    let mut field = String::new();
    while let Some(ch) = stmt.next_in_field(&mut remaining, &no_pad()).unwrap() {
        field.push(ch);
    }
    assert_eq!(field, "abcd");
    assert_eq!(stmt.end_io_statement(), Iostat::Eor);

    let mut stmt = unit.begin_io_statement(StatementKind::ExternalFormatted(Direction::Input), terminator());
    let mut remaining = Some(4);
    let mut field = String::new();
    while let Some(ch) = stmt.next_in_field(&mut remaining, &no_pad()).unwrap() {
        field.push(ch);
    }
    assert_eq!(stmt.end_io_statement(), Iostat::Ok);
    assert_eq!(field, "efgh");
}

#[test]
fn test_end_outranks_earlier_eor_in_one_statement() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single.txt");
    std::fs::write(&path, b"wxyz").unwrap();
    let unit = ExternalFileUnit::new(41);
    let fixed = ConnectionForm {
        record_length: Some(4),
        ..ConnectionForm::default()
    };
    open_with(&unit, OpenStatus::Old, &path, fixed);

    let mut stmt = unit.begin_io_statement(StatementKind::ExternalFormatted(Direction::Input), terminator());
    stmt.enable_handlers(HandlerFlags::IOSTAT);
    stmt.set_non_advancing(true);
    let mut remaining = Some(5);
    while stmt.next_in_field(&mut remaining, &no_pad()).unwrap().is_some() {}
    assert_eq!(stmt.handler().io_stat(), Iostat::Eor);
    stmt.advance_record();
    assert_eq!(stmt.next_char(), None);
    assert_eq!(stmt.end_io_statement(), Iostat::End);
}

#[test]
fn test_statement_modes_only_on_formatted_transfers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modes.txt");
    let unit = ExternalFileUnit::new(42);
    open_with(&unit, OpenStatus::Replace, &path, ConnectionForm::default());

    let comma = MutableModes {
        decimal_comma: true,
        ..MutableModes::default()
    };
    let mut stmt = unit.begin_io_statement(StatementKind::ExternalList(Direction::Output), terminator());
    assert!(stmt.set_modes(comma));
    assert!(stmt.modes().decimal_comma);
    stmt.end_io_statement();

    let mut stmt = unit.begin_io_statement(StatementKind::Open, terminator());
    stmt.enable_handlers(HandlerFlags::IOSTAT);
    assert!(!stmt.set_modes(comma));
    assert_eq!(stmt.end_io_statement(), Iostat::ErrorInKeyword);
}
