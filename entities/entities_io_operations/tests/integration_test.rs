//! Integration tests for entities_io_operations crate
//!
//! These tests verify status handling across a whole statement.

use entities_io_operations::*;

#[test]
fn test_statement_status_lifecycle() {
    let mut handler = IoErrorHandler::new(Terminator::new(Some("prog.f90"), 3));
    handler.enable_handlers(HandlerFlags::IOSTAT | HandlerFlags::IOMSG);
    assert_eq!(handler.io_stat(), Iostat::Ok);
    assert!(handler.io_msg().is_none());

    handler.signal_eor();
    handler.signal_end();
    handler.signal_error(IoFault::BadUnformattedRecord(
        "Unformatted sequential record #2 header 8 != footer 9 at offset 16".to_string(),
    ));
    assert_eq!(handler.io_stat().code(), 1006);
    assert!(handler.io_msg().unwrap().contains("#2"));

    let next = IoErrorHandler::new(Terminator::default());
    assert_eq!(next.io_stat(), Iostat::Ok);
    assert_eq!(next.flags(), HandlerFlags::NONE);
}

#[test]
fn test_crash_hook_runs_before_fatal_error() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    set_crash_hook(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    let result = std::panic::catch_unwind(|| {
        let mut handler = IoErrorHandler::new(Terminator::new(None, 0));
        handler.signal_error(IoFault::RecordWriteOverrun);
    });
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_os_status_message() {
    let mut handler = IoErrorHandler::new(Terminator::default());
    handler.enable_handlers(HandlerFlags::ERR);
    handler.signal_error(std::io::Error::from_raw_os_error(2).into());
    assert_eq!(handler.io_stat(), Iostat::Os(2));
    let mut buffer = vec![0u8; 80];
    assert!(handler.get_io_msg(&mut buffer));
    assert_ne!(buffer[0], b' ');
}
