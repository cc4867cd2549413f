//! I/O Error Handler
//!
//! Per-statement status keeper. Every fault raised while a statement runs is
//! funnelled here; the handler either records it for IOSTAT=/ERR=/END=/EOR=
//! processing or terminates the program when the statement declared no way
//! to receive it.
//!
//! ## Priority
//!
//! A statement reports at most one condition. An error outranks END, END
//! outranks EOR, and the first error recorded is the one kept.
//!
//! ## Fatal termination
//!
//! [`Terminator::crash`] logs the message, runs the registered crash hook
//! once (used to flush buffered output) and panics.

/*
 * %CopyrightBegin%
 *
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright Lee Barney 2025. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * %CopyrightEnd%
 */

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use thiserror::Error;

use crate::iostat::Iostat;

type CrashHook = Box<dyn Fn() + Send + Sync>;

lazy_static::lazy_static! {
    static ref CRASH_HOOK: RwLock<Option<CrashHook>> = RwLock::new(None);
}

static CRASHING: AtomicBool = AtomicBool::new(false);

/// Install the function run once before a fatal termination
///
/// Replaces any previously installed hook.
pub fn set_crash_hook<F>(hook: F)
where
    F: Fn() + Send + Sync + 'static,
{
    *CRASH_HOOK.write() = Some(Box::new(hook));
}

/// A recoverable data transfer fault
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoFault {
    #[error("Bad character '{ch}' in INTEGER input field")]
    BadDigit { ch: char },
    #[error("Data edit descriptor {descriptor} may not be used with {item} data")]
    BadEditDescriptor {
        descriptor: String,
        item: &'static str,
    },
    #[error("Unexpected character '{ch}' after the end of a {item} input field")]
    TrailingCharacters { ch: char, item: &'static str },
    #[error("Bad REAL input value")]
    BadRealInput,
    #[error("Excessive output to fixed-size record")]
    RecordWriteOverrun,
    #[error("Excessive input from fixed-size record")]
    RecordReadOverrun,
    #[error("Internal write overran available records")]
    InternalWriteOverrun,
    #[error("{0}")]
    BadUnformattedRecord(String),
    #[error("FLUSH not possible")]
    Unflushable,
    #[error("Bad keyword argument value: {0}")]
    BadKeyword(String),
    #[error("{0}")]
    Generic(String),
    #[error("I/O error (errno={code}): {message}")]
    Os { code: i32, message: String },
}

impl IoFault {
    /// Status code recorded for this fault
    pub fn iostat(&self) -> Iostat {
        match self {
            IoFault::BadDigit { .. } | IoFault::Generic(_) => Iostat::GenericError,
            IoFault::BadEditDescriptor { .. } | IoFault::TrailingCharacters { .. } => {
                Iostat::ErrorInFormat
            }
            IoFault::BadRealInput => Iostat::BadRealInput,
            IoFault::RecordWriteOverrun => Iostat::RecordWriteOverrun,
            IoFault::RecordReadOverrun => Iostat::RecordReadOverrun,
            IoFault::InternalWriteOverrun => Iostat::InternalWriteOverrun,
            IoFault::BadUnformattedRecord(_) => Iostat::BadUnformattedRecord,
            IoFault::Unflushable => Iostat::Unflushable,
            IoFault::BadKeyword(_) => Iostat::ErrorInKeyword,
            IoFault::Os { code, .. } => Iostat::Os(*code),
        }
    }
}

impl From<std::io::Error> for IoFault {
    fn from(error: std::io::Error) -> Self {
        match error.raw_os_error() {
            Some(code) => IoFault::Os {
                code,
                message: error.to_string(),
            },
            None => IoFault::Generic(error.to_string()),
        }
    }
}

/// Source location of the statement, used in fatal messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Terminator {
    source_file: Option<&'static str>,
    source_line: u32,
}

impl Terminator {
    /// Create a terminator for a statement at `file:line`
    pub fn new(source_file: Option<&'static str>, source_line: u32) -> Self {
        Self {
            source_file,
            source_line,
        }
    }

    /// Source file, if known
    pub fn source_file(&self) -> Option<&'static str> {
        self.source_file
    }

    /// Source line
    pub fn source_line(&self) -> u32 {
        self.source_line
    }

    /// Terminate the program with a fatal runtime error
    ///
    /// Runs the crash hook unless a crash is already in progress, so a
    /// failure inside the hook cannot recurse.
    pub fn crash(&self, message: impl fmt::Display) -> ! {
        let text = match self.source_file {
            Some(file) => format!("{message} ({file}:{})", self.source_line),
            None => message.to_string(),
        };
        tracing::error!(message = %text, "fatal Fortran runtime error");
        if !CRASHING.swap(true, Ordering::SeqCst) {
            if let Some(hook) = CRASH_HOOK.try_read().as_deref().and_then(Option::as_ref) {
                hook();
            }
            CRASHING.store(false, Ordering::SeqCst);
        }
        panic!("fatal Fortran runtime error: {text}");
    }
}

/// Which status specifiers a statement declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HandlerFlags(u8);

impl HandlerFlags {
    pub const NONE: HandlerFlags = HandlerFlags(0);
    pub const IOSTAT: HandlerFlags = HandlerFlags(1);
    pub const ERR: HandlerFlags = HandlerFlags(2);
    pub const END: HandlerFlags = HandlerFlags(4);
    pub const EOR: HandlerFlags = HandlerFlags(8);
    pub const IOMSG: HandlerFlags = HandlerFlags(16);

    /// Check whether every flag in `other` is set
    pub fn contains(self, other: HandlerFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check whether any flag in `other` is set
    pub fn intersects(self, other: HandlerFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for HandlerFlags {
    type Output = HandlerFlags;

    fn bitor(self, rhs: HandlerFlags) -> HandlerFlags {
        HandlerFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for HandlerFlags {
    fn bitor_assign(&mut self, rhs: HandlerFlags) {
        self.0 |= rhs.0;
    }
}

/// Status keeper for one I/O statement
#[derive(Debug, Clone, Default)]
pub struct IoErrorHandler {
    terminator: Terminator,
    flags: HandlerFlags,
    io_stat: Iostat,
    io_msg: Option<String>,
}

impl IoErrorHandler {
    /// Create a handler for a statement at the given location
    pub fn new(terminator: Terminator) -> Self {
        Self {
            terminator,
            ..Self::default()
        }
    }

    /// Record the status specifiers the statement declared
    pub fn enable_handlers(&mut self, flags: HandlerFlags) {
        self.flags |= flags;
    }

    /// Declared specifiers
    pub fn flags(&self) -> HandlerFlags {
        self.flags
    }

    /// Statement location
    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    /// Status recorded so far
    pub fn io_stat(&self) -> Iostat {
        self.io_stat
    }

    /// Check whether an error (not END/EOR) has been recorded
    pub fn in_error(&self) -> bool {
        self.io_stat.is_error()
    }

    /// Record a fault, or crash if the statement cannot receive it
    ///
    /// # Arguments
    /// * `fault` - The fault raised by a data transfer operation
    pub fn signal_error(&mut self, fault: IoFault) {
        let stat = fault.iostat();
        if self.flags.intersects(HandlerFlags::IOSTAT | HandlerFlags::ERR) {
            tracing::debug!(iostat = stat.code(), %fault, "I/O error recorded");
            if self.record(stat) && self.flags.contains(HandlerFlags::IOMSG) {
                self.io_msg = Some(fault.to_string());
            }
        } else {
            self.terminator.crash(fault);
        }
    }

    /// Record end of file
    pub fn signal_end(&mut self) {
        self.signal_condition(Iostat::End, HandlerFlags::END);
    }

    /// Record end of record
    pub fn signal_eor(&mut self) {
        self.signal_condition(Iostat::Eor, HandlerFlags::EOR);
    }

    /// Crash unconditionally
    pub fn crash(&self, message: impl fmt::Display) -> ! {
        self.terminator.crash(message)
    }

    /// Copy the status message into a CHARACTER buffer, blank-padded
    ///
    /// Uses the saved IOMSG= text, falling back to the canned text for the
    /// status code.
    ///
    /// # Returns
    /// `true` when a message was available
    pub fn get_io_msg(&self, buffer: &mut [u8]) -> bool {
        let Some(message) = self.io_msg() else {
            return false;
        };
        let bytes = message.as_bytes();
        let copied = bytes.len().min(buffer.len());
        buffer[..copied].copy_from_slice(&bytes[..copied]);
        buffer[copied..].fill(b' ');
        true
    }

    /// Saved message, or the canned text for the status
    pub fn io_msg(&self) -> Option<String> {
        self.io_msg.clone().or_else(|| self.io_stat.message())
    }

    fn signal_condition(&mut self, stat: Iostat, own_flag: HandlerFlags) {
        if self
            .flags
            .intersects(own_flag | HandlerFlags::IOSTAT | HandlerFlags::ERR)
        {
            self.record(stat);
        } else {
            let message = stat.canned_message().unwrap_or("I/O error");
            self.terminator.crash(message);
        }
    }

    fn record(&mut self, stat: Iostat) -> bool {
        if stat.priority() > self.io_stat.priority() {
            self.io_stat = stat;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(flags: HandlerFlags) -> IoErrorHandler {
        let mut handler = IoErrorHandler::new(Terminator::new(Some("test.f90"), 12));
        handler.enable_handlers(flags);
        handler
    }

    #[test]
    fn test_end_outranks_eor() {
        let mut h = handler(HandlerFlags::IOSTAT);
        h.signal_eor();
        assert_eq!(h.io_stat(), Iostat::Eor);
        h.signal_end();
        assert_eq!(h.io_stat(), Iostat::End);
        h.signal_eor();
        assert_eq!(h.io_stat(), Iostat::End);
    }

    #[test]
    fn test_error_outranks_end_and_first_error_wins() {
        let mut h = handler(HandlerFlags::ERR);
        h.signal_end();
        h.signal_error(IoFault::RecordReadOverrun);
        assert_eq!(h.io_stat(), Iostat::RecordReadOverrun);
        h.signal_error(IoFault::BadRealInput);
        assert_eq!(h.io_stat(), Iostat::RecordReadOverrun);
        h.signal_end();
        assert!(h.in_error());
    }

    #[test]
    fn test_end_with_own_handler_only() {
        let mut h = handler(HandlerFlags::END);
        h.signal_end();
        assert_eq!(h.io_stat().code(), -1);
    }

    #[test]
    #[should_panic(expected = "fatal Fortran runtime error")]
    fn test_error_without_handler_crashes() {
        let mut h = handler(HandlerFlags::END);
        h.signal_error(IoFault::BadDigit { ch: 'x' });
    }

    #[test]
    #[should_panic(expected = "End of record during non-advancing input")]
    fn test_eor_without_handler_crashes() {
        let mut h = handler(HandlerFlags::END);
        h.signal_eor();
    }

    #[test]
    fn test_iomsg_saved_only_when_declared() {
        let mut h = handler(HandlerFlags::IOSTAT);
        h.signal_error(IoFault::BadDigit { ch: 'q' });
        assert_eq!(h.io_msg().as_deref(), Some("I/O error"));

        let mut h = handler(HandlerFlags::IOSTAT | HandlerFlags::IOMSG);
        h.signal_error(IoFault::BadDigit { ch: 'q' });
        assert_eq!(
            h.io_msg().as_deref(),
            Some("Bad character 'q' in INTEGER input field")
        );
    }

    #[test]
    fn test_get_io_msg_pads_and_truncates() {
        let mut h = handler(HandlerFlags::IOSTAT);
        h.signal_end();
        let mut buffer = [0u8; 30];
        assert!(h.get_io_msg(&mut buffer));
        assert_eq!(&buffer[..24], b"End of file during input");
        assert!(buffer[24..].iter().all(|&b| b == b' '));

        let mut short = [0u8; 3];
        assert!(h.get_io_msg(&mut short));
        assert_eq!(&short, b"End");

        let ok = handler(HandlerFlags::IOSTAT);
        assert!(!ok.get_io_msg(&mut buffer));
    }

    #[test]
    fn test_os_fault_from_io_error() {
        let fault = IoFault::from(std::io::Error::from_raw_os_error(2));
        assert_eq!(fault.iostat(), Iostat::Os(2));
    }
}
