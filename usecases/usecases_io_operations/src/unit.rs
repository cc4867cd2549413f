//! External File Unit
//!
//! A Fortran unit connected to a file. The unit owns its connection state,
//! its OS file and a frame buffer, all behind one lock that an I/O statement
//! holds from begin to end; a second statement on the same unit waits.
//!
//! ## Record framing
//!
//! - Formatted sequential records end in `\n`. A `\r` before the `\n` is
//!   dropped on input and never written.
//! - Formatted records with a fixed RECL= have no terminator and are blank
//!   filled on output.
//! - Unformatted sequential records are `<u32 length><payload><u32 length>`
//!   in native byte order.

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

use std::path::PathBuf;
use std::sync::Arc;

use adapters_io_operations::{FileFrame, OpenFile};
use entities_io_operations::{
    Access, CloseStatus, ConnectionForm, ConnectionState, Direction, FieldSource, HandlerFlags,
    IoErrorHandler, IoFault, Iostat, MutableModes, OpenStatus, Position, Terminator,
};
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

use crate::statement::{StatementKind, StatementState};

/// Bytes in each unformatted sequential record length marker
pub const RECORD_MARKER_BYTES: usize = 4;

/// Default window when scanning for the end of a formatted record
pub const DEFAULT_READ_CHUNK: usize = 256;

/// A unit number with its connection
#[derive(Debug)]
pub struct ExternalFileUnit {
    unit_number: i32,
    state: Arc<Mutex<UnitState>>,
}

impl ExternalFileUnit {
    /// Create an unconnected unit
    pub fn new(unit_number: i32) -> Self {
        Self::with_read_chunk(unit_number, DEFAULT_READ_CHUNK)
    }

    /// Create an unconnected unit with a given record scan window
    pub fn with_read_chunk(unit_number: i32, read_chunk: usize) -> Self {
        Self {
            unit_number,
            state: Arc::new(Mutex::new(UnitState::new(unit_number, read_chunk))),
        }
    }

    pub fn unit_number(&self) -> i32 {
        self.unit_number
    }

    /// Connect the unit to a standard stream
    ///
    /// # Arguments
    /// * `fd` - 0 for input, 1 for output, 2 for error output
    /// * `is_utf8` - ENCODING='UTF-8' for the connection
    pub fn predefine(&self, fd: i32, is_utf8: bool) {
        let mut state = self.state.lock();
        state.file.predefine(fd);
        state.connection = ConnectionState {
            is_utf8,
            ..ConnectionState::default()
        };
        state.is_reading = fd == 0;
    }

    /// Check whether the unit is connected
    pub fn is_open(&self) -> bool {
        self.state.lock().file.is_open()
    }

    /// Begin an I/O statement, waiting for any statement already running
    ///
    /// A data transfer statement on an unconnected unit first connects it to
    /// `fort.<unit>` with STATUS='UNKNOWN'.
    pub fn begin_io_statement(&self, kind: StatementKind, terminator: Terminator) -> IoStatement {
        let guard = self.state.lock_arc();
        IoStatement::begin(guard, kind, terminator)
    }

    /// Begin an I/O statement only if the unit is free
    pub fn try_begin_io_statement(&self, kind: StatementKind, terminator: Terminator) -> Option<IoStatement> {
        let guard = self.state.try_lock_arc()?;
        Some(IoStatement::begin(guard, kind, terminator))
    }

    /// Best-effort flush used on the fatal error path
    ///
    /// Skips the unit when a statement holds it.
    pub fn flush_on_crash(&self) {
        if let Some(mut state) = self.state.try_lock() {
            let state = &mut *state;
            let _ = state.frame.flush(&mut state.file);
            let _ = state.file.flush();
        }
    }
}

/// Lock-protected state of a unit
#[derive(Debug)]
pub struct UnitState {
    unit_number: i32,
    connection: ConnectionState,
    file: OpenFile,
    frame: FileFrame,
    offset_in_file: u64,
    record_located: bool,
    record_terminator: usize,
    is_reading: bool,
    read_chunk: usize,
    statement: StatementState,
}

impl UnitState {
    fn new(unit_number: i32, read_chunk: usize) -> Self {
        Self {
            unit_number,
            connection: ConnectionState::default(),
            file: OpenFile::new(),
            frame: FileFrame::new(),
            offset_in_file: 0,
            record_located: false,
            record_terminator: 0,
            is_reading: false,
            read_chunk: read_chunk.max(1),
            statement: StatementState::Idle,
        }
    }

    fn is_unformatted_sequential(&self) -> bool {
        !self.connection.is_formatted
            && !self.connection.is_fixed_record_length
            && self.connection.access == Access::Sequential
    }

    fn fixed_record_length(&self) -> Option<usize> {
        if self.connection.is_fixed_record_length {
            self.connection.record_length
        } else {
            None
        }
    }

    /// File offset of the first payload byte of the current record
    fn data_offset(&self) -> u64 {
        if self.is_unformatted_sequential() {
            self.offset_in_file + RECORD_MARKER_BYTES as u64
        } else {
            self.offset_in_file
        }
    }

    fn open_unit(
        &mut self,
        status: OpenStatus,
        position: Position,
        path: Option<PathBuf>,
        form: ConnectionForm,
    ) -> Result<(), IoFault> {
        if self.file.is_open() {
            let same_file = path
                .as_deref()
                .map_or(true, |path| self.file.path() == Some(path));
            if status == OpenStatus::Old && same_file {
                return Ok(());
            }
            self.flush()?;
            self.file.close(CloseStatus::Keep)?;
            tracing::debug!(unit = self.unit_number, "connected file closed for a new OPEN");
        }
        self.connection.apply_form(form);
        let path = match (status, path) {
            (OpenStatus::Scratch, _) => None,
            (_, Some(path)) => Some(path),
            (_, None) => Some(PathBuf::from(format!("fort.{}", self.unit_number))),
        };
        let start = self.file.open(status, position, path.as_deref())?;
        self.frame.reset(start);
        self.offset_in_file = start;
        self.record_located = false;
        self.is_reading = false;
        self.connection.current_record_number = 1;
        self.connection.end_file_record_number = None;
        self.connection.begin_record();
        tracing::debug!(unit = self.unit_number, ?status, ?position, "unit opened");
        Ok(())
    }

    fn close_unit(&mut self, status: CloseStatus) -> Result<(), IoFault> {
        let flushed = self.flush();
        self.file.close(status)?;
        self.frame.reset(0);
        self.offset_in_file = 0;
        self.record_located = false;
        self.connection = ConnectionState::default();
        tracing::debug!(unit = self.unit_number, ?status, "unit closed");
        flushed
    }

    fn flush(&mut self) -> Result<(), IoFault> {
        if self.file.is_open() {
            self.frame.flush(&mut self.file)?;
            self.file.flush()?;
        }
        Ok(())
    }

    fn emit(&mut self, data: &[u8], handler: &mut IoErrorHandler) -> Result<(), IoFault> {
        if self.statement.is_input() {
            handler.crash("Emit() called for an input statement");
        }
        if !self.file.may_write() {
            handler.crash(format_args!("unit {} may not be written", self.unit_number));
        }
        let position = self.connection.position_in_record;
        let furthest = self.connection.furthest_position_in_record;
        let furthest_after = furthest.max(position + data.len());
        if self
            .fixed_record_length()
            .is_some_and(|limit| furthest_after > limit)
        {
            return Err(IoFault::RecordWriteOverrun);
        }
        let base = self.data_offset();
        if position > furthest && self.connection.is_formatted {
            self.frame
                .fill(&mut self.file, base + furthest as u64, position - furthest, b' ')?;
        }
        self.frame.write_frame(&mut self.file, base + position as u64, data)?;
        self.connection.position_in_record = position + data.len();
        self.connection.furthest_position_in_record = furthest_after;
        Ok(())
    }

    fn next_char(&mut self, handler: &mut IoErrorHandler) -> Result<Option<char>, IoFault> {
        if !self.connection.is_formatted {
            handler.crash("NextChar() called for unformatted input");
        }
        if !self.file.may_read() {
            handler.crash(format_args!("unit {} may not be read", self.unit_number));
        }
        if !self.record_located && !self.locate_input_record(handler)? {
            return Ok(None);
        }
        if self.connection.remaining_in_record() == Some(0) {
            return Ok(None);
        }
        let position = self.connection.position_in_record;
        let at = self.data_offset() + position as u64;
        if self.frame.read_frame(&mut self.file, at, 1)? == 0 {
            return Ok(None);
        }
        // UTF-8 decoding is not done yet; bytes map to Latin-1
        Ok(self.frame.bytes_at(at, 1).first().map(|&byte| char::from(byte)))
    }

    fn receive(&mut self, data: &mut [u8], handler: &mut IoErrorHandler) -> Result<(), IoFault> {
        if self.connection.is_formatted {
            handler.crash("Receive() called for formatted input");
        }
        if !self.file.may_read() {
            handler.crash(format_args!("unit {} may not be read", self.unit_number));
        }
        if !self.record_located && !self.locate_input_record(handler)? {
            return Ok(());
        }
        if self
            .connection
            .remaining_in_record()
            .is_some_and(|left| data.len() > left)
        {
            return Err(IoFault::RecordReadOverrun);
        }
        let position = self.connection.position_in_record;
        let at = self.data_offset() + position as u64;
        if self.frame.read_frame(&mut self.file, at, data.len())? < data.len() {
            handler.signal_end();
            return Ok(());
        }
        data.copy_from_slice(self.frame.bytes_at(at, data.len()));
        self.connection.position_in_record = position + data.len();
        self.connection.furthest_position_in_record = self
            .connection
            .furthest_position_in_record
            .max(self.connection.position_in_record);
        Ok(())
    }

    /// Find the extent of the current input record
    ///
    /// # Returns
    /// `false` after signalling END when no record remains
    fn locate_input_record(&mut self, handler: &mut IoErrorHandler) -> Result<bool, IoFault> {
        if self.connection.is_at_eof() {
            handler.signal_end();
            return Ok(false);
        }
        let found = if let Some(length) = self.fixed_record_length() {
            self.record_terminator = 0;
            self.frame.read_frame(&mut self.file, self.offset_in_file, length)? > 0
        } else if self.connection.is_formatted {
            self.locate_formatted_record()?
        } else if self.connection.access == Access::Stream {
            self.connection.record_length = None;
            true
        } else {
            self.locate_unformatted_record()?
        };
        if !found {
            self.connection.end_file_record_number = Some(self.connection.current_record_number);
            handler.signal_end();
            return Ok(false);
        }
        self.record_located = true;
        Ok(true)
    }

    fn locate_formatted_record(&mut self) -> Result<bool, IoFault> {
        let offset = self.offset_in_file;
        let mut window = self.read_chunk;
        loop {
            let got = self.frame.read_frame(&mut self.file, offset, window)?;
            if got == 0 {
                return Ok(false);
            }
            let bytes = self.frame.bytes_at(offset, got);
            let extent = match bytes.iter().position(|&byte| byte == b'\n') {
                Some(newline) if newline > 0 && bytes[newline - 1] == b'\r' => Some((newline - 1, 2)),
                Some(newline) => Some((newline, 1)),
                None if got < window => Some((got, 0)),
                None => None,
            };
            if let Some((length, terminator)) = extent {
                self.connection.record_length = Some(length);
                self.record_terminator = terminator;
                return Ok(true);
            }
            window *= 2;
        }
    }

    fn locate_unformatted_record(&mut self) -> Result<bool, IoFault> {
        let offset = self.offset_in_file;
        let record = self.connection.current_record_number;
        let marker = RECORD_MARKER_BYTES;
        let got = self.frame.read_frame(&mut self.file, offset, marker)?;
        if got == 0 {
            return Ok(false);
        }
        if got < marker {
            return Err(corrupt_record(format!(
                "Unformatted sequential file input failed at record #{record} (file offset {offset}): truncated record header"
            )));
        }
        let header = read_marker(self.frame.bytes_at(offset, marker));
        let need = 2 * marker + header as usize;
        if self.frame.read_frame(&mut self.file, offset, need)? < need {
            return Err(corrupt_record(format!(
                "Unformatted sequential file input failed at record #{record} (file offset {offset}): hit EOF reading record with length {header} bytes"
            )));
        }
        let footer = read_marker(
            self.frame
                .bytes_at(offset + (marker + header as usize) as u64, marker),
        );
        if footer != header {
            return Err(corrupt_record(format!(
                "Unformatted sequential file input failed at record #{record} (file offset {offset}): record header has length {header} that does not match record footer ({footer})"
            )));
        }
        self.connection.record_length = Some(header as usize);
        Ok(true)
    }

    fn advance_record(&mut self, handler: &mut IoErrorHandler) -> Result<(), IoFault> {
        if self.is_reading {
            if !self.record_located && !self.locate_input_record(handler)? {
                return Ok(());
            }
            let length = self.connection.record_length.unwrap_or(0) as u64;
            self.offset_in_file += if self.fixed_record_length().is_some() {
                length
            } else if self.connection.is_formatted {
                length + self.record_terminator as u64
            } else if self.connection.access == Access::Stream {
                self.connection.furthest_position_in_record as u64
            } else {
                length + 2 * RECORD_MARKER_BYTES as u64
            };
            self.record_located = false;
        } else {
            let furthest = self.connection.furthest_position_in_record;
            if let Some(length) = self.fixed_record_length() {
                if self.connection.is_formatted && furthest < length {
                    self.frame.fill(
                        &mut self.file,
                        self.offset_in_file + furthest as u64,
                        length - furthest,
                        b' ',
                    )?;
                }
                self.offset_in_file += length as u64;
            } else if self.connection.is_formatted {
                self.frame
                    .write_frame(&mut self.file, self.offset_in_file + furthest as u64, b"\n")?;
                self.offset_in_file += furthest as u64 + 1;
            } else if self.connection.access == Access::Stream {
                self.offset_in_file += furthest as u64;
            } else {
                let marker = u32::try_from(furthest)
                    .map_err(|_| IoFault::Generic(format!("unformatted record of {furthest} bytes is too long")))?
                    .to_ne_bytes();
                self.frame.write_frame(&mut self.file, self.offset_in_file, &marker)?;
                self.frame.write_frame(
                    &mut self.file,
                    self.offset_in_file + (RECORD_MARKER_BYTES + furthest) as u64,
                    &marker,
                )?;
                self.offset_in_file += (2 * RECORD_MARKER_BYTES + furthest) as u64;
            }
            if !self.file.may_position() {
                self.flush()?;
            }
        }
        self.connection.current_record_number += 1;
        self.connection.begin_record();
        Ok(())
    }

    fn set_left_tab_limit(&mut self) {
        let furthest = self.connection.furthest_position_in_record;
        self.connection.left_tab_limit = Some(furthest);
        self.connection.position_in_record = furthest;
    }

    fn set_position_in_record(&mut self, n: i64, handler: &mut IoErrorHandler) -> Result<(), IoFault> {
        let target = n.max(0) as usize;
        if let Some(limit) = self.fixed_record_length() {
            if target > limit {
                self.connection.position_in_record = limit;
                if self.connection.non_advancing {
                    handler.signal_eor();
                    return Ok(());
                }
                return Err(if self.is_reading {
                    IoFault::RecordReadOverrun
                } else {
                    IoFault::RecordWriteOverrun
                });
            }
        }
        self.connection.position_in_record = target;
        Ok(())
    }
}

fn read_marker(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; RECORD_MARKER_BYTES];
    let len = bytes.len().min(RECORD_MARKER_BYTES);
    raw[..len].copy_from_slice(&bytes[..len]);
    u32::from_ne_bytes(raw)
}

fn corrupt_record(message: String) -> IoFault {
    tracing::warn!(%message, "corrupt unformatted record");
    IoFault::BadUnformattedRecord(message)
}

/// An I/O statement in progress on an external unit
///
/// Holds the unit's lock until [`IoStatement::end_io_statement`] (or drop).
/// Operations report faults to the statement's error handler and return
/// `false` when one was raised.
pub struct IoStatement {
    unit: ArcMutexGuard<RawMutex, UnitState>,
    handler: IoErrorHandler,
}

impl IoStatement {
    fn begin(mut unit: ArcMutexGuard<RawMutex, UnitState>, kind: StatementKind, terminator: Terminator) -> Self {
        let mut handler = IoErrorHandler::new(terminator);
        let state = StatementState::begin(kind, unit.connection.modes);
        unit.statement = state;
        if let Some(direction) = state.direction() {
            if !unit.file.is_open() {
                let form = ConnectionForm {
                    is_formatted: !matches!(kind, StatementKind::Unformatted(_)),
                    ..ConnectionForm::default()
                };
                if let Err(fault) = unit.open_unit(OpenStatus::Unknown, Position::AsIs, None, form) {
                    handler.signal_error(fault);
                }
            }
            let reading = direction == Direction::Input;
            if reading != unit.is_reading {
                let unit = &mut *unit;
                if let Err(fault) = unit.frame.flush(&mut unit.file) {
                    handler.signal_error(fault.into());
                }
                unit.is_reading = reading;
                unit.record_located = false;
            }
        }
        tracing::trace!(unit = unit.unit_number, statement = state.name(), "statement begun");
        Self { unit, handler }
    }

    pub fn unit_number(&self) -> i32 {
        self.unit.unit_number
    }

    /// Record the status specifiers the statement declared
    pub fn enable_handlers(&mut self, flags: HandlerFlags) {
        self.handler.enable_handlers(flags);
    }

    pub fn handler(&self) -> &IoErrorHandler {
        &self.handler
    }

    pub fn statement(&self) -> &StatementState {
        &self.unit.statement
    }

    /// Modes of a formatted statement, else the connection defaults
    pub fn modes(&self) -> MutableModes {
        self.unit
            .statement
            .modes()
            .copied()
            .unwrap_or(self.unit.connection.modes)
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionState {
        &mut self.unit.connection
    }

    /// ADVANCE='NO' for this statement
    pub fn set_non_advancing(&mut self, yes: bool) {
        self.unit.connection.non_advancing = yes;
    }

    /// Change the modes of a formatted READ or WRITE
    pub fn set_modes(&mut self, modes: MutableModes) -> bool {
        let name = self.unit.statement.name();
        match self.unit.statement.modes_mut() {
            Some(current) => {
                *current = modes;
                true
            }
            None => {
                self.handler
                    .signal_error(IoFault::BadKeyword(format!("edit modes given for a {name} statement")));
                false
            }
        }
    }

    /// Connect the unit (OPEN)
    ///
    /// An OPEN with STATUS='OLD' of the file already connected changes
    /// nothing, `form` included; any other OPEN of a connected unit first
    /// flushes and closes the old file, then takes on `form`.
    pub fn open_unit(
        &mut self,
        status: OpenStatus,
        position: Position,
        path: Option<PathBuf>,
        form: ConnectionForm,
    ) -> bool {
        let result = self.unit.open_unit(status, position, path, form);
        self.report(result)
    }

    /// Disconnect the unit (CLOSE)
    ///
    /// The caller removes the unit from the directory afterwards.
    pub fn close_unit(&mut self, status: CloseStatus) -> bool {
        let result = self.unit.close_unit(status);
        self.report(result)
    }

    /// Append bytes to the current output record
    pub fn emit(&mut self, data: &[u8]) -> bool {
        let result = self.unit.emit(data, &mut self.handler);
        self.report(result)
    }

    /// Character at the cursor of the current input record
    pub fn next_char(&mut self) -> Option<char> {
        match self.unit.next_char(&mut self.handler) {
            Ok(ch) => ch,
            Err(fault) => {
                self.handler.signal_error(fault);
                None
            }
        }
    }

    /// Read the next payload bytes of the current unformatted record
    pub fn receive(&mut self, data: &mut [u8]) -> bool {
        let result = self.unit.receive(data, &mut self.handler);
        self.report(result) && self.handler.io_stat() == Iostat::Ok
    }

    /// Finish the current record and move to the next
    pub fn advance_record(&mut self) -> bool {
        let result = self.unit.advance_record(&mut self.handler);
        self.report(result)
    }

    /// Floor T/TL positioning at the furthest position written
    pub fn set_left_tab_limit(&mut self) {
        self.unit.set_left_tab_limit();
    }

    /// Move the cursor to column `n` (0-based) past the left tab limit
    pub fn handle_absolute_position(&mut self, n: i64) -> bool {
        let target = self.unit.connection.tab_floor() as i64 + n;
        let result = self.unit.set_position_in_record(target, &mut self.handler);
        self.report(result)
    }

    /// Move the cursor `n` columns, never left of the left tab limit
    pub fn handle_relative_position(&mut self, n: i64) -> bool {
        let connection = &self.unit.connection;
        let target = (connection.position_in_record as i64 + n).max(connection.tab_floor() as i64);
        let result = self.unit.set_position_in_record(target, &mut self.handler);
        self.report(result)
    }

    /// Position a direct access unit at record `record` (REC=)
    pub fn set_record_number(&mut self, record: u64) -> bool {
        let unit = &mut *self.unit;
        let Some(length) = unit.fixed_record_length() else {
            self.handler
                .signal_error(IoFault::BadKeyword("REC= requires a fixed record length".to_string()));
            return false;
        };
        if unit.connection.access != Access::Direct || record == 0 {
            self.handler
                .signal_error(IoFault::BadKeyword(format!("REC={record} on a unit not open for direct access")));
            return false;
        }
        unit.offset_in_file = (record - 1) * length as u64;
        unit.connection.current_record_number = record;
        unit.connection.begin_record();
        unit.record_located = false;
        true
    }

    /// Push buffered output to the file
    pub fn flush(&mut self) -> bool {
        let result = self.unit.flush();
        self.report(result)
    }

    /// Flush when the unit is connected to a terminal
    pub fn flush_if_terminal(&mut self) {
        if self.unit.file.is_terminal() {
            self.flush();
        }
    }

    /// End the statement and release the unit
    ///
    /// Advancing statements finish their record, as does non-advancing input
    /// that hit the end of its record; non-advancing output sets the left
    /// tab limit so the next statement continues the record.
    ///
    /// # Returns
    /// The status to store into IOSTAT=
    pub fn end_io_statement(mut self) -> Iostat {
        let statement = self.unit.statement;
        if statement.is_data_transfer() {
            let hit_eor = statement.is_input() && self.handler.io_stat() == Iostat::Eor;
            if !self.unit.connection.non_advancing || hit_eor {
                self.advance_record();
            } else if statement.is_output() {
                self.set_left_tab_limit();
            }
            self.flush_if_terminal();
        }
        self.unit.connection.non_advancing = false;
        self.unit.statement = StatementState::Idle;
        let stat = self.handler.io_stat();
        tracing::debug!(unit = self.unit.unit_number, iostat = stat.code(), statement = statement.name(), "statement ended");
        stat
    }

    /// Error handler with its saved message, for IOMSG=
    pub fn io_msg(&self) -> Option<String> {
        self.handler.io_msg()
    }

    fn report(&mut self, result: Result<(), IoFault>) -> bool {
        match result {
            Ok(()) => !self.handler.in_error(),
            Err(fault) => {
                self.handler.signal_error(fault);
                false
            }
        }
    }
}

impl FieldSource for IoStatement {
    fn current_char(&mut self) -> Option<char> {
        self.next_char()
    }

    fn handle_relative_position(&mut self, n: i64) {
        IoStatement::handle_relative_position(self, n);
    }

    fn connection(&self) -> &ConnectionState {
        &self.unit.connection
    }

    fn error_handler(&mut self) -> &mut IoErrorHandler {
        &mut self.handler
    }
}
