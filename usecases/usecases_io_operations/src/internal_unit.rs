//! Internal Unit
//!
//! READ and WRITE on a character variable or array. Each element is one
//! fixed-length record; there is no file, lock or framing.

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

use entities_io_operations::{
    ConnectionState, FieldSource, HandlerFlags, IoErrorHandler, IoFault, Iostat, Terminator,
};

enum Records<'a> {
    Input(&'a [u8]),
    Output(&'a mut [u8]),
}

/// A character buffer used as a unit for one statement
pub struct InternalUnit<'a> {
    records: Records<'a>,
    connection: ConnectionState,
    handler: IoErrorHandler,
}

impl<'a> InternalUnit<'a> {
    /// Read from `buffer`, `record_length` bytes per record
    pub fn for_input(buffer: &'a [u8], record_length: usize, terminator: Terminator) -> Self {
        let connection = internal_connection(buffer.len(), record_length);
        Self {
            records: Records::Input(buffer),
            connection,
            handler: IoErrorHandler::new(terminator),
        }
    }

    /// Write into `buffer`, `record_length` bytes per record
    pub fn for_output(buffer: &'a mut [u8], record_length: usize, terminator: Terminator) -> Self {
        let connection = internal_connection(buffer.len(), record_length);
        Self {
            records: Records::Output(buffer),
            connection,
            handler: IoErrorHandler::new(terminator),
        }
    }

    pub fn enable_handlers(&mut self, flags: HandlerFlags) {
        self.handler.enable_handlers(flags);
    }

    pub fn io_msg(&self) -> Option<String> {
        self.handler.io_msg()
    }

    fn record_length(&self) -> usize {
        self.connection.record_length.unwrap_or(0)
    }

    /// Byte range of the current record, `None` past the last one
    fn current_record(&self) -> Option<std::ops::Range<usize>> {
        if self.connection.is_at_eof() {
            return None;
        }
        let length = self.record_length();
        let start = (self.connection.current_record_number as usize - 1) * length;
        Some(start..start + length)
    }

    /// Append bytes to the current record
    pub fn emit(&mut self, data: &[u8]) -> bool {
        let position = self.connection.position_in_record;
        let record = self.current_record();
        let Records::Output(buffer) = &mut self.records else {
            self.handler.crash("Emit() called for an internal input unit");
        };
        let Some(record) = record.filter(|record| position + data.len() <= record.len()) else {
            self.handler.signal_error(IoFault::InternalWriteOverrun);
            return false;
        };
        let start = record.start + position;
        let furthest = self.connection.furthest_position_in_record;
        if position > furthest {
            buffer[record.start + furthest..start].fill(b' ');
        }
        buffer[start..start + data.len()].copy_from_slice(data);
        self.connection.position_in_record = position + data.len();
        self.connection.furthest_position_in_record = furthest.max(self.connection.position_in_record);
        true
    }

    /// Finish the current record and move to the next
    pub fn advance_record(&mut self) -> bool {
        if self.connection.is_at_eof() {
            if matches!(self.records, Records::Input(_)) {
                self.handler.signal_end();
            } else {
                self.handler.signal_error(IoFault::InternalWriteOverrun);
            }
            return false;
        }
        self.blank_fill();
        self.connection.current_record_number += 1;
        self.connection.begin_record();
        true
    }

    /// Move the cursor to column `n` past the left tab limit
    pub fn handle_absolute_position(&mut self, n: i64) {
        let target = self.connection.tab_floor() as i64 + n;
        self.set_position(target);
    }

    /// Move the cursor `n` columns, never left of the left tab limit
    pub fn handle_relative_position(&mut self, n: i64) {
        let target = (self.connection.position_in_record as i64 + n).max(self.connection.tab_floor() as i64);
        self.set_position(target);
    }

    fn set_position(&mut self, target: i64) {
        let target = target.max(0) as usize;
        let limit = self.record_length();
        if target > limit {
            self.connection.position_in_record = limit;
            self.handler.signal_error(match self.records {
                Records::Input(_) => IoFault::RecordReadOverrun,
                Records::Output(_) => IoFault::InternalWriteOverrun,
            });
        } else {
            self.connection.position_in_record = target;
        }
    }

    fn blank_fill(&mut self) {
        let furthest = self.connection.furthest_position_in_record;
        let record = self.current_record();
        if let (Records::Output(buffer), Some(record)) = (&mut self.records, record) {
            buffer[record.start + furthest..record.end].fill(b' ');
        }
    }

    /// End the statement, blank filling the last record written
    pub fn end_io_statement(mut self) -> Iostat {
        self.blank_fill();
        self.handler.io_stat()
    }
}

fn internal_connection(buffer_len: usize, record_length: usize) -> ConnectionState {
    let records = buffer_len.checked_div(record_length).unwrap_or(0);
    ConnectionState {
        is_fixed_record_length: true,
        record_length: Some(record_length),
        end_file_record_number: Some(records as u64 + 1),
        ..ConnectionState::default()
    }
}

impl FieldSource for InternalUnit<'_> {
    fn current_char(&mut self) -> Option<char> {
        let Some(record) = self.current_record() else {
            self.handler.signal_end();
            return None;
        };
        let position = self.connection.position_in_record;
        match &self.records {
            Records::Input(buffer) if position < record.len() => {
                Some(char::from(buffer[record.start + position]))
            }
            Records::Input(_) => None,
            Records::Output(_) => self.handler.crash("NextChar() called for an internal output unit"),
        }
    }

    fn handle_relative_position(&mut self, n: i64) {
        InternalUnit::handle_relative_position(self, n);
    }

    fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    fn error_handler(&mut self) -> &mut IoErrorHandler {
        &mut self.handler
    }
}
