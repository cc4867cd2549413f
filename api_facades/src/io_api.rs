//! I/O Statement API
//!
//! Statement-level entry points tying the unit directory, the units and the
//! numeric input converters together. A caller begins a statement on a unit
//! number, transfers items one at a time with the edit descriptors its
//! format supplies, and ends the statement to obtain the IOSTAT= value.

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

use entities_io_operations::{
    Access, CloseStatus, ConnectionForm, DataEdit, Direction, FieldSource, HandlerFlags, IoFault, Iostat,
    MutableModes, OpenStatus, Position, Terminator,
};
use entities_utilities::{ConversionToBinaryResult, DecimalConverter};
use infrastructure_unit_map::{unit_map, UnitMap};
use usecases_io_operations::{ExternalFileUnit, IoStatement, StatementKind};
use usecases_numeric_input::{edit_integer_input, edit_real_input_kind};

/// Specifiers of an OPEN statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenSpecifiers {
    /// FILE=; `fort.<unit>` when absent
    pub file: Option<PathBuf>,
    pub status: OpenStatus,
    pub position: Position,
    pub access: Access,
    /// FORM='UNFORMATTED'
    pub unformatted: bool,
    /// RECL=
    pub record_length: Option<usize>,
}

/// Entry points bound to one unit directory
#[derive(Debug, Clone, Copy)]
pub struct IoApi<'m> {
    map: &'m UnitMap,
}

impl IoApi<'static> {
    /// Entry points over the process-wide directory
    pub fn global() -> Self {
        Self { map: unit_map() }
    }
}

impl<'m> IoApi<'m> {
    pub fn new(map: &'m UnitMap) -> Self {
        Self { map }
    }

    fn begin(&self, unit: i32, kind: StatementKind, terminator: Terminator) -> Statement<'m> {
        let (unit, _) = self.map.look_up_or_create(unit);
        Statement::new(self.map, unit.begin_io_statement(kind, terminator), None)
    }

    /// READ(unit, *)
    pub fn begin_external_list_input(&self, unit: i32, terminator: Terminator) -> Statement<'m> {
        self.begin(unit, StatementKind::ExternalList(Direction::Input), terminator)
    }

    /// WRITE(unit, *)
    pub fn begin_external_list_output(&self, unit: i32, terminator: Terminator) -> Statement<'m> {
        self.begin(unit, StatementKind::ExternalList(Direction::Output), terminator)
    }

    /// READ(unit, fmt)
    pub fn begin_external_formatted_input(&self, unit: i32, terminator: Terminator) -> Statement<'m> {
        self.begin(unit, StatementKind::ExternalFormatted(Direction::Input), terminator)
    }

    /// WRITE(unit, fmt)
    pub fn begin_external_formatted_output(&self, unit: i32, terminator: Terminator) -> Statement<'m> {
        self.begin(unit, StatementKind::ExternalFormatted(Direction::Output), terminator)
    }

    /// READ(unit) without a format
    pub fn begin_unformatted_input(&self, unit: i32, terminator: Terminator) -> Statement<'m> {
        self.begin(unit, StatementKind::Unformatted(Direction::Input), terminator)
    }

    /// WRITE(unit) without a format
    pub fn begin_unformatted_output(&self, unit: i32, terminator: Terminator) -> Statement<'m> {
        self.begin(unit, StatementKind::Unformatted(Direction::Output), terminator)
    }

    /// OPEN(unit, ...)
    pub fn begin_open_unit(&self, unit: i32, terminator: Terminator) -> Statement<'m> {
        self.begin(unit, StatementKind::Open, terminator)
    }

    /// OPEN(NEWUNIT=n, ...)
    ///
    /// # Returns
    /// The new unit number with the OPEN statement begun on it
    pub fn begin_open_new_unit(&self, terminator: Terminator) -> (i32, Statement<'m>) {
        let unit = self.map.new_unit();
        (unit, self.begin_open_unit(unit, terminator))
    }

    /// CLOSE(unit, ...)
    ///
    /// The unit leaves the directory at once; closing a unit that is not
    /// connected does nothing.
    pub fn begin_close(&self, unit: i32, terminator: Terminator) -> Statement<'m> {
        let closing = self
            .map
            .look_up_for_close(unit)
            .unwrap_or_else(|| Arc::new(ExternalFileUnit::new(unit)));
        let io = closing.begin_io_statement(StatementKind::Close, terminator);
        Statement::new(self.map, io, Some(closing))
    }
}

/// Close every unit at program end
pub fn io_shutdown() {
    unit_map().close_all();
}

/// A statement in progress, begun through [`IoApi`]
pub struct Statement<'m> {
    io: IoStatement,
    map: &'m UnitMap,
    closing: Option<Arc<ExternalFileUnit>>,
    close_status: CloseStatus,
    items: usize,
}

impl<'m> Statement<'m> {
    fn new(map: &'m UnitMap, io: IoStatement, closing: Option<Arc<ExternalFileUnit>>) -> Self {
        Self {
            io,
            map,
            closing,
            close_status: CloseStatus::Keep,
            items: 0,
        }
    }

    pub fn unit_number(&self) -> i32 {
        self.io.unit_number()
    }

    /// Declare IOSTAT=, ERR=, END=, EOR= and IOMSG=
    pub fn enable_handlers(&mut self, flags: HandlerFlags) {
        self.io.enable_handlers(flags);
    }

    /// ADVANCE='YES' or 'NO'
    pub fn set_advance(&mut self, advance: bool) {
        self.io.set_non_advancing(!advance);
    }

    /// REC=
    pub fn set_rec(&mut self, record: u64) -> bool {
        self.io.set_record_number(record)
    }

    /// Connect the unit as the specifiers say
    pub fn open(&mut self, spec: &OpenSpecifiers) -> bool {
        let form = ConnectionForm {
            access: spec.access,
            is_formatted: !spec.unformatted,
            record_length: spec.record_length,
        };
        self.io
            .open_unit(spec.status, spec.position, spec.file.clone(), form)
    }

    /// Modes in effect for the statement's items
    ///
    /// Edits built for this statement carry these modes.
    pub fn modes(&self) -> MutableModes {
        self.io.modes()
    }

    /// DECIMAL=, ROUND=, PAD= and BLANK= of a READ or WRITE
    pub fn set_modes(&mut self, modes: MutableModes) -> bool {
        self.io.set_modes(modes)
    }

    /// CLOSE STATUS=
    pub fn set_close_status(&mut self, status: CloseStatus) {
        self.close_status = status;
    }

    fn is_list_input(&self) -> bool {
        let statement = self.io.statement();
        statement.is_list_directed() && statement.is_input()
    }

    /// Position at the start of the next list-directed value
    ///
    /// Consumes the separator after the previous value and moves on to later
    /// records while the current one is exhausted.
    fn begin_list_item(&mut self, modes: &MutableModes) {
        let separator = if modes.decimal_comma { ';' } else { ',' };
        if self.items > 0 {
            self.io.skip_spaces();
            if self.io.current_char() == Some(separator) {
                FieldSource::handle_relative_position(&mut self.io, 1);
            }
        }
        loop {
            self.io.skip_spaces();
            if self.io.current_char().is_some() || self.io.handler().io_stat() != Iostat::Ok {
                break;
            }
            if !self.io.advance_record() {
                break;
            }
        }
    }

    fn input_item<T>(
        &mut self,
        edit: &DataEdit,
        edit_item: impl FnOnce(&mut IoStatement) -> Result<T, IoFault>,
    ) -> Option<T> {
        if !self.io.statement().is_input() {
            self.io
                .handler()
                .terminator()
                .crash(format_args!("input item in a {} statement", self.io.statement().name()));
        }
        if self.io.handler().io_stat() != Iostat::Ok {
            return None;
        }
        if self.is_list_input() {
            self.begin_list_item(&edit.modes);
            if self.io.handler().io_stat() != Iostat::Ok {
                return None;
            }
        }
        self.items += 1;
        match edit_item(&mut self.io) {
            Ok(value) if self.io.handler().io_stat() == Iostat::Ok => Some(value),
            Ok(_) => None,
            Err(fault) => {
                FieldSource::error_handler(&mut self.io).signal_error(fault);
                None
            }
        }
    }

    /// Read an INTEGER item of `kind` bytes
    pub fn input_integer(&mut self, edit: &DataEdit, kind: usize) -> Option<i128> {
        self.input_item(edit, |io| edit_integer_input(io, edit, kind))
    }

    /// Read a REAL item of kind `kind`
    pub fn input_real(&mut self, edit: &DataEdit, kind: usize) -> Option<ConversionToBinaryResult> {
        self.input_item(edit, |io| edit_real_input_kind(io, edit, kind, &DecimalConverter))
    }

    /// Write already formatted characters
    ///
    /// List-directed output puts a blank before each item.
    pub fn output_ascii(&mut self, text: &str) -> bool {
        if self.io.handler().in_error() {
            return false;
        }
        if self.io.statement().is_list_directed() && !self.io.emit(b" ") {
            return false;
        }
        self.items += 1;
        self.io.emit(text.as_bytes())
    }

    /// List-directed INTEGER output
    pub fn output_integer(&mut self, value: i128) -> bool {
        self.output_ascii(&value.to_string())
    }

    /// Write raw bytes into the current unformatted record
    pub fn output_unformatted_block(&mut self, data: &[u8]) -> bool {
        if self.io.handler().in_error() {
            return false;
        }
        self.items += 1;
        self.io.emit(data)
    }

    /// Read raw bytes from the current unformatted record
    pub fn input_unformatted_block(&mut self, data: &mut [u8]) -> bool {
        if self.io.handler().io_stat() != Iostat::Ok {
            return false;
        }
        self.items += 1;
        self.io.receive(data)
    }

    /// Copy the message for the statement's status into an IOMSG= variable
    pub fn get_io_msg(&self, buffer: &mut [u8]) -> bool {
        self.io.handler().get_io_msg(buffer)
    }

    /// End the statement
    ///
    /// # Returns
    /// The IOSTAT= value
    pub fn end_io_statement(mut self) -> Iostat {
        if let Some(closing) = self.closing.take() {
            self.io.close_unit(self.close_status);
            let stat = self.io.end_io_statement();
            self.map.destroy_closed(&closing);
            return stat;
        }
        self.io.end_io_statement()
    }
}
