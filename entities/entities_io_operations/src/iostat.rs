//! I/O Status Codes
//!
//! Values stored into an IOSTAT= variable. Zero is success, the two negative
//! sentinels are end-of-file and end-of-record, operating-system failures
//! carry their errno, and runtime-detected errors start at 1000.

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

/// Status of an I/O statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Iostat {
    /// No condition
    #[default]
    Ok,
    /// End of file (-1)
    End,
    /// End of record during non-advancing input (-2)
    Eor,
    /// Unclassified runtime error (1000)
    GenericError,
    /// Edit descriptor or field contents do not fit the data item (1001)
    ErrorInFormat,
    /// Output past a fixed record length (1002)
    RecordWriteOverrun,
    /// Input past a fixed record length with PAD='NO' (1003)
    RecordReadOverrun,
    /// Internal WRITE past the last record (1004)
    InternalWriteOverrun,
    /// Bad keyword argument value (1005)
    ErrorInKeyword,
    /// Corrupt unformatted sequential record (1006)
    BadUnformattedRecord,
    /// FLUSH on a unit that cannot be flushed (1007)
    Unflushable,
    /// Non-numeric REAL input field (1008)
    BadRealInput,
    /// Operating system error number
    Os(i32),
}

impl Iostat {
    /// First runtime-specific error code
    pub const RUNTIME_BASE: i32 = 1000;

    /// Integer value stored into IOSTAT=
    pub fn code(self) -> i32 {
        match self {
            Iostat::Ok => 0,
            Iostat::End => -1,
            Iostat::Eor => -2,
            Iostat::GenericError => 1000,
            Iostat::ErrorInFormat => 1001,
            Iostat::RecordWriteOverrun => 1002,
            Iostat::RecordReadOverrun => 1003,
            Iostat::InternalWriteOverrun => 1004,
            Iostat::ErrorInKeyword => 1005,
            Iostat::BadUnformattedRecord => 1006,
            Iostat::Unflushable => 1007,
            Iostat::BadRealInput => 1008,
            Iostat::Os(errno) => errno,
        }
    }

    /// Decode an IOSTAT= value
    ///
    /// Positive values below 1000 are taken as errno values.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Iostat::Ok,
            -1 => Iostat::End,
            -2 => Iostat::Eor,
            1000 => Iostat::GenericError,
            1001 => Iostat::ErrorInFormat,
            1002 => Iostat::RecordWriteOverrun,
            1003 => Iostat::RecordReadOverrun,
            1004 => Iostat::InternalWriteOverrun,
            1005 => Iostat::ErrorInKeyword,
            1006 => Iostat::BadUnformattedRecord,
            1007 => Iostat::Unflushable,
            1008 => Iostat::BadRealInput,
            other => Iostat::Os(other),
        }
    }

    /// Check whether the status is an error (as opposed to OK, END or EOR)
    pub fn is_error(self) -> bool {
        !matches!(self, Iostat::Ok | Iostat::End | Iostat::Eor)
    }

    /// Rank used to decide which condition a statement reports
    ///
    /// Errors outrank END, which outranks EOR, which outranks OK.
    pub fn priority(self) -> u8 {
        match self {
            Iostat::Ok => 0,
            Iostat::Eor => 1,
            Iostat::End => 2,
            _ => 3,
        }
    }

    /// Fixed message for the status, if it has one
    pub fn canned_message(self) -> Option<&'static str> {
        match self {
            Iostat::End => Some("End of file during input"),
            Iostat::Eor => Some("End of record during non-advancing input"),
            Iostat::Unflushable => Some("FLUSH not possible"),
            Iostat::RecordWriteOverrun => Some("Excessive output to fixed-size record"),
            Iostat::RecordReadOverrun => Some("Excessive input from fixed-size record"),
            Iostat::InternalWriteOverrun => Some("Internal write overran available records"),
            Iostat::ErrorInKeyword => Some("Bad keyword argument value"),
            Iostat::ErrorInFormat => Some("Bad data edit for input item"),
            Iostat::BadUnformattedRecord => Some("Corrupt unformatted record"),
            Iostat::BadRealInput => Some("Bad REAL input value"),
            Iostat::GenericError => Some("I/O error"),
            Iostat::Ok | Iostat::Os(_) => None,
        }
    }

    /// Message for the status: the canned text, or the OS description of an errno
    pub fn message(self) -> Option<String> {
        match self {
            Iostat::Os(errno) => Some(std::io::Error::from_raw_os_error(errno).to_string()),
            other => other.canned_message().map(str::to_string),
        }
    }
}
