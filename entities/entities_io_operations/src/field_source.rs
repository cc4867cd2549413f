//! Field Character Source
//!
//! The view of an input statement that field editing needs: the character at
//! the cursor, cursor movement, the connection, and the status handler.
//! External units, internal units and in-memory test sources all implement
//! it, so numeric conversion never knows which kind of unit it reads.

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

use crate::connection::ConnectionState;
use crate::data_edit::MutableModes;
use crate::error_handler::{IoErrorHandler, IoFault};

/// Characters that end a list-directed field
///
/// With DECIMAL='COMMA' the comma is the decimal symbol and `;` separates.
pub fn is_list_separator(ch: char, decimal_comma: bool) -> bool {
    match ch {
        ' ' | '\t' | '/' | '(' | ')' | '\'' | '"' | '*' | '\n' => true,
        ',' => !decimal_comma,
        ';' => decimal_comma,
        _ => false,
    }
}

/// Character-level input of a data transfer statement
pub trait FieldSource {
    /// Character at the cursor without consuming it
    ///
    /// `None` at the end of the record or file.
    fn current_char(&mut self) -> Option<char>;

    /// Move the cursor `n` characters forward (or back, when negative)
    fn handle_relative_position(&mut self, n: i64);

    /// Connection state of the unit
    fn connection(&self) -> &ConnectionState;

    /// Status handler of the statement
    fn error_handler(&mut self) -> &mut IoErrorHandler;

    /// Next character of the current field
    ///
    /// With `remaining` set, at most that many characters are taken and the
    /// budget is decremented. Without it the field is list-directed and ends
    /// at a separator, which is left unconsumed.
    ///
    /// A fixed-length record that ends inside a field supplies blanks when
    /// PAD='YES'; otherwise non-advancing input reports EOR and advancing
    /// input faults with `RecordReadOverrun`. DECIMAL= and PAD= come from
    /// `modes`, the modes of the edit being applied.
    fn next_in_field(
        &mut self,
        remaining: &mut Option<usize>,
        modes: &MutableModes,
    ) -> Result<Option<char>, IoFault> {
        match remaining {
            None => {
                match self.current_char() {
                    Some(ch) if !is_list_separator(ch, modes.decimal_comma) => {
                        self.handle_relative_position(1);
                        Ok(Some(ch))
                    }
                    _ => Ok(None),
                }
            }
            Some(0) => Ok(None),
            Some(left) => {
                if let Some(ch) = self.current_char() {
                    *left -= 1;
                    self.handle_relative_position(1);
                    return Ok(Some(ch));
                }
                let connection = self.connection();
                let past_fixed_record = !connection.is_at_eof()
                    && connection.is_fixed_record_length
                    && connection
                        .record_length
                        .is_some_and(|length| connection.position_in_record >= length);
                if !past_fixed_record {
                    return Ok(None);
                }
                if modes.pad {
                    *left -= 1;
                    Ok(Some(' '))
                } else if connection.non_advancing {
                    self.error_handler().signal_eor();
                    Ok(None)
                } else {
                    Err(IoFault::RecordReadOverrun)
                }
            }
        }
    }

    /// Skip blanks at the cursor (list-directed field starts)
    fn skip_spaces(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch != ' ' && ch != '\t' {
                break;
            }
            self.handle_relative_position(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::{HandlerFlags, Terminator};
    use crate::iostat::Iostat;

    struct Record {
        chars: Vec<char>,
        connection: ConnectionState,
        handler: IoErrorHandler,
    }

    impl Record {
        fn new(text: &str, fixed: bool) -> Self {
            let mut handler = IoErrorHandler::new(Terminator::default());
            handler.enable_handlers(HandlerFlags::IOSTAT);
            Self {
                chars: text.chars().collect(),
                connection: ConnectionState {
                    is_fixed_record_length: fixed,
                    record_length: Some(text.chars().count()),
                    ..ConnectionState::default()
                },
                handler,
            }
        }
    }

    impl FieldSource for Record {
        fn current_char(&mut self) -> Option<char> {
            self.chars.get(self.connection.position_in_record).copied()
        }

        fn handle_relative_position(&mut self, n: i64) {
            let position = self.connection.position_in_record as i64 + n;
            self.connection.position_in_record = position.max(0) as usize;
        }

        fn connection(&self) -> &ConnectionState {
            &self.connection
        }

        fn error_handler(&mut self) -> &mut IoErrorHandler {
            &mut self.handler
        }
    }

    #[test]
    fn test_list_directed_stops_at_separator() {
        let modes = MutableModes::default();
        let mut record = Record::new("12,3", false);
        let mut remaining = None;
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(Some('1')));
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(Some('2')));
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(None));
        assert_eq!(record.current_char(), Some(','));
    }

    #[test]
    fn test_semicolon_separates_only_in_comma_mode() {
        assert!(!is_list_separator(';', false));
        assert!(is_list_separator(';', true));
        assert!(is_list_separator(',', false));
        assert!(!is_list_separator(',', true));
    }

    #[test]
    fn test_decimal_comma_stays_in_field() {
        let modes = MutableModes {
            decimal_comma: true,
            ..MutableModes::default()
        };
        let mut record = Record::new("2,5;7", false);
        let mut remaining = None;
        let mut field = String::new();
        while let Some(ch) = record.next_in_field(&mut remaining, &modes).unwrap() {
            field.push(ch);
        }
        assert_eq!(field, "2,5");
        assert_eq!(record.current_char(), Some(';'));
    }

    #[test]
    fn test_width_budget() {
        let modes = MutableModes::default();
        let mut record = Record::new("12345", false);
        let mut remaining = Some(2);
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(Some('1')));
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(Some('2')));
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(None));
        assert_eq!(remaining, Some(0));
    }

    #[test]
    fn test_fixed_record_pads_with_blanks() {
        let modes = MutableModes::default();
        let mut record = Record::new("7", true);
        let mut remaining = Some(3);
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(Some('7')));
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(Some(' ')));
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(Some(' ')));
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(None));
    }

    #[test]
    fn test_fixed_record_without_pad() {
        let modes = MutableModes {
            pad: false,
            ..MutableModes::default()
        };
        let mut record = Record::new("7", true);
        let mut remaining = Some(3);
        record.next_in_field(&mut remaining, &modes).unwrap();
        assert_eq!(
            record.next_in_field(&mut remaining, &modes),
            Err(IoFault::RecordReadOverrun)
        );

        let mut record = Record::new("7", true);
        record.connection.non_advancing = true;
        let mut remaining = Some(3);
        record.next_in_field(&mut remaining, &modes).unwrap();
        assert_eq!(record.next_in_field(&mut remaining, &modes), Ok(None));
        assert_eq!(record.handler.io_stat(), Iostat::Eor);
    }
}
