//! Integration tests for usecases_numeric_input crate
//!
//! These tests drive INTEGER and REAL editing through a whole record.

use entities_io_operations::{
    ConnectionState, DataEdit, EditKind, FieldSource, HandlerFlags, IoErrorHandler, Iostat,
    Terminator,
};
use entities_utilities::{BinaryPrecision, ConversionFlags, DecimalConverter};
use proptest::prelude::*;
use usecases_numeric_input::*;

struct Line {
    chars: Vec<char>,
    connection: ConnectionState,
    handler: IoErrorHandler,
}

impl Line {
    fn new(text: &str) -> Self {
        let mut handler = IoErrorHandler::new(Terminator::new(Some("input.f90"), 1));
        handler.enable_handlers(HandlerFlags::IOSTAT);
        Self {
            chars: text.chars().collect(),
            connection: ConnectionState::default(),
            handler,
        }
    }
}

impl FieldSource for Line {
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
fn test_list_directed_record_integration() {
    let mut line = Line::new("12, -3.5e1 ,7");
    let edit = DataEdit::list_directed();
    assert_eq!(edit_integer_input(&mut line, &edit, 4), Ok(12));
    line.handle_relative_position(1);
    let value = edit_real_input(&mut line, &edit, BinaryPrecision::Double, &DecimalConverter).unwrap();
    assert_eq!(value.binary.to_f64(), Some(-35.0));
    line.skip_spaces();
    line.handle_relative_position(1);
    assert_eq!(edit_integer_input(&mut line, &edit, 8), Ok(7));
    assert_eq!(line.handler.io_stat(), Iostat::Ok);
}

#[test]
fn test_fixed_fields_integration() {
    let mut line = Line::new("  1234 5.5e0FF");
    assert_eq!(
        edit_integer_input(&mut line, &DataEdit::new(EditKind::I, Some(6), None), 2),
        Ok(1234)
    );
    let value = edit_real_input(
        &mut line,
        &DataEdit::new(EditKind::E, Some(6), Some(1)),
        BinaryPrecision::Single,
        &DecimalConverter,
    )
    .unwrap();
    assert_eq!(value.binary.to_f32(), Some(5.5));
    assert_eq!(
        edit_integer_input(&mut line, &DataEdit::new(EditKind::Z, Some(2), None), 1),
        Ok(-1)
    );
}

#[test]
fn test_real_round_trip_flags_integration() {
    let mut line = Line::new("0.1");
    let value = edit_real_input(
        &mut line,
        &DataEdit::list_directed(),
        BinaryPrecision::Single,
        &DecimalConverter,
    )
    .unwrap();
    assert_eq!(value.binary.to_f32(), Some(0.1));
    assert!(value.flags.contains(ConversionFlags::INEXACT));
}

fn radix_text(mut value: u128, base: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let digit = (value % u128::from(base)) as u32;
        digits.push(std::char::from_digit(digit, base).unwrap_or('0').to_ascii_uppercase());
        value /= u128::from(base);
    }
    digits.iter().rev().collect()
}

proptest! {
    #[test]
    fn prop_integer_digit_string_law(value in any::<u64>(), base_index in 0usize..4, negative in any::<bool>()) {
        let (kind, base) = [(EditKind::B, 2), (EditKind::O, 8), (EditKind::I, 10), (EditKind::Z, 16)][base_index];
        let body = radix_text(u128::from(value), base);
        let text = if negative { format!("-{body}") } else { body };
        let mut line = Line::new(&text);
        let edit = DataEdit::new(kind, Some(text.len()), None);
        let expected = if negative { (value as i64).wrapping_neg() } else { value as i64 };
        prop_assert_eq!(edit_integer_input(&mut line, &edit, 8), Ok(i128::from(expected)));
    }

    #[test]
    fn prop_kind_truncation(value in any::<i64>()) {
        let text = value.to_string();
        for kind in [1usize, 2, 4, 8] {
            let mut line = Line::new(&text);
            let stored = edit_integer_input(&mut line, &DataEdit::list_directed(), kind).unwrap();
            let expected = match kind {
                1 => i128::from(value as i8),
                2 => i128::from(value as i16),
                4 => i128::from(value as i32),
                _ => i128::from(value),
            };
            prop_assert_eq!(stored, expected);
        }
    }

    #[test]
    fn prop_real_round_trip(value in proptest::num::f64::NORMAL) {
        let text = format!("{value:e}");
        let mut line = Line::new(&text);
        let converted = edit_real_input(&mut line, &DataEdit::list_directed(), BinaryPrecision::Double, &DecimalConverter).unwrap();
        prop_assert_eq!(converted.binary.to_f64().map(f64::to_bits), Some(value.to_bits()));
    }
}
