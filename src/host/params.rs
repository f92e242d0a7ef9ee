//! Entry point parameter conversion
//!
//! Hosts start scripts with untyped string parameters. They are converted
//! by the entry point's declared parameter types, C-library style: numbers
//! are read from the longest valid prefix, and a missing parameter reads as
//! the empty string.

use crate::bridge::action::ActionType;
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::value::{ObjectId, Operand};

/// Convert `params` according to `types`.
pub fn convert_parameters(
    types: &[ActionType],
    params: &[&str],
    invalid_object: ObjectId,
) -> BridgeResult<Vec<Operand>> {
    types
        .iter()
        .enumerate()
        .map(|(index, ty)| {
            let text = params.get(index).copied().unwrap_or("");
            match ty {
                // Unused parameters default to integers.
                ActionType::Int | ActionType::Void => Ok(Operand::Int(parse_int(text))),
                ActionType::Float => Ok(Operand::Float(parse_float(text))),
                ActionType::String => Ok(Operand::String(text.to_string())),
                ActionType::Object => Ok(Operand::Object(parse_object(text, invalid_object))),
                other => Err(BridgeError::IllegalEntryParameter { index, ty: *other }),
            }
        })
        .collect()
}

/// Leading integer of `text`, saturating; 0 when there is none.
pub fn parse_int(text: &str) -> i32 {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Leading decimal float of `text`; 0.0 when there is none.
pub fn parse_float(text: &str) -> f32 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end = 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-' | b'+')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}

/// Decimal object id read as an unsigned 64-bit number and truncated to 32
/// bits.
///
/// Leading whitespace and a sign are accepted; a negative value wraps and an
/// overflowing one saturates. Empty text is object 0. Text with no digits or
/// with anything after the digits is `invalid`.
pub fn parse_object(
    text: &str,
    invalid: ObjectId,
) -> ObjectId {
    if text.is_empty() {
        return ObjectId(0);
    }

    let s = text.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 || len < digits.len() {
        return invalid;
    }

    let mut overflow = false;
    let mut value: u64 = 0;
    for b in digits.bytes() {
        match value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(b - b'0')))
        {
            Some(v) => value = v,
            None => {
                overflow = true;
                break;
            }
        }
    }

    let raw = match (overflow, negative) {
        (true, _) => u64::MAX,
        (false, true) => value.wrapping_neg(),
        (false, false) => value,
    };
    ObjectId(raw as u32)
}
