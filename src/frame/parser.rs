//! # Telemetry Line Parser
//!
//! Decodes one raw line from the transport into a typed reading, a
//! pass-through line, or a rejection.

use super::protocol::{DecodedLine, Reading, FRAME_MARKER, FRAME_VALUE_COUNT};
use crate::error::{PidScopeError, Result};

/// Decode a single raw line.
///
/// # Arguments
///
/// * `line` - Raw bytes as read from the transport, terminator included.
///   An empty slice (read timeout) is valid input.
/// * `gain_scale` - Divisor applied to the three gain fields. The default
///   firmware transmits raw values (scale 1); the legacy variant transmits
///   gains pre-scaled ×10.
///
/// # Returns
///
/// * `DecodedLine::Reading` - marker matched and all five values decoded
/// * `DecodedLine::Passthrough` - the line does not carry the telemetry
///   marker; the original bytes are returned for diagnostic logging
///
/// # Errors
///
/// Returns [`PidScopeError::MalformedFrame`] if the marker matched but a
/// numeric field is missing or fails to parse as a base-10 integer. Callers
/// are expected to skip such lines, not abort.
///
/// # Examples
///
/// ```
/// use pid_scope::frame::{decode_line, DecodedLine};
///
/// match decode_line(b"DB 40 38 50 10 5", 1).unwrap() {
///     DecodedLine::Reading(r) => assert_eq!(r.error, 2),
///     DecodedLine::Passthrough(_) => unreachable!(),
/// }
/// ```
pub fn decode_line(line: &[u8], gain_scale: u32) -> Result<DecodedLine> {
    // The firmware terminates lines "\n\r", so the reader hands us lines
    // with a stray leading '\r'; trim both ends before splitting.
    let trimmed = line.trim_ascii();

    // Doubled spaces produce empty fields; drop them.
    let mut fields = trimmed.split(|&b| b == b' ').filter(|f| !f.is_empty());

    match fields.next() {
        Some(marker) if marker == FRAME_MARKER => {}
        _ => return Ok(DecodedLine::Passthrough(line.to_vec())),
    }

    let mut values = [0i64; FRAME_VALUE_COUNT];
    for (index, slot) in values.iter_mut().enumerate() {
        let field = fields.next().ok_or_else(|| {
            PidScopeError::MalformedFrame(format!(
                "expected {} values, line ended after {}",
                FRAME_VALUE_COUNT, index
            ))
        })?;
        *slot = decode_value(field, index)?;
    }
    // Fields past the fifth value are ignored.

    let scale = f64::from(gain_scale.max(1));
    let [setpoint, actual, kp, ki, kd] = values;

    Ok(DecodedLine::Reading(Reading::new(
        setpoint,
        actual,
        kp as f64 / scale,
        ki as f64 / scale,
        kd as f64 / scale,
    )))
}

/// Decode one numeric field as a base-10 integer.
fn decode_value(field: &[u8], index: usize) -> Result<i64> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            PidScopeError::MalformedFrame(format!(
                "value {} is not a base-10 integer: {:?}",
                index + 1,
                String::from_utf8_lossy(field)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(line: &[u8], scale: u32) -> Reading {
        match decode_line(line, scale).unwrap() {
            DecodedLine::Reading(r) => r,
            other => panic!("expected a reading, got: {:?}", other),
        }
    }

    #[test]
    fn test_decode_valid_frame() {
        let r = reading(b"DB 40 38 50 10 5", 1);
        assert_eq!(r.setpoint, 40);
        assert_eq!(r.actual, 38);
        assert_eq!(r.error, 2);
        assert_eq!(r.kp, 50.0);
        assert_eq!(r.ki, 10.0);
        assert_eq!(r.kd, 5.0);
    }

    #[test]
    fn test_decode_error_is_signed() {
        let r = reading(b"DB 38 40 50 10 5", 1);
        assert_eq!(r.error, -2);
    }

    #[test]
    fn test_decode_negative_values() {
        let r = reading(b"DB -5 10 1 2 3", 1);
        assert_eq!(r.setpoint, -5);
        assert_eq!(r.error, -15);
    }

    #[test]
    fn test_decode_gain_scale_ten() {
        let r = reading(b"DB 40 38 50 10 5", 10);
        assert_eq!(r.kp, 5.0);
        assert_eq!(r.ki, 1.0);
        assert_eq!(r.kd, 0.5);
        // Process values are never scaled
        assert_eq!(r.setpoint, 40);
        assert_eq!(r.actual, 38);
    }

    #[test]
    fn test_decode_trims_line_terminators() {
        // "\n\r" ordering from the firmware leaves a '\r' at the front of
        // the next read; both framings must decode.
        let r = reading(b"DB 40 38 50 10 5\r\n", 1);
        assert_eq!(r.setpoint, 40);

        let r = reading(b"\rDB 40 38 50 10 5\n", 1);
        assert_eq!(r.setpoint, 40);
    }

    #[test]
    fn test_decode_tolerates_repeated_spaces() {
        let r = reading(b"DB  40 38  50 10 5", 1);
        assert_eq!(r.setpoint, 40);
        assert_eq!(r.kp, 50.0);
    }

    #[test]
    fn test_decode_extra_fields_ignored() {
        let r = reading(b"DB 40 38 50 10 5 99 100", 1);
        assert_eq!(r.kd, 5.0);
    }

    #[test]
    fn test_boot_message_is_passthrough() {
        let line = b"PID Motor Controller System Starting";
        match decode_line(line, 1).unwrap() {
            DecodedLine::Passthrough(bytes) => assert_eq!(bytes, line.to_vec()),
            other => panic!("expected passthrough, got: {:?}", other),
        }
    }

    #[test]
    fn test_empty_line_is_passthrough() {
        // A transport read timeout yields an empty line
        match decode_line(b"", 1).unwrap() {
            DecodedLine::Passthrough(bytes) => assert!(bytes.is_empty()),
            other => panic!("expected passthrough, got: {:?}", other),
        }
    }

    #[test]
    fn test_passthrough_keeps_original_bytes() {
        let line = b"  spaced out\r\n";
        match decode_line(line, 1).unwrap() {
            DecodedLine::Passthrough(bytes) => assert_eq!(bytes, line.to_vec()),
            other => panic!("expected passthrough, got: {:?}", other),
        }
    }

    #[test]
    fn test_marker_must_match_exactly() {
        // A prefix match is not a marker match
        assert!(matches!(
            decode_line(b"DBX 40 38 50 10 5", 1).unwrap(),
            DecodedLine::Passthrough(_)
        ));
        // The marker is case-sensitive
        assert!(matches!(
            decode_line(b"db 40 38 50 10 5", 1).unwrap(),
            DecodedLine::Passthrough(_)
        ));
    }

    #[test]
    fn test_non_utf8_garbage_is_passthrough() {
        let line = [0xFFu8, 0xFE, b' ', b'b', b'o', b'o', b't'];
        assert!(matches!(
            decode_line(&line, 1).unwrap(),
            DecodedLine::Passthrough(_)
        ));
    }

    #[test]
    fn test_decode_missing_fields() {
        let result = decode_line(b"DB 40 38", 1);
        assert!(matches!(result, Err(PidScopeError::MalformedFrame(_))));
    }

    #[test]
    fn test_decode_marker_only() {
        let result = decode_line(b"DB", 1);
        assert!(matches!(result, Err(PidScopeError::MalformedFrame(_))));
    }

    #[test]
    fn test_decode_non_numeric_field() {
        let result = decode_line(b"DB 40 abc 50 10 5", 1);
        assert!(matches!(result, Err(PidScopeError::MalformedFrame(_))));
    }

    #[test]
    fn test_decode_non_utf8_field() {
        let line = [b'D', b'B', b' ', b'4', b'0', b' ', 0xFF, b' ', b'5', b'0', b' ', b'1', b' ', b'2'];
        let result = decode_line(&line, 1);
        assert!(matches!(result, Err(PidScopeError::MalformedFrame(_))));
    }

    #[test]
    fn test_decode_overflowing_value() {
        let result = decode_line(b"DB 99999999999999999999999999 38 50 10 5", 1);
        assert!(matches!(result, Err(PidScopeError::MalformedFrame(_))));
    }
}
