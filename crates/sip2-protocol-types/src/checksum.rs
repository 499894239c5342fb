//! SIP2 error detection: `AY` sequence number and `AZ` checksum.
//!
//! The checksum is the two's complement of the 16-bit sum of every byte up
//! to and including the `AZ` identifier, written as four uppercase hex
//! digits.

use crate::{ParseError, ParseResult};

const CHECKSUM_WIDTH: usize = 4;

/// A frame with its error-detection trailer removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDetection<'a> {
    /// Message without `AY`/`AZ`.
    pub body: &'a str,
    /// Sequence number echoed back to the terminal, if it sent one.
    pub sequence_number: Option<char>,
    /// Whether the frame carried a checksum at all.
    pub checksummed: bool,
}

/// Compute the checksum for everything preceding it.
pub fn compute_checksum(message: &str) -> String {
    let sum = message
        .bytes()
        .fold(0u16, |acc, byte| acc.wrapping_add(u16::from(byte)));
    format!("{:04X}", (!sum).wrapping_add(1))
}

/// Append `AY<sequence>AZ<checksum>` to an outgoing message.
pub fn append_error_detection(message: &str, sequence_number: char) -> String {
    let mut out = String::with_capacity(message.len() + 9);
    out.push_str(message);
    out.push_str("AY");
    out.push(sequence_number);
    out.push_str("AZ");
    let checksum = compute_checksum(&out);
    out.push_str(&checksum);
    out
}

/// Strip and verify the error-detection trailer of an incoming frame.
///
/// Frames without a trailer are passed through untouched.
pub fn split_error_detection(frame: &str) -> ParseResult<ErrorDetection<'_>> {
    let Some(checksum_start) = frame.len().checked_sub(CHECKSUM_WIDTH) else {
        return Ok(untouched(frame));
    };
    let marker_start = checksum_start.saturating_sub(2);
    if checksum_start < 2 || frame.get(marker_start..checksum_start) != Some("AZ") {
        return Ok(untouched(frame));
    }

    let received = &frame[checksum_start..];
    let expected = compute_checksum(&frame[..checksum_start]);
    if !received.eq_ignore_ascii_case(&expected) {
        return Err(ParseError::ChecksumMismatch {
            expected,
            received: received.to_string(),
        });
    }

    let before_checksum = &frame[..marker_start];
    let sequence = before_checksum
        .len()
        .checked_sub(3)
        .and_then(|start| before_checksum.get(start..))
        .filter(|tail| tail.starts_with("AY"))
        .and_then(|tail| tail.chars().nth(2));

    let body = match sequence {
        Some(_) => &before_checksum[..before_checksum.len() - 3],
        None => before_checksum,
    };

    Ok(ErrorDetection {
        body,
        sequence_number: sequence,
        checksummed: true,
    })
}

fn untouched(frame: &str) -> ErrorDetection<'_> {
    ErrorDetection {
        body: frame,
        sequence_number: None,
        checksummed: false,
    }
}
