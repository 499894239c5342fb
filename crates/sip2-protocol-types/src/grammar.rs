//! Field grammar shared by every SIP2 command.
//!
//! SIP2 messages are a run of fixed-width fields followed by variable-length
//! fields of the form `<code><value><delimiter>`. Every primitive here takes a
//! [`Cursor`] by value and returns the decoded value together with the
//! advanced cursor, so a parse is a pure function of the message text and
//! can run concurrently for any number of connections.

use crate::{Field, ParseError, ParseResult};
use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc,
};
use chrono_tz::Tz;

/// Width of the `yyyyMMddZZZZHHmmss` date/time field.
pub const DATE_TIME_WIDTH: usize = 18;

/// Width of a field identifier.
pub const FIELD_IDENTIFIER_WIDTH: usize = 2;

const WIRE_DATE_TIME_FORMAT: &str = "%Y%m%d    %H%M%S";

/// No timezone skips more than this much wall-clock time in one transition.
const MAX_GAP_HOURS: i64 = 2;

/// Per-session wire settings needed to decode and encode messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFormat {
    /// Character terminating every variable-length field.
    pub field_delimiter: char,
    /// Timezone used for dates that carry no zone of their own.
    pub timezone: Tz,
}

impl WireFormat {
    pub fn new(field_delimiter: char, timezone: Tz) -> Self {
        Self {
            field_delimiter,
            timezone,
        }
    }
}

impl Default for WireFormat {
    fn default() -> Self {
        Self::new('|', Tz::UTC)
    }
}

/// Read position within one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    message: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Start reading at the beginning of `message`.
    pub fn new(message: &'a str) -> Self {
        Self {
            message,
            position: 0,
        }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Unread part of the message.
    pub fn remaining(&self) -> &'a str {
        &self.message[self.position..]
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.message.len()
    }

    /// Take exactly `width` characters.
    fn take(self, width: usize) -> ParseResult<(&'a str, Self)> {
        let remaining = self.remaining();
        let mut end = 0;
        let mut taken = 0;
        for (index, ch) in remaining.char_indices() {
            if taken == width {
                break;
            }
            end = index + ch.len_utf8();
            taken += 1;
        }

        if taken < width {
            return Err(ParseError::Truncated {
                expected: width,
                remaining: taken,
            });
        }

        Ok((
            &remaining[..end],
            Self {
                position: self.position + end,
                ..self
            },
        ))
    }
}

/// Read a fixed-width field of `width` characters.
pub fn parse_fixed_length_field(cursor: Cursor<'_>, width: usize) -> ParseResult<(&str, Cursor<'_>)> {
    cursor.take(width)
}

/// Read the 18-character transaction date.
///
/// The middle four characters carry the zone. Blanks mean the session
/// timezone; `Z`, `UTC` or `GMT` (right-aligned) mean UTC.
pub fn parse_date_time(
    cursor: Cursor<'_>,
    timezone: Tz,
) -> ParseResult<(DateTime<FixedOffset>, Cursor<'_>)> {
    let (raw, next) = cursor.take(DATE_TIME_WIDTH)?;
    let invalid = || ParseError::InvalidDateTime(raw.to_string());

    if !raw.is_ascii() {
        return Err(invalid());
    }

    let (date, rest) = raw.split_at(8);
    let (zone, time) = rest.split_at(4);
    if !date.bytes().chain(time.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let date = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(time, "%H%M%S").map_err(|_| invalid())?;
    let naive = date.and_time(time);

    let parsed = match zone.trim() {
        "" => resolve_local(timezone, naive).ok_or_else(invalid)?,
        "Z" | "UTC" | "GMT" => Utc.from_utc_datetime(&naive).fixed_offset(),
        _ => return Err(invalid()),
    };

    Ok((parsed, next))
}

/// Place a wall-clock time in `timezone`.
///
/// Ambiguous times take the earlier offset. Times inside a daylight-saving
/// gap are read with the offset in force before the gap, which moves them
/// forward by the length of the gap.
fn resolve_local(timezone: Tz, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(resolved) | LocalResult::Ambiguous(resolved, _) => {
            Some(resolved.fixed_offset())
        }
        LocalResult::None => {
            let before_gap = timezone
                .from_local_datetime(&(naive - Duration::hours(MAX_GAP_HOURS)))
                .earliest()?;
            let instant = before_gap.offset().fix().from_local_datetime(&naive).single()?;
            Some(instant.with_timezone(&timezone).fixed_offset())
        }
    }
}

/// Read a two-character field identifier.
///
/// Unrecognised codes come back as [`Field::Unknown`]; skipping them is the
/// caller's decision.
pub fn parse_field_identifier(cursor: Cursor<'_>) -> ParseResult<(Field, Cursor<'_>)> {
    let (code, next) = cursor.take(FIELD_IDENTIFIER_WIDTH)?;
    Ok((Field::from_code(code), next))
}

/// Read a variable-length value up to the delimiter.
///
/// The returned cursor is positioned after the delimiter.
pub fn parse_variable_length_field<'a>(
    cursor: Cursor<'a>,
    field: &Field,
    delimiter: char,
) -> ParseResult<(&'a str, Cursor<'a>)> {
    let remaining = cursor.remaining();
    let index = remaining
        .find(delimiter)
        .ok_or_else(|| ParseError::MissingDelimiter(field.clone()))?;

    Ok((
        &remaining[..index],
        Cursor {
            position: cursor.position + index + delimiter.len_utf8(),
            ..cursor
        },
    ))
}

/// Interpret a flag value. `Y`/`1` are true, `N`/`0` are false.
pub fn convert_field_to_boolean(value: &str) -> ParseResult<bool> {
    match value {
        "Y" | "1" => Ok(true),
        "N" | "0" => Ok(false),
        other => Err(ParseError::InvalidBoolean(other.to_string())),
    }
}

/// Encode a timestamp as the 18-character wire date in `timezone`.
pub fn format_date_time(timestamp: DateTime<Utc>, timezone: Tz) -> String {
    timestamp
        .with_timezone(&timezone)
        .format(WIRE_DATE_TIME_FORMAT)
        .to_string()
}

pub fn format_bool(value: bool) -> char {
    if value {
        'Y'
    } else {
        'N'
    }
}

/// Encode a count as four zero-padded digits, saturating at 9999.
pub fn format_count(count: usize) -> String {
    format!("{:04}", count.min(9999))
}

/// Append `<code><value><delimiter>` to `out`.
///
/// Delimiter characters inside `value` are dropped so the frame stays
/// parseable.
pub fn push_field(out: &mut String, field: &Field, value: &str, delimiter: char) {
    out.push_str(field.code());
    out.extend(value.chars().filter(|ch| *ch != delimiter));
    out.push(delimiter);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn date_time_consumes_exactly_eighteen_characters() {
        let cursor = Cursor::new("20240315    101112AOlib|");
        let (parsed, next) = parse_date_time(cursor, Tz::UTC).unwrap();

        assert_eq!(next.position(), DATE_TIME_WIDTH);
        assert_eq!(next.remaining(), "AOlib|");
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.month(), 3);
        assert_eq!(parsed.day(), 15);
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.minute(), 11);
        assert_eq!(parsed.second(), 12);
    }

    #[test]
    fn date_time_uses_session_timezone_when_zone_is_blank() {
        let cursor = Cursor::new("20240115    120000");
        let (parsed, _) = parse_date_time(cursor, chrono_tz::America::New_York).unwrap();

        assert_eq!(parsed.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(parsed.with_timezone(&Utc).hour(), 17);
    }

    #[test]
    fn date_time_in_spring_forward_gap_moves_forward() {
        let cursor = Cursor::new("20240310    023000");
        let (parsed, _) = parse_date_time(cursor, chrono_tz::America::New_York).unwrap();

        assert_eq!(parsed.offset().local_minus_utc(), -4 * 3600);
        assert_eq!(parsed.hour(), 3);
        assert_eq!(parsed.minute(), 30);
        assert_eq!(
            parsed.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap()
        );
    }

    #[test]
    fn date_time_in_fall_back_overlap_takes_earlier_offset() {
        let cursor = Cursor::new("20241103    013000");
        let (parsed, _) = parse_date_time(cursor, chrono_tz::America::New_York).unwrap();

        assert_eq!(parsed.offset().local_minus_utc(), -4 * 3600);
        assert_eq!(parsed.with_timezone(&Utc).hour(), 5);
    }

    #[test]
    fn date_time_honours_explicit_utc_marker() {
        let cursor = Cursor::new("20240115   Z120000");
        let (parsed, _) = parse_date_time(cursor, chrono_tz::America::New_York).unwrap();

        assert_eq!(parsed.offset().local_minus_utc(), 0);
        assert_eq!(parsed.hour(), 12);
    }

    #[test]
    fn truncated_date_time_fails() {
        let cursor = Cursor::new("20240115    1200");
        assert_eq!(
            parse_date_time(cursor, Tz::UTC),
            Err(ParseError::Truncated {
                expected: 18,
                remaining: 16
            })
        );
    }

    #[test]
    fn malformed_date_time_fails() {
        let cursor = Cursor::new("2024AB15    120000");
        assert!(matches!(
            parse_date_time(cursor, Tz::UTC),
            Err(ParseError::InvalidDateTime(_))
        ));

        let cursor = Cursor::new("20241315    120000");
        assert!(parse_date_time(cursor, Tz::UTC).is_err());
    }

    #[test]
    fn field_identifier_returns_unknown_variant() {
        let (field, next) = parse_field_identifier(Cursor::new("ZZvalue|")).unwrap();
        assert_eq!(field, Field::Unknown("ZZ".to_string()));
        assert_eq!(next.position(), 2);
    }

    #[test]
    fn variable_length_field_skips_past_delimiter() {
        let cursor = Cursor::new("university_id|AA12345|");
        let (value, next) =
            parse_variable_length_field(cursor, &Field::InstitutionId, '|').unwrap();

        assert_eq!(value, "university_id");
        assert_eq!(next.position(), "university_id|".len());
        assert_eq!(next.remaining(), "AA12345|");
    }

    #[test]
    fn variable_length_field_allows_empty_value() {
        let (value, next) =
            parse_variable_length_field(Cursor::new("|rest"), &Field::TerminalPassword, '|')
                .unwrap();
        assert_eq!(value, "");
        assert_eq!(next.remaining(), "rest");
    }

    #[test]
    fn variable_length_field_without_delimiter_fails() {
        let result =
            parse_variable_length_field(Cursor::new("no-delimiter"), &Field::PatronIdentifier, '|');
        assert_eq!(
            result,
            Err(ParseError::MissingDelimiter(Field::PatronIdentifier))
        );
    }

    #[test]
    fn variable_length_field_honours_configured_delimiter() {
        let (value, next) =
            parse_variable_length_field(Cursor::new("a|b^c"), &Field::PrintLine, '^').unwrap();
        assert_eq!(value, "a|b");
        assert!(next.is_at_end());
    }

    #[test]
    fn boolean_conversion() {
        assert_eq!(convert_field_to_boolean("Y"), Ok(true));
        assert_eq!(convert_field_to_boolean("N"), Ok(false));
        assert_eq!(convert_field_to_boolean("1"), Ok(true));
        assert_eq!(convert_field_to_boolean("0"), Ok(false));
        assert!(convert_field_to_boolean("maybe").is_err());
        assert!(convert_field_to_boolean("").is_err());
    }

    #[test]
    fn full_message_walk_ends_at_message_length() {
        let message = "20240315    101112AOlib|AA42|";
        let (_, mut cursor) = parse_date_time(Cursor::new(message), Tz::UTC).unwrap();
        while !cursor.is_at_end() {
            let (field, next) = parse_field_identifier(cursor).unwrap();
            let (_, next) = parse_variable_length_field(next, &field, '|').unwrap();
            cursor = next;
        }
        assert_eq!(cursor.position(), message.len());
    }

    #[test]
    fn encoders_use_fixed_widths() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 17, 0, 0).unwrap();
        assert_eq!(format_date_time(timestamp, Tz::UTC), "20240115    170000");
        assert_eq!(
            format_date_time(timestamp, chrono_tz::America::New_York),
            "20240115    120000"
        );
        assert_eq!(format_count(7), "0007");
        assert_eq!(format_count(123_456), "9999");
        assert_eq!(format_bool(true), 'Y');
    }

    #[test]
    fn push_field_strips_embedded_delimiters() {
        let mut out = String::new();
        push_field(&mut out, &Field::ScreenMessage, "a|b", '|');
        assert_eq!(out, "AFab|");
    }
}
