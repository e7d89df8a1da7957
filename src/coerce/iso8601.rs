//! ISO-8601 dates and times for `datetime` parameters.
//!
//! Accepted, in extended or basic form:
//! - calendar dates `YYYY-MM-DD`, and the reduced `YYYY-MM` and `YYYY`;
//! - week dates `YYYY-Www[-D]`;
//! - ordinal dates `YYYY-DDD`;
//! - an optional time after `T` or a space: `hh[:mm[:ss[.f]]]`, where the fraction may use
//!   `.` or `,` and `24:00` means midnight of the next day;
//! - an optional offset after the time: `Z`, `±hh`, `±hh:mm` or `±hhmm`.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};

use crate::types::SqlValue;

/// Parse an ISO-8601 timestamp.
///
/// Values with an offset become [`SqlValue::TimestampTz`]. Local times and bare dates become
/// [`SqlValue::Timestamp`], with dates at midnight and missing components set to their
/// smallest value.
/// ```rust
/// use sproc_middleware::coerce::parse_iso8601;
///
/// assert!(parse_iso8601("2024-W10-2T14:30:15,250+02").is_some());
/// assert!(parse_iso8601("2024-03-05T25:00").is_none());
/// ```
#[must_use]
pub fn parse_iso8601(s: &str) -> Option<SqlValue> {
    let mut cur = Cursor::new(s);
    let date = parse_date(&mut cur)?;
    if cur.at_end() {
        return date.and_hms_opt(0, 0, 0).map(SqlValue::Timestamp);
    }

    cur.eat_any(b"T ")?;
    let (time, next_day) = parse_time(&mut cur)?;
    let date = if next_day { date.succ_opt()? } else { date };
    let local = NaiveDateTime::new(date, time);
    if cur.at_end() {
        return Some(SqlValue::Timestamp(local));
    }

    let offset = parse_offset(&mut cur)?;
    if !cur.at_end() {
        return None;
    }
    offset
        .from_local_datetime(&local)
        .single()
        .map(SqlValue::TimestampTz)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.bytes.get(self.pos) == Some(&b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, set: &[u8]) -> Option<u8> {
        let b = self.bytes.get(self.pos).copied().filter(|b| set.contains(b))?;
        self.pos += 1;
        Some(b)
    }

    /// Length of the run of ASCII digits at the cursor.
    fn digit_run(&self) -> usize {
        self.bytes
            .get(self.pos..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    }

    /// Exactly `width` digits as a number.
    fn number(&mut self, width: usize) -> Option<u32> {
        let digits = self.bytes.get(self.pos..self.pos + width)?;
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        self.pos += width;
        Some(digits.iter().fold(0, |acc, d| acc * 10 + u32::from(d - b'0')))
    }
}

fn parse_date(cur: &mut Cursor<'_>) -> Option<NaiveDate> {
    let basic_len = cur.digit_run();
    let year = i32::try_from(cur.number(4)?).ok()?;

    if cur.eat(b'-') {
        if cur.eat(b'W') {
            let week = cur.number(2)?;
            let day = if cur.eat(b'-') { cur.number(1)? } else { 1 };
            return week_date(year, week, day);
        }
        return match cur.digit_run() {
            2 => {
                let month = cur.number(2)?;
                let day = if cur.eat(b'-') { cur.number(2)? } else { 1 };
                NaiveDate::from_ymd_opt(year, month, day)
            }
            3 => NaiveDate::from_yo_opt(year, cur.number(3)?),
            _ => None,
        };
    }

    if cur.eat(b'W') {
        let week = cur.number(2)?;
        let day = if cur.digit_run() == 1 { cur.number(1)? } else { 1 };
        return week_date(year, week, day);
    }

    match basic_len {
        4 => NaiveDate::from_ymd_opt(year, 1, 1),
        6 => NaiveDate::from_ymd_opt(year, cur.number(2)?, 1),
        7 => NaiveDate::from_yo_opt(year, cur.number(3)?),
        8 => {
            let month = cur.number(2)?;
            NaiveDate::from_ymd_opt(year, month, cur.number(2)?)
        }
        _ => None,
    }
}

fn week_date(year: i32, week: u32, day: u32) -> Option<NaiveDate> {
    let weekday = match day {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        7 => Weekday::Sun,
        _ => return None,
    };
    NaiveDate::from_isoywd_opt(year, week, weekday)
}

/// The time of day, and whether it rolled over to the next day (`24:00`).
fn parse_time(cur: &mut Cursor<'_>) -> Option<(NaiveTime, bool)> {
    let hour = cur.number(2)?;
    let extended = cur.eat(b':');
    let (mut minute, mut second, mut nano) = (0, 0, 0);

    if extended || cur.digit_run() >= 2 {
        minute = cur.number(2)?;
        let has_seconds = if extended {
            cur.eat(b':')
        } else {
            cur.digit_run() >= 2
        };
        if has_seconds {
            second = cur.number(2)?;
            if cur.eat_any(b".,").is_some() {
                nano = fraction(cur)?;
            }
        }
    }

    if hour == 24 {
        return if minute == 0 && second == 0 && nano == 0 {
            NaiveTime::from_hms_opt(0, 0, 0).map(|midnight| (midnight, true))
        } else {
            None
        };
    }
    NaiveTime::from_hms_nano_opt(hour, minute, second, nano).map(|t| (t, false))
}

// Digits past nanosecond precision are dropped.
fn fraction(cur: &mut Cursor<'_>) -> Option<u32> {
    let len = cur.digit_run();
    if len == 0 {
        return None;
    }
    let kept = len.min(9);
    let value = cur.number(kept)?;
    cur.pos += len - kept;
    Some(value * 10_u32.pow(u32::try_from(9 - kept).ok()?))
}

fn parse_offset(cur: &mut Cursor<'_>) -> Option<FixedOffset> {
    if cur.eat(b'Z') {
        return FixedOffset::east_opt(0);
    }
    let sign = if cur.eat_any(b"+-")? == b'-' { -1 } else { 1 };
    let hours = cur.number(2)?;
    let minutes = if cur.eat(b':') || cur.digit_run() == 2 {
        cur.number(2)?
    } else {
        0
    };
    if minutes >= 60 {
        return None;
    }
    let seconds = i32::try_from(hours * 3600 + minutes * 60).ok()?;
    FixedOffset::east_opt(sign * seconds)
}
