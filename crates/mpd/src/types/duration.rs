//! `xs:duration` restricted to what MPDs use.
//!
//! Values are carried as milliseconds. Years and months are not anchored to a calendar:
//! a year counts as 365 days and a month as 30 days.

use std::fmt::Write;

use crate::error::{MpdError, MpdResult};

const MS_PER_SECOND: u64 = 1000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Parse `P[nY][nM][nD][T[nH][nM][nS[.fraction]]]` into milliseconds.
pub fn parse_duration(input: &str) -> MpdResult<u64> {
    let invalid = || MpdError::invalid_format("duration", input);

    let s = input.trim();
    let Some(rest) = s.strip_prefix('P') else {
        log::warn!("P not found at the beginning of duration {input:?}");
        return Err(invalid());
    };
    let (date, time) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut years = None;
    let mut months = None;
    let mut days = None;
    let mut cursor = date;
    while !cursor.is_empty() {
        let (value, unit, next) = take_component(cursor).ok_or_else(invalid)?;
        match unit {
            'Y' if years.is_none() && months.is_none() && days.is_none() => years = Some(value),
            'M' if months.is_none() && days.is_none() => {
                if value >= 12 {
                    log::warn!("Month out of range in duration {input:?}");
                    return Err(invalid());
                }
                months = Some(value);
            }
            'D' if days.is_none() => {
                if value >= 31 {
                    log::warn!("Day out of range in duration {input:?}");
                    return Err(invalid());
                }
                days = Some(value);
            }
            _ => {
                log::warn!("Unexpected unit {unit:?} in duration {input:?}");
                return Err(invalid());
            }
        }
        cursor = next;
    }

    let mut hours = None;
    let mut minutes = None;
    let mut seconds = None;
    let mut millis = None;
    if let Some(time) = time {
        if time.is_empty() {
            return Err(invalid());
        }

        let mut cursor = time;
        while !cursor.is_empty() {
            let (value, unit, next) = take_component(cursor).ok_or_else(invalid)?;
            match unit {
                'H' if hours.is_none() && minutes.is_none() && seconds.is_none() => {
                    hours = Some(value)
                }
                'M' if minutes.is_none() && seconds.is_none() => minutes = Some(value),
                'S' if seconds.is_none() => seconds = Some(value),
                '.' | ',' if seconds.is_none() => {
                    seconds = Some(value);
                    let digits_len = next.bytes().take_while(u8::is_ascii_digit).count();
                    if digits_len == 0 || next.as_bytes().get(digits_len) != Some(&b'S') {
                        return Err(invalid());
                    }
                    millis = Some(fraction_to_millis(&next[..digits_len]));
                    cursor = &next[digits_len + 1..];
                    continue;
                }
                _ => {
                    log::warn!("Unexpected unit {unit:?} in duration {input:?}");
                    return Err(invalid());
                }
            }
            cursor = next;
        }
    }

    log::trace!(
        "duration {input:?}: Y:M:D={}:{}:{} H:M:S.MS={}:{}:{}.{:03}",
        years.unwrap_or(0),
        months.unwrap_or(0),
        days.unwrap_or(0),
        hours.unwrap_or(0),
        minutes.unwrap_or(0),
        seconds.unwrap_or(0),
        millis.unwrap_or(0),
    );

    let value = Some(years.unwrap_or(0))
        .and_then(|v| accumulate(v, 365, months.unwrap_or(0).checked_mul(30)?))
        .and_then(|v| accumulate(v, 1, days.unwrap_or(0)))
        .and_then(|v| accumulate(v, 24, hours.unwrap_or(0)))
        .and_then(|v| accumulate(v, 60, minutes.unwrap_or(0)))
        .and_then(|v| accumulate(v, 60, seconds.unwrap_or(0)))
        .and_then(|v| accumulate(v, 1000, millis.unwrap_or(0)))
        .ok_or_else(|| {
            log::warn!("Duration {input:?} overflows");
            invalid()
        })?;

    // must stay convertible to nanoseconds
    if value > u64::MAX / 1_000_000 {
        return Err(invalid());
    }

    Ok(value)
}

/// Format milliseconds as an `xs:duration` accepted by [`parse_duration`].
pub fn format_duration(ms: u64) -> String {
    if ms == 0 {
        return "PT0S".to_string();
    }

    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = ms % MS_PER_SECOND;

    let mut out = String::from("PT");
    if hours > 0 {
        let _ = write!(out, "{hours}H");
    }
    if minutes > 0 {
        let _ = write!(out, "{minutes}M");
    }
    if millis > 0 {
        let _ = write!(out, "{seconds}.{millis:03}S");
    } else if seconds > 0 {
        let _ = write!(out, "{seconds}S");
    }
    out
}

/// Split `123X...` into (123, 'X', "...").
fn take_component(s: &str) -> Option<(u64, char, &str)> {
    let digits_len = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let value = s[..digits_len].parse().ok()?;
    let mut rest = s[digits_len..].chars();
    let unit = rest.next()?;
    Some((value, unit, rest.as_str()))
}

/// `decimals * 10^(3 - digit_count)`, truncating extra precision.
fn fraction_to_millis(digits: &str) -> u64 {
    digits
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(3)
        .fold(0, |acc, b| acc * 10 + u64::from(b - b'0'))
}

fn accumulate(value: u64, multiplier: u64, addend: u64) -> Option<u64> {
    value.checked_mul(multiplier)?.checked_add(addend)
}
