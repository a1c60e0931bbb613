use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};

use crate::error::{MpdError, MpdResult};

/// `xs:dateTime` as written in the manifest, keeping the original timezone offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XsDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    /// Seconds including the fractional part.
    pub second: f64,
    /// Offset from UTC in minutes, 0 when the literal carries no timezone.
    pub tz_offset_minutes: i32,
}

impl XsDateTime {
    pub fn tz_offset_hours(&self) -> f64 {
        f64::from(self.tz_offset_minutes) / 60.0
    }

    pub fn to_utc(&self) -> MpdResult<DateTime<Utc>> {
        let invalid = || MpdError::DateTimeParsing(self.to_string());

        let whole_seconds = self.second.trunc();
        let nanos = ((self.second - whole_seconds) * 1e9).round() as u32;
        let naive = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| {
                date.and_hms_nano_opt(self.hour, self.minute, whole_seconds as u32, nanos)
            })
            .ok_or_else(invalid)?;
        let offset = FixedOffset::east_opt(self.tz_offset_minutes * 60).ok_or_else(invalid)?;
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|datetime| datetime.with_timezone(&Utc))
            .ok_or_else(invalid)
    }

    pub fn from_utc(datetime: DateTime<Utc>) -> Self {
        Self {
            year: datetime.year(),
            month: datetime.month(),
            day: datetime.day(),
            hour: datetime.hour(),
            minute: datetime.minute(),
            second: f64::from(datetime.second())
                + f64::from(datetime.nanosecond() % 1_000_000_000) / 1e9,
            tz_offset_minutes: 0,
        }
    }
}

impl fmt::Display for XsDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:",
            self.year, self.month, self.day, self.hour, self.minute
        )?;
        if self.second.fract() == 0.0 {
            write!(f, "{:02}", self.second as u32)?;
        } else {
            let formatted = format!("{:06.3}", self.second);
            f.write_str(formatted.trim_end_matches('0'))?;
        }
        if self.tz_offset_minutes == 0 {
            f.write_str("Z")
        } else {
            let sign = if self.tz_offset_minutes < 0 { '-' } else { '+' };
            let offset = self.tz_offset_minutes.unsigned_abs();
            write!(f, "{sign}{:02}:{:02}", offset / 60, offset % 60)
        }
    }
}

impl FromStr for XsDateTime {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_date_time(s)
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SS[.frac][Z|(+|-)HH:MM|(+|-)HHMM]`.
pub fn parse_date_time(input: &str) -> MpdResult<XsDateTime> {
    let invalid = || MpdError::invalid_format("dateTime", input);

    let s = input.trim();
    let (date, time) = s.split_once('T').ok_or_else(invalid)?;

    let mut date_parts = date.splitn(3, '-');
    let year: i32 = parse_number(date_parts.next()).ok_or_else(invalid)?;
    let month: u32 = parse_number(date_parts.next()).ok_or_else(invalid)?;
    let day: u32 = parse_number(date_parts.next()).ok_or_else(invalid)?;
    if year <= 0 || month == 0 || day == 0 {
        log::warn!("Non-positive date component in {input:?}");
        return Err(invalid());
    }

    let (clock, tz_offset_minutes) = match time.find(['Z', '+', '-']) {
        Some(pos) => (&time[..pos], parse_timezone(&time[pos..]).ok_or_else(invalid)?),
        None => (time, 0),
    };

    let mut clock_parts = clock.splitn(3, ':');
    let hour: u32 = parse_number(clock_parts.next()).ok_or_else(invalid)?;
    let minute: u32 = parse_number(clock_parts.next()).ok_or_else(invalid)?;
    let second = clock_parts
        .next()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b == b'.'))
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(invalid)?;

    Ok(XsDateTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
        tz_offset_minutes,
    })
}

fn parse_number<T: FromStr>(s: Option<&str>) -> Option<T> {
    s.filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse().ok())
}

fn parse_timezone(tz: &str) -> Option<i32> {
    if tz == "Z" {
        return Some(0);
    }

    let sign = match tz.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let offset = &tz[1..];
    let (hours, minutes) = match offset.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if offset.len() == 4 => offset.split_at(2),
        None => (offset, "0"),
    };
    let hours: i32 = parse_number(Some(hours))?;
    let minutes: i32 = parse_number(Some(minutes))?;
    if hours > 14 || minutes >= 60 {
        return None;
    }
    Some(sign * (hours * 60 + minutes))
}
