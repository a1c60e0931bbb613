use std::{fmt, str::FromStr};

use crate::error::{MpdError, MpdResult};

/// Aspect ratio such as `@par` or `@sar`, written `num:den`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ratio {
    pub num: u32,
    pub den: u32,
}

impl Ratio {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.num, self.den)
    }
}

impl FromStr for Ratio {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ratio(s)
    }
}

/// Frame rate written `num[/den]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub fn as_f64(&self) -> Option<f64> {
        (self.den != 0).then(|| f64::from(self.num) / f64::from(self.den))
    }
}

impl PartialOrd for FrameRate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        // a/b <=> c/d  iff  a*d <=> c*b
        let lhs = u64::from(self.num) * u64::from(other.den);
        let rhs = u64::from(other.num) * u64::from(self.den);
        Some(lhs.cmp(&rhs))
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl FromStr for FrameRate {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_frame_rate(s)
    }
}

pub fn parse_ratio(input: &str) -> MpdResult<Ratio> {
    let invalid = || MpdError::invalid_format("ratio", input);

    let (num, den) = input.trim().split_once(':').ok_or_else(invalid)?;
    Ok(Ratio {
        num: parse_unsigned(num).ok_or_else(invalid)?,
        den: parse_unsigned(den).ok_or_else(invalid)?,
    })
}

pub fn parse_frame_rate(input: &str) -> MpdResult<FrameRate> {
    let invalid = || MpdError::invalid_format("frameRate", input);

    let s = input.trim();
    let (num, den) = match s.split_once('/') {
        Some((num, den)) => (num, Some(den)),
        None => (s, None),
    };
    Ok(FrameRate {
        num: parse_unsigned(num).ok_or_else(invalid)?,
        den: match den {
            Some(den) => parse_unsigned(den).ok_or_else(invalid)?,
            None => 1,
        },
    })
}

/// Digits only: no sign, no whitespace.
pub(crate) fn parse_unsigned<T: FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
