use std::{fmt, str::FromStr};

use super::ratio::parse_unsigned;
use crate::error::{MpdError, MpdResult};

/// The byte range shall be expressed and formatted as a byte-range-spec as defined in
/// IETF RFC 7233:2014, subclause 2.1. It is restricted to a single expression identifying
/// a contiguous range of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub first_byte_pos: u64,
    /// `None` means the range extends to the end of the resource.
    pub last_byte_pos: Option<u64>,
}

impl ByteRange {
    pub fn new(first_byte_pos: u64, last_byte_pos: Option<u64>) -> Self {
        Self {
            first_byte_pos,
            last_byte_pos,
        }
    }

    /// 0 - 500 means 501 bytes
    pub fn length(&self) -> Option<u64> {
        self.last_byte_pos
            .map(|last_byte_pos| last_byte_pos - self.first_byte_pos + 1)
    }

    pub fn to_http_range(&self) -> String {
        match self.last_byte_pos {
            Some(last_byte_pos) => format!("bytes={}-{}", self.first_byte_pos, last_byte_pos),
            None => format!("bytes={}-", self.first_byte_pos),
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_byte_pos {
            Some(last_byte_pos) => write!(f, "{}-{}", self.first_byte_pos, last_byte_pos),
            None => write!(f, "{}-", self.first_byte_pos),
        }
    }
}

impl FromStr for ByteRange {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_range(s)
    }
}

pub fn parse_range(input: &str) -> MpdResult<ByteRange> {
    let invalid = || MpdError::invalid_format("range", input);

    let (first, last) = input.trim().split_once('-').ok_or_else(invalid)?;
    let first_byte_pos: u64 = parse_unsigned(first).ok_or_else(invalid)?;
    let last_byte_pos = match last {
        "" => None,
        last => {
            let last_byte_pos: u64 = parse_unsigned(last).ok_or_else(invalid)?;
            if last_byte_pos < first_byte_pos {
                return Err(invalid());
            }
            Some(last_byte_pos)
        }
    };

    Ok(ByteRange {
        first_byte_pos,
        last_byte_pos,
    })
}
