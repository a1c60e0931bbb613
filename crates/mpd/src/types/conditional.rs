use std::{fmt, str::FromStr};

use super::ratio::parse_unsigned;
use crate::error::{MpdError, MpdResult};

/// `xs:union` of `xs:unsignedInt` and `xs:boolean`, used by `@segmentAlignment`
/// and `@subsegmentAlignment`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionalUint {
    pub flag: bool,
    pub value: u32,
}

impl fmt::Display for ConditionalUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.flag, self.value) {
            (false, _) => f.write_str("false"),
            (true, 0) => f.write_str("true"),
            (true, value) => write!(f, "{value}"),
        }
    }
}

impl FromStr for ConditionalUint {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_conditional_uint(s)
    }
}

pub fn parse_conditional_uint(input: &str) -> MpdResult<ConditionalUint> {
    match input.trim() {
        "true" => Ok(ConditionalUint {
            flag: true,
            value: 0,
        }),
        "false" => Ok(ConditionalUint {
            flag: false,
            value: 0,
        }),
        s => parse_unsigned(s)
            .map(|value| ConditionalUint { flag: true, value })
            .ok_or_else(|| MpdError::invalid_format("conditionalUint", input)),
    }
}
