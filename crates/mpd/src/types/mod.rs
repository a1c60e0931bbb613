//! Codecs for the scalar datatypes of the MPD schema that have no native representation.

mod conditional;
mod date_time;
mod duration;
mod range;
mod ratio;

pub use conditional::{parse_conditional_uint, ConditionalUint};
pub use date_time::{parse_date_time, XsDateTime};
pub use duration::{format_duration, parse_duration};
pub use range::{parse_range, ByteRange};
pub use ratio::{parse_frame_rate, parse_ratio, FrameRate, Ratio};

pub(crate) use ratio::parse_unsigned;
