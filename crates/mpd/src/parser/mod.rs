//! Builds the node model from an XML document.
//!
//! Containers are processed in two passes: everything but nested `AdaptationSet` /
//! `Representation` elements first, so that the inheritable state of the container is
//! complete when its children are built from it.

mod adaptation_set;
mod descriptor;
mod period;
mod representation;
mod root;
mod segment;

pub(crate) use adaptation_set::parse_adaptation_set;
pub(crate) use period::parse_period;
pub(crate) use segment::parse_segment_list;

use crate::{
    error::{MpdError, MpdResult},
    node::Mpd,
    xml,
};

/// Parse a complete MPD document.
pub fn parse(xml: &[u8]) -> MpdResult<Mpd> {
    let root = xml::parse_document(xml)?;
    root::parse_mpd(&root)
}

pub fn parse_str(xml: &str) -> MpdResult<Mpd> {
    parse(xml.as_bytes())
}

impl std::str::FromStr for Mpd {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_str(s)
    }
}

/// Keep the schema default when an optional attribute is malformed.
pub(crate) fn lenient<T>(result: MpdResult<Option<T>>) -> Option<T> {
    result.unwrap_or_else(|e| {
        log::warn!("{e}, using the default value");
        None
    })
}
