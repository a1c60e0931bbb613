use super::{push_all, push_opt, ToXml, Xlink};
use crate::{types::ByteRange, xml::XmlElement};

/// `URLType`, used by `Initialization`, `RepresentationIndex` and `BitstreamSwitching`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlType {
    /// Element name the node was read from.
    pub node_name: String,
    pub source_url: Option<String>,
    pub range: Option<ByteRange>,
}

impl UrlType {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Default::default()
        }
    }
}

impl ToXml for UrlType {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(self.node_name.as_str());
        element
            .set_attr_opt("sourceURL", self.source_url.as_deref())
            .set_attr_opt("range", self.range);
        element
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentBase {
    pub timescale: u32,
    pub presentation_time_offset: u64,
    pub index_range: Option<ByteRange>,
    pub index_range_exact: bool,
    pub availability_time_offset: Option<f64>,
    pub availability_time_complete: Option<bool>,
    pub initialization: Option<UrlType>,
    pub representation_index: Option<UrlType>,
}

impl Default for SegmentBase {
    fn default() -> Self {
        Self {
            timescale: 1,
            presentation_time_offset: 0,
            index_range: None,
            index_range_exact: false,
            availability_time_offset: None,
            availability_time_complete: None,
            initialization: None,
            representation_index: None,
        }
    }
}

impl SegmentBase {
    fn write_to(&self, element: &mut XmlElement) {
        if self.timescale != 1 {
            element.set_attr("timescale", self.timescale);
        }
        if self.presentation_time_offset != 0 {
            element.set_attr("presentationTimeOffset", self.presentation_time_offset);
        }
        element
            .set_attr_opt("indexRange", self.index_range)
            .set_attr_opt(
                "indexRangeExact",
                self.index_range_exact.then_some("true"),
            )
            .set_attr_opt("availabilityTimeOffset", self.availability_time_offset)
            .set_attr_opt(
                "availabilityTimeComplete",
                self.availability_time_complete,
            );
        push_opt(element, self.initialization.as_ref());
        push_opt(element, self.representation_index.as_ref());
    }
}

impl ToXml for SegmentBase {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("SegmentBase");
        self.write_to(&mut element);
        element
    }
}

/// Fields shared by `SegmentList` and `SegmentTemplate`.
#[derive(Debug, Clone, PartialEq)]
pub struct MultSegmentBase {
    pub segment_base: SegmentBase,
    /// Segment duration in timescale units.
    pub duration: Option<u64>,
    pub start_number: u64,
    pub segment_timeline: Option<SegmentTimeline>,
    pub bitstream_switching: Option<UrlType>,
}

impl Default for MultSegmentBase {
    fn default() -> Self {
        Self {
            segment_base: SegmentBase::default(),
            duration: None,
            start_number: 1,
            segment_timeline: None,
            bitstream_switching: None,
        }
    }
}

impl MultSegmentBase {
    /// Whether segment timing can be derived at all.
    pub fn has_timing(&self) -> bool {
        self.duration.is_some() || self.segment_timeline.is_some()
    }

    fn write_to(&self, element: &mut XmlElement) {
        self.segment_base.write_to(element);
        element.set_attr_opt("duration", self.duration);
        if self.start_number != 1 {
            element.set_attr("startNumber", self.start_number);
        }
        push_opt(element, self.segment_timeline.as_ref());
        push_opt(element, self.bitstream_switching.as_ref());
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentList {
    pub mult_segment_base: MultSegmentBase,
    pub segment_urls: Vec<SegmentUrl>,
    pub xlink: Xlink,
}

impl ToXml for SegmentList {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("SegmentList");
        self.xlink.write_to(&mut element);
        self.mult_segment_base.write_to(&mut element);
        push_all(&mut element, &self.segment_urls);
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentTemplate {
    pub mult_segment_base: MultSegmentBase,
    pub media: Option<String>,
    pub index: Option<String>,
    pub initialization: Option<String>,
    pub bitstream_switching: Option<String>,
}

impl ToXml for SegmentTemplate {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("SegmentTemplate");
        element
            .set_attr_opt("media", self.media.as_deref())
            .set_attr_opt("index", self.index.as_deref())
            .set_attr_opt("initialization", self.initialization.as_deref())
            .set_attr_opt("bitstreamSwitching", self.bitstream_switching.as_deref());
        self.mult_segment_base.write_to(&mut element);
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentTimeline {
    pub s: Vec<SNode>,
}

impl ToXml for SegmentTimeline {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("SegmentTimeline");
        push_all(&mut element, &self.s);
        element
    }
}

/// One `S` entry of a timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SNode {
    /// Start in timescale units, implied by the previous entry when absent.
    pub t: Option<u64>,
    pub d: u64,
    /// Number of additional repetitions, `-1` repeats up to the next entry or the period end.
    pub r: i64,
}

impl SNode {
    pub fn new(t: Option<u64>, d: u64, r: i64) -> Self {
        Self { t, d, r }
    }
}

impl ToXml for SNode {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("S");
        element.set_attr_opt("t", self.t).set_attr("d", self.d);
        if self.r != 0 {
            element.set_attr("r", self.r);
        }
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentUrl {
    pub media: Option<String>,
    pub media_range: Option<ByteRange>,
    pub index: Option<String>,
    pub index_range: Option<ByteRange>,
}

impl ToXml for SegmentUrl {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("SegmentURL");
        element
            .set_attr_opt("media", self.media.as_deref())
            .set_attr_opt("mediaRange", self.media_range)
            .set_attr_opt("index", self.index.as_deref())
            .set_attr_opt("indexRange", self.index_range);
        element
    }
}
