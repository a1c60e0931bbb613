//! Typed node model of an MPD document.
//!
//! Every node owns its children. A snapshot is never mutated after parsing: reloads and
//! xlink resolution build a new tree.

mod adaptation_set;
mod base_url;
mod descriptor;
mod period;
mod representation;
mod root;
mod segment;

pub use adaptation_set::{AdaptationSet, ContentComponent};
pub use base_url::BaseUrl;
pub use descriptor::Descriptor;
pub use period::{Period, Subset};
pub use representation::{Representation, RepresentationBase, SapType, SubRepresentation};
pub use root::{
    Metrics, MetricsRange, Mpd, MpdType, ProgramInformation, UtcTiming, UtcTimingMethod,
    MPD_NAMESPACE,
};
pub use segment::{
    MultSegmentBase, SNode, SegmentBase, SegmentList, SegmentTemplate, SegmentTimeline,
    SegmentUrl, UrlType,
};

use crate::xml::{XmlElement, XLINK_NAMESPACE};

pub const RESOLVE_TO_ZERO: &str = "urn:mpeg:dash:resolve-to-zero:2013";

/// Rebuild an XML element from the current field values of a node.
///
/// Absent optional attributes are omitted.
pub trait ToXml {
    fn to_xml(&self) -> XmlElement;
}

/// `xlink:actuate` of a remote element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum XlinkActuate {
    OnLoad,
    #[default]
    OnRequest,
}

impl XlinkActuate {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("onLoad") => Self::OnLoad,
            _ => Self::OnRequest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnLoad => "onLoad",
            Self::OnRequest => "onRequest",
        }
    }
}

/// Placeholder state of an element that may be fetched from elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Xlink {
    pub href: Option<String>,
    pub actuate: XlinkActuate,
}

impl Xlink {
    pub(crate) fn from_element(element: &XmlElement) -> Self {
        Self {
            href: element.xlink_href(),
            actuate: XlinkActuate::parse(element.xlink_actuate()),
        }
    }

    /// Whether the node still waits for its remote content.
    pub fn is_unresolved(&self) -> bool {
        self.href.is_some()
    }

    pub fn is_on_load(&self) -> bool {
        self.is_unresolved() && self.actuate == XlinkActuate::OnLoad
    }

    pub(crate) fn write_to(&self, element: &mut XmlElement) {
        if let Some(href) = &self.href {
            push_xlink_attr(element, "xlink:href", href);
            push_xlink_attr(element, "xlink:actuate", self.actuate.as_str());
        }
    }
}

fn push_xlink_attr(element: &mut XmlElement, name: &str, value: &str) {
    element.attributes.push(crate::xml::XmlAttribute {
        name: name.to_string(),
        value: value.to_string(),
        namespace: Some(XLINK_NAMESPACE.to_string()),
    });
}

pub(crate) fn push_all<T: ToXml>(element: &mut XmlElement, nodes: &[T]) {
    for node in nodes {
        element.push_child(node.to_xml());
    }
}

pub(crate) fn push_opt<T: ToXml>(element: &mut XmlElement, node: Option<&T>) {
    if let Some(node) = node {
        element.push_child(node.to_xml());
    }
}

pub(crate) fn text_element(name: &str, text: &str) -> XmlElement {
    let mut element = XmlElement::new(name);
    element.push_text(text);
    element
}

pub(crate) fn join<T: ToString>(values: &[T]) -> Option<String> {
    (!values.is_empty()).then(|| {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    })
}
