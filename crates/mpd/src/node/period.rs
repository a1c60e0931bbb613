use super::{
    join, push_all, push_opt, AdaptationSet, BaseUrl, SegmentBase, SegmentList, SegmentTemplate,
    ToXml, Xlink,
};
use crate::{types::format_duration, xml::XmlElement};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Period {
    pub xlink: Xlink,
    pub id: Option<String>,
    /// Milliseconds from the start of the presentation.
    pub start: Option<u64>,
    /// Milliseconds, `None` when implied by the next period or open ended.
    pub duration: Option<u64>,
    pub bitstream_switching: bool,

    pub base_urls: Vec<BaseUrl>,
    pub segment_base: Option<SegmentBase>,
    pub segment_list: Option<SegmentList>,
    pub segment_template: Option<SegmentTemplate>,
    pub adaptation_sets: Vec<AdaptationSet>,
    pub subsets: Vec<Subset>,
}

impl ToXml for Period {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("Period");
        self.xlink.write_to(&mut element);
        element
            .set_attr_opt("id", self.id.as_deref())
            .set_attr_opt("start", self.start.map(format_duration))
            .set_attr_opt("duration", self.duration.map(format_duration))
            .set_attr_opt("bitstreamSwitching", self.bitstream_switching.then_some("true"));
        push_all(&mut element, &self.base_urls);
        push_opt(&mut element, self.segment_base.as_ref());
        push_opt(&mut element, self.segment_list.as_ref());
        push_opt(&mut element, self.segment_template.as_ref());
        push_all(&mut element, &self.adaptation_sets);
        push_all(&mut element, &self.subsets);
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subset {
    pub contains: Vec<u32>,
    pub id: Option<String>,
}

impl ToXml for Subset {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("Subset");
        element
            .set_attr_opt("contains", join(&self.contains))
            .set_attr_opt("id", self.id.as_deref());
        element
    }
}
