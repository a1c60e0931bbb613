use super::{
    push_all, push_opt, BaseUrl, Descriptor, Representation, RepresentationBase, SapType,
    SegmentBase, SegmentList, SegmentTemplate, ToXml, Xlink,
};
use crate::{
    types::{ConditionalUint, Ratio},
    xml::XmlElement,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptationSet {
    pub xlink: Xlink,
    pub id: Option<u32>,
    pub group: Option<u32>,
    pub lang: Option<String>,
    pub content_type: Option<String>,
    pub par: Option<Ratio>,
    pub min_bandwidth: Option<u32>,
    pub max_bandwidth: Option<u32>,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_height: Option<u32>,
    pub segment_alignment: Option<ConditionalUint>,
    pub subsegment_alignment: Option<ConditionalUint>,
    pub subsegment_starts_with_sap: SapType,
    /// Inherited from the period when unset.
    pub bitstream_switching: Option<bool>,
    pub representation_base: RepresentationBase,

    pub accessibility: Vec<Descriptor>,
    pub role: Vec<Descriptor>,
    pub rating: Vec<Descriptor>,
    pub viewpoint: Vec<Descriptor>,
    pub content_components: Vec<ContentComponent>,
    pub base_urls: Vec<BaseUrl>,
    pub segment_base: Option<SegmentBase>,
    pub segment_list: Option<SegmentList>,
    pub segment_template: Option<SegmentTemplate>,
    pub representations: Vec<Representation>,
}

impl AdaptationSet {
    pub fn representation(&self, id: &str) -> Option<&Representation> {
        self.representations.iter().find(|r| r.id == id)
    }
}

impl ToXml for AdaptationSet {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("AdaptationSet");
        self.xlink.write_to(&mut element);
        element
            .set_attr_opt("id", self.id)
            .set_attr_opt("group", self.group)
            .set_attr_opt("lang", self.lang.as_deref())
            .set_attr_opt("contentType", self.content_type.as_deref())
            .set_attr_opt("par", self.par)
            .set_attr_opt("minBandwidth", self.min_bandwidth)
            .set_attr_opt("maxBandwidth", self.max_bandwidth)
            .set_attr_opt("minWidth", self.min_width)
            .set_attr_opt("maxWidth", self.max_width)
            .set_attr_opt("minHeight", self.min_height)
            .set_attr_opt("maxHeight", self.max_height)
            .set_attr_opt("segmentAlignment", self.segment_alignment)
            .set_attr_opt("subsegmentAlignment", self.subsegment_alignment)
            .set_attr_opt("bitstreamSwitching", self.bitstream_switching);
        if self.subsegment_starts_with_sap != SapType::Type0 {
            element.set_attr(
                "subsegmentStartsWithSAP",
                self.subsegment_starts_with_sap.as_u32(),
            );
        }
        self.representation_base.write_to(&mut element);

        push_all(&mut element, &self.accessibility);
        push_all(&mut element, &self.role);
        push_all(&mut element, &self.rating);
        push_all(&mut element, &self.viewpoint);
        push_all(&mut element, &self.content_components);
        push_all(&mut element, &self.base_urls);
        push_opt(&mut element, self.segment_base.as_ref());
        push_opt(&mut element, self.segment_list.as_ref());
        push_opt(&mut element, self.segment_template.as_ref());
        push_all(&mut element, &self.representations);
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentComponent {
    pub id: Option<u32>,
    pub lang: Option<String>,
    pub content_type: Option<String>,
    pub par: Option<Ratio>,
    pub accessibility: Vec<Descriptor>,
    pub role: Vec<Descriptor>,
    pub rating: Vec<Descriptor>,
    pub viewpoint: Vec<Descriptor>,
}

impl ToXml for ContentComponent {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("ContentComponent");
        element
            .set_attr_opt("id", self.id)
            .set_attr_opt("lang", self.lang.as_deref())
            .set_attr_opt("contentType", self.content_type.as_deref())
            .set_attr_opt("par", self.par);
        push_all(&mut element, &self.accessibility);
        push_all(&mut element, &self.role);
        push_all(&mut element, &self.rating);
        push_all(&mut element, &self.viewpoint);
        element
    }
}
