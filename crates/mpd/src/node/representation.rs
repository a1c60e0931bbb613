use super::{join, push_all, push_opt, BaseUrl, Descriptor, SegmentBase, SegmentList, SegmentTemplate, ToXml};
use crate::{
    caps::MediaCaps,
    types::{FrameRate, Ratio},
    xml::XmlElement,
};

/// Stream access point type of `@startWithSAP` and `@subsegmentStartsWithSAP`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SapType {
    #[default]
    Type0,
    Type1,
    Type2,
    Type3,
    Type4,
    Type5,
    Type6,
}

impl SapType {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::Type0,
            1 => Self::Type1,
            2 => Self::Type2,
            3 => Self::Type3,
            4 => Self::Type4,
            5 => Self::Type5,
            6 => Self::Type6,
            _ => return None,
        })
    }

    pub fn as_u32(&self) -> u32 {
        *self as u32
    }
}

/// Attributes and descriptors shared by `AdaptationSet`, `Representation` and
/// `SubRepresentation`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepresentationBase {
    pub profiles: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sar: Option<Ratio>,
    pub min_frame_rate: Option<FrameRate>,
    pub max_frame_rate: Option<FrameRate>,
    pub frame_rate: Option<FrameRate>,
    pub audio_sampling_rate: Option<String>,
    pub mime_type: Option<String>,
    pub segment_profiles: Option<String>,
    pub codecs: Option<String>,
    pub maximum_sap_period: Option<f64>,
    pub start_with_sap: SapType,
    pub max_playout_rate: Option<f64>,
    pub coding_dependency: Option<bool>,
    pub scan_type: Option<String>,

    pub frame_packing: Vec<Descriptor>,
    pub audio_channel_configuration: Vec<Descriptor>,
    pub content_protection: Vec<Descriptor>,
    pub essential_property: Vec<Descriptor>,
    pub supplemental_property: Vec<Descriptor>,

    /// Derived from `codecs`, falling back to `mimeType`.
    pub caps: Option<MediaCaps>,
}

impl RepresentationBase {
    /// Fill every unset scalar attribute from `parent`.
    ///
    /// Descriptor lists stay as written on each level.
    pub fn inherit_from(&mut self, parent: &RepresentationBase) {
        fn fill<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if dst.is_none() {
                dst.clone_from(src);
            }
        }

        fill(&mut self.profiles, &parent.profiles);
        fill(&mut self.width, &parent.width);
        fill(&mut self.height, &parent.height);
        fill(&mut self.sar, &parent.sar);
        fill(&mut self.min_frame_rate, &parent.min_frame_rate);
        fill(&mut self.max_frame_rate, &parent.max_frame_rate);
        fill(&mut self.frame_rate, &parent.frame_rate);
        fill(&mut self.audio_sampling_rate, &parent.audio_sampling_rate);
        fill(&mut self.mime_type, &parent.mime_type);
        fill(&mut self.segment_profiles, &parent.segment_profiles);
        fill(&mut self.codecs, &parent.codecs);
        fill(&mut self.maximum_sap_period, &parent.maximum_sap_period);
        fill(&mut self.max_playout_rate, &parent.max_playout_rate);
        fill(&mut self.coding_dependency, &parent.coding_dependency);
        fill(&mut self.scan_type, &parent.scan_type);
        if self.start_with_sap == SapType::Type0 {
            self.start_with_sap = parent.start_with_sap;
        }
    }

    pub(crate) fn write_to(&self, element: &mut XmlElement) {
        element
            .set_attr_opt("profiles", self.profiles.as_deref())
            .set_attr_opt("width", self.width)
            .set_attr_opt("height", self.height)
            .set_attr_opt("sar", self.sar)
            .set_attr_opt("minFrameRate", self.min_frame_rate)
            .set_attr_opt("maxFrameRate", self.max_frame_rate)
            .set_attr_opt("frameRate", self.frame_rate)
            .set_attr_opt("audioSamplingRate", self.audio_sampling_rate.as_deref())
            .set_attr_opt("mimeType", self.mime_type.as_deref())
            .set_attr_opt("segmentProfiles", self.segment_profiles.as_deref())
            .set_attr_opt("codecs", self.codecs.as_deref())
            .set_attr_opt("maximumSAPPeriod", self.maximum_sap_period)
            .set_attr_opt("maxPlayoutRate", self.max_playout_rate)
            .set_attr_opt("codingDependency", self.coding_dependency)
            .set_attr_opt("scanType", self.scan_type.as_deref());
        if self.start_with_sap != SapType::Type0 {
            element.set_attr("startWithSAP", self.start_with_sap.as_u32());
        }

        push_all(element, &self.frame_packing);
        push_all(element, &self.audio_channel_configuration);
        push_all(element, &self.content_protection);
        push_all(element, &self.essential_property);
        push_all(element, &self.supplemental_property);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Representation {
    pub id: String,
    pub bandwidth: u64,
    pub quality_ranking: Option<u32>,
    pub dependency_id: Vec<String>,
    pub media_stream_structure_id: Vec<String>,
    pub representation_base: RepresentationBase,

    pub base_urls: Vec<BaseUrl>,
    pub sub_representations: Vec<SubRepresentation>,
    pub segment_base: Option<SegmentBase>,
    pub segment_list: Option<SegmentList>,
    pub segment_template: Option<SegmentTemplate>,
}

impl Representation {
    pub fn caps(&self) -> Option<&MediaCaps> {
        self.representation_base.caps.as_ref()
    }
}

impl ToXml for Representation {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("Representation");
        element
            .set_attr("id", &self.id)
            .set_attr("bandwidth", self.bandwidth)
            .set_attr_opt("qualityRanking", self.quality_ranking)
            .set_attr_opt("dependencyId", join(&self.dependency_id))
            .set_attr_opt(
                "mediaStreamStructureId",
                join(&self.media_stream_structure_id),
            );
        self.representation_base.write_to(&mut element);
        push_all(&mut element, &self.base_urls);
        push_all(&mut element, &self.sub_representations);
        push_opt(&mut element, self.segment_base.as_ref());
        push_opt(&mut element, self.segment_list.as_ref());
        push_opt(&mut element, self.segment_template.as_ref());
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubRepresentation {
    pub level: Option<u32>,
    pub dependency_level: Vec<u32>,
    pub bandwidth: Option<u32>,
    pub content_component: Vec<String>,
    pub representation_base: RepresentationBase,
}

impl ToXml for SubRepresentation {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("SubRepresentation");
        element
            .set_attr_opt("level", self.level)
            .set_attr_opt("dependencyLevel", join(&self.dependency_level))
            .set_attr_opt("bandwidth", self.bandwidth)
            .set_attr_opt("contentComponent", join(&self.content_component));
        self.representation_base.write_to(&mut element);
        element
    }
}
