use super::{
    descriptor::{parse_base_url, parse_content_protection, parse_descriptor},
    lenient,
    segment::{parse_segment_base, parse_segment_list, parse_segment_template},
};
use crate::{
    caps::MediaCaps,
    error::{MpdError, MpdResult},
    node::{
        AdaptationSet, Period, Representation, RepresentationBase, SapType, SubRepresentation,
    },
    xml::XmlElement,
};

pub(crate) fn parse_sap_type(element: &XmlElement, name: &str) -> SapType {
    lenient(element.attr_with(name, |value| {
        value
            .trim()
            .parse()
            .ok()
            .and_then(SapType::from_u32)
            .ok_or_else(|| MpdError::invalid_format("SAPType", value))
    }))
    .unwrap_or_default()
}

/// Attributes and descriptors of the element itself, nothing is inherited yet.
pub(crate) fn parse_representation_base(element: &XmlElement) -> MpdResult<RepresentationBase> {
    let mut base = RepresentationBase {
        profiles: element.attr_string("profiles"),
        width: element.attr_u32("width")?,
        height: element.attr_u32("height")?,
        sar: element.attr_parsed("sar")?,
        min_frame_rate: element.attr_parsed("minFrameRate")?,
        max_frame_rate: element.attr_parsed("maxFrameRate")?,
        frame_rate: element.attr_parsed("frameRate")?,
        audio_sampling_rate: element.attr_string("audioSamplingRate"),
        mime_type: element.attr_string("mimeType"),
        segment_profiles: element.attr_string("segmentProfiles"),
        codecs: element.attr_string("codecs"),
        maximum_sap_period: element.attr_f64("maximumSAPPeriod")?,
        start_with_sap: parse_sap_type(element, "startWithSAP"),
        max_playout_rate: element.attr_f64("maxPlayoutRate")?,
        coding_dependency: element.attr_bool("codingDependency")?,
        scan_type: element.attr_string("scanType"),
        ..Default::default()
    };

    for child in element.elements() {
        match child.local_name() {
            "FramePacking" => base.frame_packing.push(parse_descriptor(child)?),
            "AudioChannelConfiguration" => {
                base.audio_channel_configuration
                    .push(parse_descriptor(child)?);
            }
            "ContentProtection" => parse_content_protection(child, &mut base.content_protection)?,
            "EssentialProperty" => base.essential_property.push(parse_descriptor(child)?),
            "SupplementalProperty" => base.supplemental_property.push(parse_descriptor(child)?),
            _ => {}
        }
    }

    Ok(base)
}

pub(crate) fn derive_caps(base: &mut RepresentationBase) {
    base.caps = MediaCaps::derive(base.codecs.as_deref(), base.mime_type.as_deref());
}

pub(crate) fn parse_representation(
    element: &XmlElement,
    adaptation_set: &AdaptationSet,
    period: &Period,
) -> MpdResult<Representation> {
    let id = element
        .attr_string("id")
        .ok_or(MpdError::MissingMandatoryField {
            element: "Representation",
            field: "id",
        })?;
    let bandwidth = element
        .attr_u64("bandwidth")?
        .ok_or(MpdError::MissingMandatoryField {
            element: "Representation",
            field: "bandwidth",
        })?;

    let mut representation_base = parse_representation_base(element)?;
    representation_base.inherit_from(&adaptation_set.representation_base);
    derive_caps(&mut representation_base);

    let mut representation = Representation {
        id,
        bandwidth,
        quality_ranking: element.attr_u32("qualityRanking")?,
        dependency_id: element.attr_string_vec("dependencyId").unwrap_or_default(),
        media_stream_structure_id: element
            .attr_string_vec("mediaStreamStructureId")
            .unwrap_or_default(),
        representation_base,
        ..Default::default()
    };

    for child in element.elements() {
        match child.local_name() {
            "BaseURL" => representation.base_urls.push(parse_base_url(child)),
            "SegmentBase" => {
                let parent = adaptation_set
                    .segment_base
                    .as_ref()
                    .or(period.segment_base.as_ref());
                representation.segment_base = Some(parse_segment_base(child, parent)?);
            }
            "SegmentList" => {
                let parent = adaptation_set
                    .segment_list
                    .as_ref()
                    .or(period.segment_list.as_ref());
                let segment_list = parse_segment_list(child, parent)?;
                // a single url covers the whole period and needs no timing
                if !segment_list.mult_segment_base.has_timing()
                    && segment_list.segment_urls.len() > 1
                {
                    return Err(MpdError::NoAddressingScheme(format!(
                        "SegmentList of representation {} has neither duration nor SegmentTimeline",
                        representation.id
                    )));
                }
                representation.segment_list = Some(segment_list);
            }
            "SegmentTemplate" => {
                let parent = adaptation_set
                    .segment_template
                    .as_ref()
                    .or(period.segment_template.as_ref());
                let segment_template = parse_segment_template(child, parent)?;
                if !segment_template.mult_segment_base.has_timing() {
                    return Err(MpdError::NoAddressingScheme(format!(
                        "SegmentTemplate of representation {} has neither duration nor SegmentTimeline",
                        representation.id
                    )));
                }
                representation.segment_template = Some(segment_template);
            }
            "SubRepresentation" => {
                let sub_representation =
                    parse_sub_representation(child, &representation.representation_base)?;
                representation.sub_representations.push(sub_representation);
            }
            _ => {}
        }
    }

    Ok(representation)
}

fn parse_sub_representation(
    element: &XmlElement,
    parent: &RepresentationBase,
) -> MpdResult<SubRepresentation> {
    let mut representation_base = parse_representation_base(element)?;
    representation_base.inherit_from(parent);
    derive_caps(&mut representation_base);

    Ok(SubRepresentation {
        level: element.attr_u32("level")?,
        dependency_level: element.attr_u32_vec("dependencyLevel")?.unwrap_or_default(),
        bandwidth: element.attr_u32("bandwidth")?,
        content_component: element
            .attr_string_vec("contentComponent")
            .unwrap_or_default(),
        representation_base,
    })
}
