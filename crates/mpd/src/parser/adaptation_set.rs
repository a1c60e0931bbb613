use super::{
    descriptor::{parse_base_url, parse_descriptor},
    lenient,
    representation::{derive_caps, parse_representation, parse_representation_base, parse_sap_type},
    segment::{parse_segment_base, parse_segment_list, parse_segment_template},
};
use crate::{
    error::MpdResult,
    node::{AdaptationSet, ContentComponent, Period, Xlink},
    xml::XmlElement,
};

pub(crate) fn parse_adaptation_set(
    element: &XmlElement,
    period: &Period,
) -> MpdResult<AdaptationSet> {
    let mut representation_base = parse_representation_base(element)?;
    derive_caps(&mut representation_base);

    let mut adaptation_set = AdaptationSet {
        xlink: Xlink::from_element(element),
        id: element.attr_u32("id")?,
        group: element.attr_u32("group")?,
        lang: element.attr_string("lang"),
        content_type: element.attr_string("contentType"),
        par: element.attr_parsed("par")?,
        min_bandwidth: element.attr_u32("minBandwidth")?,
        max_bandwidth: element.attr_u32("maxBandwidth")?,
        min_width: element.attr_u32("minWidth")?,
        max_width: element.attr_u32("maxWidth")?,
        min_height: element.attr_u32("minHeight")?,
        max_height: element.attr_u32("maxHeight")?,
        segment_alignment: lenient(element.attr_parsed("segmentAlignment")),
        subsegment_alignment: lenient(element.attr_parsed("subsegmentAlignment")),
        subsegment_starts_with_sap: parse_sap_type(element, "subsegmentStartsWithSAP"),
        bitstream_switching: lenient(element.attr_bool("bitstreamSwitching"))
            .or_else(|| period.bitstream_switching.then_some(true)),
        representation_base,
        ..Default::default()
    };

    for child in element.elements() {
        match child.local_name() {
            "Accessibility" => adaptation_set.accessibility.push(parse_descriptor(child)?),
            "Role" => adaptation_set.role.push(parse_descriptor(child)?),
            "Rating" => adaptation_set.rating.push(parse_descriptor(child)?),
            "Viewpoint" => adaptation_set.viewpoint.push(parse_descriptor(child)?),
            "ContentComponent" => adaptation_set
                .content_components
                .push(parse_content_component(child)?),
            "BaseURL" => adaptation_set.base_urls.push(parse_base_url(child)),
            "SegmentBase" => {
                adaptation_set.segment_base =
                    Some(parse_segment_base(child, period.segment_base.as_ref())?);
            }
            "SegmentList" => {
                adaptation_set.segment_list =
                    Some(parse_segment_list(child, period.segment_list.as_ref())?);
            }
            "SegmentTemplate" => {
                adaptation_set.segment_template =
                    Some(parse_segment_template(child, period.segment_template.as_ref())?);
            }
            _ => {}
        }
    }

    // representations see the complete state of this adaptation set
    let mut representations = Vec::new();
    for child in element.elements_named("Representation") {
        match parse_representation(child, &adaptation_set, period) {
            Ok(representation) => representations.push(representation),
            Err(e) => log::warn!(
                "Dropping representation {:?}: {e}",
                child.attribute("id").unwrap_or_default()
            ),
        }
    }
    adaptation_set.representations = representations;

    Ok(adaptation_set)
}

fn parse_content_component(element: &XmlElement) -> MpdResult<ContentComponent> {
    let mut component = ContentComponent {
        id: element.attr_u32("id")?,
        lang: element.attr_string("lang"),
        content_type: element.attr_string("contentType"),
        par: element.attr_parsed("par")?,
        ..Default::default()
    };

    for child in element.elements() {
        match child.local_name() {
            "Accessibility" => component.accessibility.push(parse_descriptor(child)?),
            "Role" => component.role.push(parse_descriptor(child)?),
            "Rating" => component.rating.push(parse_descriptor(child)?),
            "Viewpoint" => component.viewpoint.push(parse_descriptor(child)?),
            _ => {}
        }
    }
    Ok(component)
}
