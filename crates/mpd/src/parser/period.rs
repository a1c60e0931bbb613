use super::{
    adaptation_set::parse_adaptation_set,
    descriptor::parse_base_url,
    lenient,
    segment::{parse_segment_base, parse_segment_list, parse_segment_template},
};
use crate::{
    error::MpdResult,
    node::{Period, Subset, Xlink},
    xml::XmlElement,
};

pub(crate) fn parse_period(element: &XmlElement) -> MpdResult<Period> {
    let mut period = Period {
        xlink: Xlink::from_element(element),
        id: element.attr_string("id"),
        start: element.attr_duration("start")?,
        duration: element.attr_duration("duration")?,
        bitstream_switching: lenient(element.attr_bool("bitstreamSwitching")).unwrap_or(false),
        ..Default::default()
    };

    for child in element.elements() {
        match child.local_name() {
            "BaseURL" => period.base_urls.push(parse_base_url(child)),
            "SegmentBase" => period.segment_base = Some(parse_segment_base(child, None)?),
            "SegmentList" => period.segment_list = Some(parse_segment_list(child, None)?),
            "SegmentTemplate" => {
                period.segment_template = Some(parse_segment_template(child, None)?);
            }
            "Subset" => period.subsets.push(Subset {
                contains: element_contains(child)?,
                id: child.attr_string("id"),
            }),
            _ => {}
        }
    }

    let mut adaptation_sets = Vec::new();
    for child in element.elements_named("AdaptationSet") {
        match parse_adaptation_set(child, &period) {
            Ok(adaptation_set) => adaptation_sets.push(adaptation_set),
            Err(e) => log::warn!("Dropping adaptation set: {e}"),
        }
    }
    period.adaptation_sets = adaptation_sets;

    Ok(period)
}

fn element_contains(element: &XmlElement) -> MpdResult<Vec<u32>> {
    Ok(element.attr_u32_vec("contains")?.unwrap_or_default())
}
