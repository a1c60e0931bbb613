use super::lenient;
use crate::{
    error::{MpdError, MpdResult},
    node::{
        MultSegmentBase, SNode, SegmentBase, SegmentList, SegmentTemplate, SegmentTimeline,
        SegmentUrl, UrlType, Xlink,
    },
    xml::XmlElement,
};

pub(crate) fn parse_url_type(element: &XmlElement) -> MpdResult<UrlType> {
    Ok(UrlType {
        node_name: element.local_name().to_string(),
        source_url: element.attr_string("sourceURL"),
        range: element.attr_parsed("range")?,
    })
}

/// A `SegmentBase` starts as a copy of the parent one and is overridden by every
/// attribute the element carries.
pub(crate) fn parse_segment_base(
    element: &XmlElement,
    parent: Option<&SegmentBase>,
) -> MpdResult<SegmentBase> {
    let mut node = parent.cloned().unwrap_or_default();
    apply_segment_base(element, &mut node)?;
    Ok(node)
}

fn apply_segment_base(element: &XmlElement, node: &mut SegmentBase) -> MpdResult<()> {
    let timescale = lenient(element.attr_u32("timescale"));
    match timescale {
        Some(0) => log::warn!("Ignoring zero timescale"),
        Some(timescale) => node.timescale = timescale,
        None => {}
    }
    if let Some(offset) = lenient(element.attr_u64("presentationTimeOffset")) {
        node.presentation_time_offset = offset;
    }
    if let Some(range) = element.attr_parsed("indexRange")? {
        node.index_range = Some(range);
    }
    if let Some(exact) = lenient(element.attr_bool("indexRangeExact")) {
        node.index_range_exact = exact;
    }
    if let Some(offset) = element.attr_f64("availabilityTimeOffset")? {
        node.availability_time_offset = Some(offset);
    }
    if let Some(complete) = lenient(element.attr_bool("availabilityTimeComplete")) {
        node.availability_time_complete = Some(complete);
    }

    for child in element.elements() {
        match child.local_name() {
            "Initialization" | "Initialisation" => {
                node.initialization = Some(parse_url_type(child)?);
            }
            "RepresentationIndex" => {
                node.representation_index = Some(parse_url_type(child)?);
            }
            _ => {}
        }
    }
    Ok(())
}

pub(crate) fn parse_mult_segment_base(
    element: &XmlElement,
    parent: Option<&MultSegmentBase>,
) -> MpdResult<MultSegmentBase> {
    let mut node = parent.cloned().unwrap_or_default();
    apply_segment_base(element, &mut node.segment_base)?;

    if let Some(duration) = element.attr_u64("duration")? {
        node.duration = Some(duration);
    }
    if let Some(start_number) = lenient(element.attr_u64("startNumber")) {
        node.start_number = start_number;
    }

    for child in element.elements() {
        match child.local_name() {
            // own timeline replaces the inherited one
            "SegmentTimeline" => node.segment_timeline = Some(parse_segment_timeline(child)?),
            "BitstreamSwitching" => node.bitstream_switching = Some(parse_url_type(child)?),
            _ => {}
        }
    }
    Ok(node)
}

pub(crate) fn parse_segment_list(
    element: &XmlElement,
    parent: Option<&SegmentList>,
) -> MpdResult<SegmentList> {
    let mult_segment_base =
        parse_mult_segment_base(element, parent.map(|p| &p.mult_segment_base))?;

    let own_urls = element
        .elements_named("SegmentURL")
        .map(parse_segment_url)
        .collect::<MpdResult<Vec<_>>>()?;
    // lower level urls win completely, they are never merged with the parent ones
    let segment_urls = match parent {
        Some(parent) if own_urls.is_empty() => parent.segment_urls.clone(),
        _ => own_urls,
    };

    Ok(SegmentList {
        mult_segment_base,
        segment_urls,
        xlink: Xlink::from_element(element),
    })
}

pub(crate) fn parse_segment_template(
    element: &XmlElement,
    parent: Option<&SegmentTemplate>,
) -> MpdResult<SegmentTemplate> {
    let mult_segment_base =
        parse_mult_segment_base(element, parent.map(|p| &p.mult_segment_base))?;

    let template = |name: &str, inherited: Option<&String>| -> MpdResult<Option<String>> {
        let own = element.attr_with(name, |value| {
            if value.chars().any(char::is_whitespace) {
                Err(MpdError::invalid_format("template", value))
            } else {
                Ok(value.to_string())
            }
        })?;
        Ok(own.or_else(|| inherited.cloned()))
    };

    Ok(SegmentTemplate {
        media: template("media", parent.and_then(|p| p.media.as_ref()))?,
        index: template("index", parent.and_then(|p| p.index.as_ref()))?,
        initialization: template(
            "initialization",
            parent.and_then(|p| p.initialization.as_ref()),
        )?,
        bitstream_switching: template(
            "bitstreamSwitching",
            parent.and_then(|p| p.bitstream_switching.as_ref()),
        )?,
        mult_segment_base,
    })
}

pub(crate) fn parse_segment_timeline(element: &XmlElement) -> MpdResult<SegmentTimeline> {
    let s = element
        .elements_named("S")
        .map(|s| {
            let d = s
                .attr_u64("d")?
                .ok_or(MpdError::MissingMandatoryField {
                    element: "S",
                    field: "d",
                })?;
            let r = s
                .attr_with("r", |value| {
                    value
                        .trim()
                        .parse::<i64>()
                        .ok()
                        .filter(|r| *r >= -1)
                        .ok_or_else(|| MpdError::invalid_format("repeat count", value))
                })?
                .unwrap_or(0);
            Ok(SNode::new(s.attr_u64("t")?, d, r))
        })
        .collect::<MpdResult<Vec<_>>>()?;
    Ok(SegmentTimeline { s })
}

pub(crate) fn parse_segment_url(element: &XmlElement) -> MpdResult<SegmentUrl> {
    Ok(SegmentUrl {
        media: element.attr_string("media"),
        media_range: element.attr_parsed("mediaRange")?,
        index: element.attr_string("index"),
        index_range: element.attr_parsed("indexRange")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{types::ByteRange, xml::parse_document};

    #[test]
    fn test_segment_template_inherits_unset_fields() {
        let parent = parse_segment_template(
            &parse_document(
                br#"<SegmentTemplate timescale="1000" duration="4000" startNumber="5"
                    media="$Number$.m4s" initialization="init.mp4"/>"#,
            )
            .unwrap(),
            None,
        )
        .unwrap();

        let child = parse_segment_template(
            &parse_document(br#"<SegmentTemplate media="$RepresentationID$/$Number$.m4s"/>"#)
                .unwrap(),
            Some(&parent),
        )
        .unwrap();

        assert_eq!(child.media.as_deref(), Some("$RepresentationID$/$Number$.m4s"));
        assert_eq!(child.initialization.as_deref(), Some("init.mp4"));
        assert_eq!(child.mult_segment_base.segment_base.timescale, 1000);
        assert_eq!(child.mult_segment_base.duration, Some(4000));
        assert_eq!(child.mult_segment_base.start_number, 5);
        // the parent is untouched
        assert_eq!(parent.media.as_deref(), Some("$Number$.m4s"));
    }

    #[test]
    fn test_segment_list_urls_are_replaced() {
        let parent = parse_segment_list(
            &parse_document(
                br#"<SegmentList duration="10"><SegmentURL media="a.ts"/><SegmentURL media="b.ts"/></SegmentList>"#,
            )
            .unwrap(),
            None,
        )
        .unwrap();

        let inherited = parse_segment_list(
            &parse_document(br#"<SegmentList timescale="10"/>"#).unwrap(),
            Some(&parent),
        )
        .unwrap();
        assert_eq!(inherited.segment_urls.len(), 2);
        assert_eq!(inherited.mult_segment_base.duration, Some(10));

        let own = parse_segment_list(
            &parse_document(
                br#"<SegmentList><SegmentURL media="c.ts" mediaRange="0-99"/></SegmentList>"#,
            )
            .unwrap(),
            Some(&parent),
        )
        .unwrap();
        assert_eq!(own.segment_urls.len(), 1);
        assert_eq!(own.segment_urls[0].media.as_deref(), Some("c.ts"));
        assert_eq!(
            own.segment_urls[0].media_range,
            Some(ByteRange::new(0, Some(99)))
        );
    }

    #[test]
    fn test_segment_timeline() {
        let timeline = parse_segment_timeline(
            &parse_document(
                br#"<SegmentTimeline><S t="0" d="1000" r="2"/><S d="500"/><S d="10" r="-1"/></SegmentTimeline>"#,
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(
            timeline.s,
            vec![
                SNode::new(Some(0), 1000, 2),
                SNode::new(None, 500, 0),
                SNode::new(None, 10, -1),
            ]
        );

        for invalid in [
            r#"<SegmentTimeline><S t="0"/></SegmentTimeline>"#,
            r#"<SegmentTimeline><S d="1" r="-2"/></SegmentTimeline>"#,
            r#"<SegmentTimeline><S d="-1"/></SegmentTimeline>"#,
        ] {
            let element = parse_document(invalid.as_bytes()).unwrap();
            assert!(parse_segment_timeline(&element).is_err(), "{invalid}");
        }
    }

    #[test]
    fn test_segment_base_defaults() {
        let base = parse_segment_base(
            &parse_document(
                br#"<SegmentBase indexRange="100-200" timescale="abc"><Initialization range="0-99"/></SegmentBase>"#,
            )
            .unwrap(),
            None,
        )
        .unwrap();
        // malformed timescale keeps the schema default
        assert_eq!(base.timescale, 1);
        assert_eq!(base.index_range, Some(ByteRange::new(100, Some(200))));
        assert_eq!(
            base.initialization.unwrap().range,
            Some(ByteRange::new(0, Some(99)))
        );
    }
}
