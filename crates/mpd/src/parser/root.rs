use super::{
    descriptor::{parse_base_url, parse_descriptor},
    lenient,
    period::parse_period,
};
use crate::{
    error::{MpdError, MpdResult},
    node::{Metrics, MetricsRange, Mpd, MpdType, ProgramInformation, UtcTiming, UtcTimingMethod},
    types::XsDateTime,
    xml::XmlElement,
};

pub(crate) fn parse_mpd(element: &XmlElement) -> MpdResult<Mpd> {
    if element.local_name() != "MPD" {
        return Err(MpdError::NotMpd(element.name.clone()));
    }

    let mpd_type = lenient(element.attr_with("type", |value| match value.trim() {
        "static" => Ok(MpdType::Static),
        "dynamic" => Ok(MpdType::Dynamic),
        _ => Err(MpdError::invalid_format("presentation type", value)),
    }))
    .unwrap_or_default();

    let mut mpd = Mpd {
        namespaces: element
            .attributes
            .iter()
            .filter(|attr| attr.name == "xmlns" || attr.name.starts_with("xmlns:"))
            .map(|attr| (attr.name.clone(), attr.value.clone()))
            .collect(),
        schema_location: element
            .attributes
            .iter()
            .find(|attr| attr.local_name() == "schemaLocation")
            .map(|attr| attr.value.clone()),
        id: element.attr_string("id"),
        profiles: element.attr_string("profiles"),
        mpd_type,
        availability_start_time: element.attr_parsed::<XsDateTime>("availabilityStartTime")?,
        availability_end_time: element.attr_parsed::<XsDateTime>("availabilityEndTime")?,
        publish_time: element.attr_parsed::<XsDateTime>("publishTime")?,
        media_presentation_duration: element.attr_duration("mediaPresentationDuration")?,
        minimum_update_period: element.attr_duration("minimumUpdatePeriod")?,
        min_buffer_time: element.attr_duration("minBufferTime")?,
        time_shift_buffer_depth: element.attr_duration("timeShiftBufferDepth")?,
        suggested_presentation_delay: element.attr_duration("suggestedPresentationDelay")?,
        max_segment_duration: element.attr_duration("maxSegmentDuration")?,
        max_subsegment_duration: element.attr_duration("maxSubsegmentDuration")?,
        ..Default::default()
    };

    for child in element.elements() {
        match child.local_name() {
            "Period" => match parse_period(child) {
                Ok(period) => mpd.periods.push(period),
                Err(e) => log::warn!(
                    "Dropping period {:?}: {e}",
                    child.attribute("id").unwrap_or_default()
                ),
            },
            "BaseURL" => mpd.base_urls.push(parse_base_url(child)),
            "Location" => mpd.locations.push(child.text().trim().to_string()),
            "ProgramInformation" => mpd
                .program_informations
                .push(parse_program_information(child)),
            "Metrics" => mpd.metrics.push(parse_metrics(child)?),
            "UTCTiming" => {
                if let Some(timing) = parse_utc_timing(child) {
                    mpd.utc_timings.push(timing);
                }
            }
            _ => {}
        }
    }

    if mpd.is_dynamic() && mpd.availability_start_time.is_none() {
        // accepted here, the live edge tracker refuses to work without it
        log::warn!("Dynamic MPD without availabilityStartTime");
    }

    Ok(mpd)
}

fn parse_program_information(element: &XmlElement) -> ProgramInformation {
    let text_of = |name: &str| element.elements_named(name).next().map(XmlElement::text);
    ProgramInformation {
        lang: element.attr_string("lang"),
        more_information_url: element.attr_string("moreInformationURL"),
        title: text_of("Title"),
        source: text_of("Source"),
        copyright: text_of("Copyright"),
    }
}

fn parse_metrics(element: &XmlElement) -> MpdResult<Metrics> {
    let mut metrics = Metrics {
        metrics: element.attr_string("metrics").unwrap_or_default(),
        ..Default::default()
    };
    for child in element.elements() {
        match child.local_name() {
            "Range" => metrics.ranges.push(MetricsRange {
                starttime: child.attr_duration("starttime")?,
                duration: child.attr_duration("duration")?,
            }),
            "Reporting" => metrics.reportings.push(parse_descriptor(child)?),
            _ => {}
        }
    }
    Ok(metrics)
}

fn parse_utc_timing(element: &XmlElement) -> Option<UtcTiming> {
    let scheme = element.attribute("schemeIdUri")?.trim();
    let Some(method) = UtcTimingMethod::from_scheme(scheme) else {
        log::warn!("Ignoring UTCTiming with unknown scheme {scheme:?}");
        return None;
    };
    let urls = element.attr_string_vec("value").unwrap_or_default();
    Some(UtcTiming { method, urls })
}
