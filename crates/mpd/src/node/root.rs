use serde::{Deserialize, Serialize};

use super::{push_all, text_element, BaseUrl, Descriptor, Period, ToXml};
use crate::{
    error::MpdResult,
    types::{format_duration, XsDateTime},
    xml::{XmlElement, XLINK_NAMESPACE},
};

pub const MPD_NAMESPACE: &str = "urn:mpeg:dash:schema:mpd:2011";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MpdType {
    #[default]
    Static,
    Dynamic,
}

impl MpdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

/// Root of a parsed manifest. Durations are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mpd {
    /// `xmlns` declarations of the root element as `(attribute name, uri)`.
    pub namespaces: Vec<(String, String)>,
    pub schema_location: Option<String>,
    pub id: Option<String>,
    pub profiles: Option<String>,
    pub mpd_type: MpdType,
    pub availability_start_time: Option<XsDateTime>,
    pub availability_end_time: Option<XsDateTime>,
    pub publish_time: Option<XsDateTime>,
    pub media_presentation_duration: Option<u64>,
    pub minimum_update_period: Option<u64>,
    pub min_buffer_time: Option<u64>,
    pub time_shift_buffer_depth: Option<u64>,
    pub suggested_presentation_delay: Option<u64>,
    pub max_segment_duration: Option<u64>,
    pub max_subsegment_duration: Option<u64>,

    pub base_urls: Vec<BaseUrl>,
    pub locations: Vec<String>,
    pub program_informations: Vec<ProgramInformation>,
    pub periods: Vec<Period>,
    pub metrics: Vec<Metrics>,
    pub utc_timings: Vec<UtcTiming>,
}

impl Mpd {
    pub fn is_dynamic(&self) -> bool {
        self.mpd_type == MpdType::Dynamic
    }

    /// Serialize the whole tree as an XML document.
    pub fn to_xml_string(&self) -> MpdResult<String> {
        self.to_xml().to_document_string()
    }
}

impl ToXml for Mpd {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("MPD");
        for (name, uri) in &self.namespaces {
            element.set_attr(name, uri);
        }
        if element.attribute("xmlns").is_none() {
            element.set_attr("xmlns", MPD_NAMESPACE);
        }
        if element.attribute("xmlns:xlink").is_none() {
            element.set_attr("xmlns:xlink", XLINK_NAMESPACE);
        }

        element
            .set_attr_opt("xsi:schemaLocation", self.schema_location.as_deref())
            .set_attr_opt("id", self.id.as_deref())
            .set_attr_opt("profiles", self.profiles.as_deref())
            .set_attr("type", self.mpd_type.as_str())
            .set_attr_opt("availabilityStartTime", self.availability_start_time)
            .set_attr_opt("availabilityEndTime", self.availability_end_time)
            .set_attr_opt("publishTime", self.publish_time);
        for (name, value) in [
            ("mediaPresentationDuration", self.media_presentation_duration),
            ("minimumUpdatePeriod", self.minimum_update_period),
            ("minBufferTime", self.min_buffer_time),
            ("timeShiftBufferDepth", self.time_shift_buffer_depth),
            ("suggestedPresentationDelay", self.suggested_presentation_delay),
            ("maxSegmentDuration", self.max_segment_duration),
            ("maxSubsegmentDuration", self.max_subsegment_duration),
        ] {
            element.set_attr_opt(name, value.map(format_duration));
        }

        push_all(&mut element, &self.program_informations);
        push_all(&mut element, &self.base_urls);
        for location in &self.locations {
            element.push_child(text_element("Location", location));
        }
        push_all(&mut element, &self.periods);
        push_all(&mut element, &self.metrics);
        push_all(&mut element, &self.utc_timings);
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInformation {
    pub lang: Option<String>,
    pub more_information_url: Option<String>,
    pub title: Option<String>,
    pub source: Option<String>,
    pub copyright: Option<String>,
}

impl ToXml for ProgramInformation {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("ProgramInformation");
        element
            .set_attr_opt("lang", self.lang.as_deref())
            .set_attr_opt("moreInformationURL", self.more_information_url.as_deref());
        for (name, text) in [
            ("Title", &self.title),
            ("Source", &self.source),
            ("Copyright", &self.copyright),
        ] {
            if let Some(text) = text {
                element.push_child(text_element(name, text));
            }
        }
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    pub metrics: String,
    pub ranges: Vec<MetricsRange>,
    pub reportings: Vec<Descriptor>,
}

impl ToXml for Metrics {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("Metrics");
        element.set_attr("metrics", &self.metrics);
        push_all(&mut element, &self.ranges);
        push_all(&mut element, &self.reportings);
        element
    }
}

/// Milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsRange {
    pub starttime: Option<u64>,
    pub duration: Option<u64>,
}

impl ToXml for MetricsRange {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("Range");
        element
            .set_attr_opt("starttime", self.starttime.map(format_duration))
            .set_attr_opt("duration", self.duration.map(format_duration));
        element
    }
}

/// Clock synchronisation methods of `UTCTiming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UtcTimingMethod {
    Ntp,
    Sntp,
    HttpHead,
    HttpXsdate,
    HttpIso,
    HttpNtp,
    Direct,
}

impl UtcTimingMethod {
    const ALL: [Self; 7] = [
        Self::Ntp,
        Self::Sntp,
        Self::HttpHead,
        Self::HttpXsdate,
        Self::HttpIso,
        Self::HttpNtp,
        Self::Direct,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::Ntp => "ntp",
            Self::Sntp => "sntp",
            Self::HttpHead => "http-head",
            Self::HttpXsdate => "http-xsdate",
            Self::HttpIso => "http-iso",
            Self::HttpNtp => "http-ntp",
            Self::Direct => "direct",
        }
    }

    /// Accepts the 2014 schemes and the 2012 drafts some servers still emit.
    pub fn from_scheme(scheme_id_uri: &str) -> Option<Self> {
        let rest = scheme_id_uri.strip_prefix("urn:mpeg:dash:utc:")?;
        let name = rest
            .strip_suffix(":2014")
            .or_else(|| rest.strip_suffix(":2012"))?;
        Self::ALL.into_iter().find(|method| method.name() == name)
    }

    pub fn scheme_id_uri(&self) -> String {
        format!("urn:mpeg:dash:utc:{}:2014", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtcTiming {
    pub method: UtcTimingMethod,
    /// `@value` split on whitespace: server urls, or the time itself for DIRECT.
    pub urls: Vec<String>,
}

impl ToXml for UtcTiming {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("UTCTiming");
        element
            .set_attr("schemeIdUri", self.method.scheme_id_uri())
            .set_attr("value", self.urls.join(" "));
        element
    }
}
