use super::ToXml;
use crate::xml::XmlElement;

/// One `BaseURL` alternative. Several entries on the same level are mirrors of the same
/// content, told apart by `@serviceLocation`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseUrl {
    pub base_url: String,
    pub service_location: Option<String>,
    pub byte_range: Option<String>,
    pub availability_time_offset: Option<String>,
}

impl BaseUrl {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl ToXml for BaseUrl {
    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new("BaseURL");
        element
            .set_attr_opt("serviceLocation", self.service_location.as_deref())
            .set_attr_opt("byteRange", self.byte_range.as_deref())
            .set_attr_opt(
                "availabilityTimeOffset",
                self.availability_time_offset.as_deref(),
            )
            .push_text(self.base_url.as_str());
        element
    }
}
