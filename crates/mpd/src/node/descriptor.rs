use super::ToXml;
use crate::xml::XmlElement;

/// Uniform representation of `DescriptorType` elements such as `Role`, `Accessibility`,
/// `ContentProtection` or `AudioChannelConfiguration`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    /// Local name of the element the descriptor was read from.
    pub node_name: String,
    pub scheme_id_uri: Option<String>,
    /// `@value`, or the serialized element when the attribute is absent.
    pub value: Option<String>,
    pub id: Option<String>,
    /// The element as written, kept when its content carries the payload.
    pub source: Option<XmlElement>,
}

impl Descriptor {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Default::default()
        }
    }

    pub fn with_scheme(mut self, scheme_id_uri: impl Into<String>) -> Self {
        self.scheme_id_uri = Some(scheme_id_uri.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn is_scheme(&self, scheme_id_uri: &str) -> bool {
        self.scheme_id_uri
            .as_deref()
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case(scheme_id_uri))
    }
}

impl ToXml for Descriptor {
    fn to_xml(&self) -> XmlElement {
        if let Some(source) = &self.source {
            return source.clone();
        }

        let mut element = XmlElement::new(self.node_name.as_str());
        element
            .set_attr_opt("schemeIdUri", self.scheme_id_uri.as_deref())
            .set_attr_opt("value", self.value.as_deref())
            .set_attr_opt("id", self.id.as_deref());
        element
    }
}
