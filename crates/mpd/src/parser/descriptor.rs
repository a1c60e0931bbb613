use crate::{
    error::MpdResult,
    node::{BaseUrl, Descriptor},
    xml::XmlElement,
};

const DESCRIPTOR_ATTRIBUTES: [&str; 3] = ["schemeIdUri", "value", "id"];

pub(crate) fn parse_descriptor(element: &XmlElement) -> MpdResult<Descriptor> {
    let value = match element.attr_string("value") {
        Some(value) => value,
        // keep opaque payloads such as pssh boxes as the serialized element
        None => element.to_xml_string()?,
    };

    let has_payload = !element.children.is_empty()
        || element
            .attributes
            .iter()
            .any(|attr| !DESCRIPTOR_ATTRIBUTES.contains(&attr.name.as_str()));

    Ok(Descriptor {
        node_name: element.local_name().to_string(),
        scheme_id_uri: element
            .attr_string("schemeIdUri")
            .map(|scheme| scheme.trim().to_string()),
        value: Some(value),
        id: element.attr_string("id"),
        source: has_payload.then(|| element.clone()),
    })
}

/// PlayReady signals `value="MSPR 2.0"` and carries its header in a nested `pro` element,
/// the descriptor then takes the text of that element as value.
pub(crate) fn parse_content_protection(
    element: &XmlElement,
    list: &mut Vec<Descriptor>,
) -> MpdResult<()> {
    if element.attribute("value") != Some("MSPR 2.0") {
        list.push(parse_descriptor(element)?);
        return Ok(());
    }

    match element.elements_named("pro").next() {
        Some(pro) => list.push(Descriptor {
            node_name: pro.local_name().to_string(),
            scheme_id_uri: element
                .attr_string("schemeIdUri")
                .map(|scheme| scheme.trim().to_string()),
            value: Some(pro.text()),
            id: None,
            source: None,
        }),
        None => log::warn!("MSPR 2.0 ContentProtection without pro element"),
    }
    Ok(())
}

pub(crate) fn parse_base_url(element: &XmlElement) -> BaseUrl {
    BaseUrl {
        base_url: element.text().trim().to_string(),
        service_location: element.attr_string("serviceLocation"),
        byte_range: element.attr_string("byteRange"),
        availability_time_offset: element.attr_string("availabilityTimeOffset"),
    }
}
