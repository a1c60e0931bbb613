use thiserror::Error;

#[derive(Error, Debug)]
pub enum MpdError {
    #[error("Invalid {kind} value: {value:?}")]
    InvalidFormat { kind: &'static str, value: String },

    #[error("Invalid attribute {element}@{attribute}: {source}")]
    InvalidAttribute {
        element: String,
        attribute: String,
        #[source]
        source: Box<MpdError>,
    },

    #[error("Missing mandatory {element}@{field}")]
    MissingMandatoryField {
        element: &'static str,
        field: &'static str,
    },

    #[error("No addressing scheme: {0}")]
    NoAddressingScheme(String),

    // Structural errors
    #[error("Root element is not MPD: {0}")]
    NotMpd(String),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Unbalanced XML document")]
    UnbalancedXml,

    #[error("Unsupported document encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("xlink resolution of {href} failed: {reason}")]
    XlinkResolution { href: String, reason: String },

    #[error("Unresolved xlink placeholder: {0}")]
    UnresolvedXlink(String),

    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid base url")]
    InvalidBaseUrl,

    #[error("Invalid timing schema: {0:?}")]
    InvalidTimingSchema(String),

    #[error("Date time parsing error: {0}")]
    DateTimeParsing(String),

    #[error(transparent)]
    ChronoParseError(#[from] chrono::ParseError),

    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    #[error("No period found")]
    NoPeriodFound,

    #[error("No adaptation set found")]
    NoAdaptationSetFound,

    #[error("No representation found")]
    NoRepresentationFound,

    #[error("Segment index {0} is out of range")]
    SegmentOutOfRange(u64),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

impl MpdError {
    pub(crate) fn invalid_format(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidFormat {
            kind,
            value: value.into(),
        }
    }

    /// Whether the error describes an unusable manifest rather than a transport problem.
    pub fn is_manifest_invalid(&self) -> bool {
        matches!(
            self,
            Self::NotMpd(_)
                | Self::Xml(_)
                | Self::XmlAttr(_)
                | Self::Utf8(_)
                | Self::UnbalancedXml
                | Self::UnsupportedEncoding(_)
                | Self::InvalidAttribute { .. }
                | Self::MissingMandatoryField { .. }
        )
    }
}

pub type MpdResult<T> = Result<T, MpdError>;
