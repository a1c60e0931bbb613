use std::time::Duration;

use url::Url;

use crate::types::ByteRange;

/// One fetchable resource of a stream, handed to the downstream fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRequest {
    pub uri: Url,
    pub range: Option<ByteRange>,

    pub index_uri: Option<Url>,
    pub index_range: Option<ByteRange>,

    /// Presentation time of the first sample.
    pub timestamp: Duration,
    pub duration: Duration,

    /// Set on the first request after a seek or a gap in the timeline.
    pub discontinuity: bool,

    /// $Number$, 0 for initialization and index requests.
    pub number: u64,
    /// $Time$, in timescale units.
    pub time: Option<u64>,
}

impl SegmentRequest {
    pub(crate) fn new(uri: Url, timestamp: Duration) -> Self {
        Self {
            uri,
            range: None,
            index_uri: None,
            index_range: None,
            timestamp,
            duration: Duration::ZERO,
            discontinuity: false,
            number: 0,
            time: None,
        }
    }

    /// Value of the `Range` header, if the request is partial.
    pub fn http_range(&self) -> Option<String> {
        self.range.map(|range| range.to_http_range())
    }

    pub fn index_http_range(&self) -> Option<String> {
        self.index_range.map(|range| range.to_http_range())
    }

    /// Last path segment of the uri, used as a file name by downloaders.
    pub fn file_name(&self) -> &str {
        self.uri
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("segment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_range() {
        let mut request = SegmentRequest::new(
            Url::parse("https://example.com/video/1.m4s?token=1").unwrap(),
            Duration::ZERO,
        );
        assert_eq!(request.http_range(), None);
        assert_eq!(request.file_name(), "1.m4s");

        request.range = Some(ByteRange::new(100, Some(199)));
        request.index_range = Some(ByteRange::new(0, None));
        assert_eq!(request.http_range().as_deref(), Some("bytes=100-199"));
        assert_eq!(request.index_http_range().as_deref(), Some("bytes=0-"));
    }
}
