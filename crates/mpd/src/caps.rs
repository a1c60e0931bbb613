//! Capability descriptors derived from `@codecs` and `@mimeType`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad kind of a stream, used to pick adaptation sets and per-type limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Video,
    Audio,
    Text,
    Application,
}

impl StreamType {
    /// Top-level media type of a `contentType` or `mimeType` value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let top_level = content_type.split('/').next()?.trim();
        match top_level {
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "text" => Some(Self::Text),
            "application" if is_subtitle_mime(content_type) => Some(Self::Text),
            "application" => Some(Self::Application),
            _ => None,
        }
    }
}

fn is_subtitle_mime(mime_type: &str) -> bool {
    matches!(
        mime_type.trim(),
        "application/ttml+xml" | "application/x-sami" | "application/x-subtitle-vtt"
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCaps {
    /// Media type understood by decoders, e.g. `video/x-h264`.
    pub media_type: String,
    pub stream_type: StreamType,
    /// The codec string the caps were derived from.
    pub codec: Option<String>,
}

impl MediaCaps {
    /// Derive caps, `codecs` takes priority over `mime_type`.
    pub fn derive(codecs: Option<&str>, mime_type: Option<&str>) -> Option<Self> {
        codecs
            .and_then(Self::from_codecs)
            .or_else(|| mime_type.and_then(Self::from_mime_type))
    }

    /// RFC 6381 codec list. Muxed lists are described by their first video codec, then
    /// by their first recognised codec.
    pub fn from_codecs(codecs: &str) -> Option<Self> {
        let candidates: Vec<Self> = codecs
            .split(',')
            .map(str::trim)
            .filter(|codec| !codec.is_empty())
            .filter_map(Self::from_codec)
            .collect();
        candidates
            .iter()
            .find(|caps| caps.stream_type == StreamType::Video)
            .or_else(|| candidates.first())
            .cloned()
    }

    fn from_codec(codec: &str) -> Option<Self> {
        let fourcc = codec.split('.').next()?;
        let (media_type, stream_type) = match fourcc {
            "avc1" | "avc2" | "avc3" | "avc4" => ("video/x-h264", StreamType::Video),
            "hvc1" | "hev1" => ("video/x-h265", StreamType::Video),
            "vvc1" | "vvi1" => ("video/x-h266", StreamType::Video),
            "vp08" => ("video/x-vp8", StreamType::Video),
            "vp09" => ("video/x-vp9", StreamType::Video),
            "av01" => ("video/x-av1", StreamType::Video),
            "mp4v" => ("video/mpeg", StreamType::Video),
            "mp4a" => ("audio/mpeg", StreamType::Audio),
            "ac-3" => ("audio/x-ac3", StreamType::Audio),
            "ec-3" => ("audio/x-eac3", StreamType::Audio),
            "ac-4" => ("audio/x-ac4", StreamType::Audio),
            "opus" | "Opus" => ("audio/x-opus", StreamType::Audio),
            "flac" | "fLaC" => ("audio/x-flac", StreamType::Audio),
            "dtsc" | "dtse" | "dtsh" | "dtsl" => ("audio/x-dts", StreamType::Audio),
            "stpp" => ("application/ttml+xml", StreamType::Text),
            "wvtt" => ("application/x-subtitle-vtt", StreamType::Text),
            _ => {
                log::debug!("Unrecognised codec {codec:?}");
                return None;
            }
        };
        Some(Self {
            media_type: media_type.to_string(),
            stream_type,
            codec: Some(codec.to_string()),
        })
    }

    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let mime_type = mime_type.split(';').next()?.trim();
        let media_type = match mime_type {
            "video/mp4" => "video/quicktime",
            "audio/mp4" => "audio/x-m4a",
            "video/mp2t" => "video/mpegts",
            "video/webm" | "audio/webm" => "video/webm",
            "text/vtt" => "application/x-subtitle-vtt",
            "application/mp4" => "video/quicktime",
            other => other,
        };
        let stream_type = StreamType::from_content_type(mime_type)?;
        Some(Self {
            media_type: media_type.to_string(),
            stream_type,
            codec: None,
        })
    }
}

impl fmt::Display for MediaCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.media_type)
    }
}
