use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{caps::StreamType, node::UtcTimingMethod};

/// Caps applied when picking a representation of one stream type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamLimits {
    /// Bits per second.
    pub max_bandwidth: Option<u64>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

/// Caller preferences of a stream session.
///
/// Deserializable so that an application can embed it in its own configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub video: StreamLimits,
    pub audio: StreamLimits,
    pub text: StreamLimits,

    /// Accepted `UTCTiming` methods in order of preference, empty accepts all of them in
    /// manifest order.
    pub utc_timing: Vec<UtcTimingMethod>,

    /// Preferred `BaseURL@serviceLocation`s, in order.
    pub service_location: Vec<String>,

    /// Reload interval of dynamic manifests without `minimumUpdatePeriod`.
    #[serde(with = "duration_ms")]
    pub default_minimum_update_period: Option<Duration>,
}

impl StreamConfig {
    pub fn limits(&self, stream_type: StreamType) -> &StreamLimits {
        match stream_type {
            StreamType::Video => &self.video,
            StreamType::Audio => &self.audio,
            StreamType::Text | StreamType::Application => &self.text,
        }
    }
}

/// Durations are written as milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
