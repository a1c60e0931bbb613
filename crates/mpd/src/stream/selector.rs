use std::cmp::Ordering;

use crate::{
    caps::StreamType,
    config::StreamLimits,
    node::{AdaptationSet, Period, Representation},
};

pub fn best_representation(representation: &Representation) -> impl Ord {
    BestRepresentationSelector {
        bandwidth: representation.bandwidth,
        width: representation.representation_base.width,
        height: representation.representation_base.height,
    }
}

#[derive(PartialEq, Eq)]
struct BestRepresentationSelector {
    bandwidth: u64,
    width: Option<u32>,
    height: Option<u32>,
}

impl PartialOrd for BestRepresentationSelector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BestRepresentationSelector {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bandwidth
            .cmp(&other.bandwidth)
            .then(self.width.cmp(&other.width))
            .then(self.height.cmp(&other.height))
    }
}

fn fits(representation: &Representation, limits: &StreamLimits) -> bool {
    let base = &representation.representation_base;
    let within = |value: Option<u32>, max: Option<u32>| match (value, max) {
        (Some(value), Some(max)) => value <= max,
        _ => true,
    };

    limits
        .max_bandwidth
        .map_or(true, |max| representation.bandwidth <= max)
        && within(base.width, limits.max_width)
        && within(base.height, limits.max_height)
}

/// Position of the best representation within `limits`, or of the cheapest one when nothing
/// fits.
pub fn select_representation(
    representations: &[Representation],
    limits: &StreamLimits,
) -> Option<usize> {
    representations
        .iter()
        .enumerate()
        .filter(|(_, representation)| fits(representation, limits))
        .max_by_key(|(_, representation)| best_representation(representation))
        .or_else(|| {
            representations
                .iter()
                .enumerate()
                .min_by_key(|(_, representation)| best_representation(representation))
        })
        .map(|(index, _)| index)
}

/// Stream type of an adaptation set, from `@contentType` or the capabilities of its
/// representations.
pub fn adaptation_set_type(adaptation_set: &AdaptationSet) -> Option<StreamType> {
    adaptation_set
        .content_type
        .as_deref()
        .and_then(StreamType::from_content_type)
        .or_else(|| {
            adaptation_set
                .representation_base
                .caps
                .as_ref()
                .map(|caps| caps.stream_type)
        })
        .or_else(|| {
            adaptation_set
                .representations
                .iter()
                .find_map(|representation| representation.caps().map(|caps| caps.stream_type))
        })
}

/// First adaptation set of `stream_type`, unresolved placeholders are skipped.
pub fn select_adaptation_set(period: &Period, stream_type: StreamType) -> Option<usize> {
    period.adaptation_sets.iter().position(|adaptation_set| {
        !adaptation_set.xlink.is_unresolved()
            && !adaptation_set.representations.is_empty()
            && adaptation_set_type(adaptation_set) == Some(stream_type)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn representation(id: &str, bandwidth: u64, height: Option<u32>) -> Representation {
        let mut representation = Representation {
            id: id.to_string(),
            bandwidth,
            ..Default::default()
        };
        representation.representation_base.height = height;
        representation
    }

    #[test]
    fn test_best_representation() {
        let representations = [
            BestRepresentationSelector {
                bandwidth: 1000000,
                width: Some(1920),
                height: Some(1080),
            },
            BestRepresentationSelector {
                bandwidth: 500000,
                width: Some(1280),
                height: Some(720),
            },
            BestRepresentationSelector {
                bandwidth: 250000,
                width: Some(640),
                height: Some(360),
            },
        ];

        let best = representations.iter().max().unwrap();
        assert_eq!(best.width, Some(1920));
        assert_eq!(best.height, Some(1080));
        assert_eq!(best.bandwidth, 1000000);
    }

    #[test]
    fn test_bandwidth_first() {
        let representations = [
            BestRepresentationSelector {
                bandwidth: 500000,
                width: Some(1920),
                height: Some(1080),
            },
            BestRepresentationSelector {
                bandwidth: 1000000,
                width: Some(1280),
                height: Some(720),
            },
        ];

        let best = representations.iter().max().unwrap();
        assert_eq!(best.bandwidth, 1000000);
    }

    #[test]
    fn test_select_within_limits() {
        let representations = [
            representation("low", 250_000, Some(360)),
            representation("high", 3_000_000, Some(1080)),
            representation("mid", 1_000_000, Some(720)),
        ];

        assert_eq!(
            select_representation(&representations, &StreamLimits::default()),
            Some(1)
        );

        let limits = StreamLimits {
            max_bandwidth: Some(2_000_000),
            ..Default::default()
        };
        assert_eq!(select_representation(&representations, &limits), Some(2));

        let limits = StreamLimits {
            max_height: Some(400),
            ..Default::default()
        };
        assert_eq!(select_representation(&representations, &limits), Some(0));

        // nothing fits, the cheapest one is used
        let limits = StreamLimits {
            max_bandwidth: Some(1000),
            ..Default::default()
        };
        assert_eq!(select_representation(&representations, &limits), Some(0));

        assert_eq!(select_representation(&[], &limits), None);
    }

    #[test]
    fn test_select_adaptation_set() {
        let audio = AdaptationSet {
            content_type: Some("audio".to_string()),
            representations: vec![representation("a", 128_000, None)],
            ..Default::default()
        };
        let mut video = AdaptationSet {
            representations: vec![representation("v", 1_000_000, Some(720))],
            ..Default::default()
        };
        video.representation_base.mime_type = Some("video/mp4".to_string());
        video.representation_base.caps = crate::caps::MediaCaps::derive(None, Some("video/mp4"));

        let period = Period {
            adaptation_sets: vec![audio, video],
            ..Default::default()
        };
        assert_eq!(select_adaptation_set(&period, StreamType::Audio), Some(0));
        assert_eq!(select_adaptation_set(&period, StreamType::Video), Some(1));
        assert_eq!(select_adaptation_set(&period, StreamType::Text), None);
    }
}
