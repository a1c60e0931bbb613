use crate::{
    error::{MpdError, MpdResult},
    node::SegmentTimeline,
};

/// A run of `repeat + 1` consecutive segments of equal duration, in timescale units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaSegment {
    /// Number of the first segment of the run.
    pub number: u64,
    pub scale_start: u64,
    pub scale_duration: u64,
    /// Additional repetitions.
    pub repeat: u64,
    /// Position of the first segment's `SegmentURL` for list addressing.
    pub segment_url: Option<usize>,
}

impl MediaSegment {
    pub fn count(&self) -> u64 {
        self.repeat.saturating_add(1)
    }

    /// End of the last segment of the run.
    pub fn scale_end(&self) -> u64 {
        self.scale_duration
            .saturating_mul(self.count())
            .saturating_add(self.scale_start)
    }

    /// The `offset`th segment of the run, which sits at `index` in the representation.
    pub(crate) fn at(&self, offset: u64, index: u64) -> SegmentTiming {
        SegmentTiming {
            index,
            number: self.number.saturating_add(offset),
            scale_start: self
                .scale_duration
                .saturating_mul(offset)
                .saturating_add(self.scale_start),
            scale_duration: self.scale_duration,
            segment_url: self
                .segment_url
                .map(|first| first.saturating_add(offset as usize)),
        }
    }
}

/// One concrete segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentTiming {
    /// Zero based position in the representation.
    pub index: u64,
    pub number: u64,
    pub scale_start: u64,
    pub scale_duration: u64,
    pub segment_url: Option<usize>,
}

impl SegmentTiming {
    pub fn scale_end(&self) -> u64 {
        self.scale_start.saturating_add(self.scale_duration)
    }
}

/// Turn the `S` entries into runs.
///
/// An entry without `@t` starts where the previous run ends. `@r="-1"` repeats up to the next
/// entry's `@t`, or up to `scale_end` for the last entry.
pub(crate) fn expand_timeline(
    timeline: &SegmentTimeline,
    start_number: u64,
    scale_end: Option<u64>,
) -> MpdResult<Vec<MediaSegment>> {
    let mut segments = Vec::with_capacity(timeline.s.len());
    let mut number = start_number;
    let mut next_start = 0u64;

    for (i, s) in timeline.s.iter().enumerate() {
        if s.d == 0 {
            return Err(MpdError::InvalidTimeline(format!(
                "S[{i}] has a zero duration"
            )));
        }

        let start = s.t.unwrap_or(next_start);
        let repeat = match s.r {
            r if r >= 0 => r as u64,
            -1 => {
                let bound = timeline
                    .s
                    .get(i + 1)
                    .and_then(|next| next.t)
                    .or(scale_end)
                    .ok_or_else(|| {
                        MpdError::InvalidTimeline(format!(
                            "S[{i}] repeats until the period end, which is unknown"
                        ))
                    })?;
                match bound.saturating_sub(start).div_ceil(s.d) {
                    0 => continue,
                    count => count - 1,
                }
            }
            r => {
                return Err(MpdError::InvalidTimeline(format!(
                    "S[{i}] has an invalid repeat count {r}"
                )))
            }
        };

        let count = repeat + 1;
        next_start = s
            .d
            .checked_mul(count)
            .and_then(|span| span.checked_add(start))
            .ok_or_else(|| MpdError::InvalidTimeline(format!("S[{i}] overflows")))?;

        segments.push(MediaSegment {
            number,
            scale_start: start,
            scale_duration: s.d,
            repeat,
            segment_url: None,
        });
        number = number.saturating_add(count);
    }

    Ok(segments)
}
