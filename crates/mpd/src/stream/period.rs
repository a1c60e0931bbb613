use std::time::Duration;

use crate::node::Mpd;

/// Placement of a period on the presentation timeline.
///
/// The start of a period is specified either explicitly as an offset from the presentation
/// zero point (`Period@start`) or implicitly by the end of the previous period. The duration
/// is specified either explicitly with `Period@duration` or implicitly by the start of the next
/// period, and the last period may fall back to `MPD@mediaPresentationDuration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamPeriod {
    /// Position in `Mpd::periods`.
    pub index: usize,
    pub start: Duration,
    /// `None` for an open ended period, which can only be the last one.
    pub duration: Option<Duration>,
}

impl StreamPeriod {
    pub fn end(&self) -> Option<Duration> {
        self.duration.map(|duration| self.start + duration)
    }
}

/// Compute the placement of every period.
///
/// Stops at the first period whose start cannot be derived.
pub fn stream_periods(mpd: &Mpd) -> Vec<StreamPeriod> {
    let mut periods: Vec<StreamPeriod> = Vec::with_capacity(mpd.periods.len());

    for (index, period) in mpd.periods.iter().enumerate() {
        let start = match period.start.map(Duration::from_millis) {
            Some(start) => {
                // the previous period ends where this one starts
                if let Some(previous) = periods.last_mut() {
                    if previous.duration.is_none() {
                        previous.duration = Some(start.saturating_sub(previous.start));
                    }
                }
                start
            }
            None => match periods.last() {
                None => {
                    if mpd.is_dynamic() {
                        tracing::debug!("First period of a dynamic MPD has no start, assuming 0");
                    }
                    Duration::ZERO
                }
                Some(StreamPeriod {
                    start,
                    duration: Some(duration),
                    ..
                }) => *start + *duration,
                Some(_) => {
                    tracing::warn!(
                        index,
                        "Period has no start and the previous period has no duration"
                    );
                    break;
                }
            },
        };

        periods.push(StreamPeriod {
            index,
            start,
            duration: period.duration.map(Duration::from_millis),
        });
    }

    if let Some(last) = periods.last_mut() {
        if last.duration.is_none() {
            last.duration = mpd
                .media_presentation_duration
                .map(|total| Duration::from_millis(total).saturating_sub(last.start));
        }
    }

    periods
}
