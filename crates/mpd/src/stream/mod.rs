//! Segment resolution for one selected representation.
//!
//! An [`ActiveStream`] pins a representation of an immutable [`Mpd`] snapshot and turns its
//! inherited addressing information into concrete [`SegmentRequest`]s. Everything here is
//! synchronous and performs no I/O.

mod period;
mod segment;
mod selector;
mod timeline;

pub use period::{stream_periods, StreamPeriod};
pub use segment::SegmentRequest;
pub use selector::{
    adaptation_set_type, best_representation, select_adaptation_set, select_representation,
};
pub use timeline::{MediaSegment, SegmentTiming};

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use url::Url;

use crate::{
    caps::{MediaCaps, StreamType},
    config::StreamConfig,
    error::{MpdError, MpdResult},
    live::LiveEdgeTracker,
    node::{
        AdaptationSet, Mpd, MultSegmentBase, Period, Representation, SegmentBase, SegmentList,
        SegmentTemplate, UrlType, Xlink,
    },
    template::Template,
    types::ByteRange,
    util::url::{resolve_url, select_base_url},
};
use timeline::expand_timeline;

/// `SegmentBase` in effect for a representation, nearest level first.
pub fn effective_segment_base<'a>(
    period: &'a Period,
    adaptation_set: &'a AdaptationSet,
    representation: &'a Representation,
) -> Option<&'a SegmentBase> {
    representation
        .segment_base
        .as_ref()
        .or(adaptation_set.segment_base.as_ref())
        .or(period.segment_base.as_ref())
}

/// `SegmentList` in effect for a representation, nearest level first.
pub fn effective_segment_list<'a>(
    period: &'a Period,
    adaptation_set: &'a AdaptationSet,
    representation: &'a Representation,
) -> Option<&'a SegmentList> {
    representation
        .segment_list
        .as_ref()
        .or(adaptation_set.segment_list.as_ref())
        .or(period.segment_list.as_ref())
}

/// `SegmentTemplate` in effect for a representation, nearest level first.
pub fn effective_segment_template<'a>(
    period: &'a Period,
    adaptation_set: &'a AdaptationSet,
    representation: &'a Representation,
) -> Option<&'a SegmentTemplate> {
    representation
        .segment_template
        .as_ref()
        .or(adaptation_set.segment_template.as_ref())
        .or(period.segment_template.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingScheme {
    /// Explicit `SegmentURL`s.
    SegmentList,
    /// URLs generated from `SegmentTemplate@media`.
    SegmentTemplate,
    /// One indexed resource.
    SegmentBase,
    /// The representation is a single resource.
    Single,
}

fn ensure_resolved(xlink: &Xlink) -> MpdResult<()> {
    match &xlink.href {
        Some(href) => Err(MpdError::UnresolvedXlink(href.clone())),
        None => Ok(()),
    }
}

fn to_scale(duration: Duration, timescale: u32) -> u64 {
    let units = duration.as_nanos() * u128::from(timescale) / 1_000_000_000;
    u64::try_from(units).unwrap_or(u64::MAX)
}

/// Segment runs of a representation, in its timescale.
#[derive(Debug, Clone)]
struct Layout {
    scheme: AddressingScheme,
    timescale: u32,
    presentation_time_offset: u64,
    segments: Vec<MediaSegment>,
    /// The last run repeats indefinitely.
    open_ended: bool,
}

impl Layout {
    fn new(
        period: &StreamPeriod,
        node_period: &Period,
        adaptation_set: &AdaptationSet,
        representation: &Representation,
    ) -> MpdResult<Self> {
        if let Some(list) = effective_segment_list(node_period, adaptation_set, representation) {
            ensure_resolved(&list.xlink)?;
            return Self::from_mult_segment_base(
                AddressingScheme::SegmentList,
                period,
                &list.mult_segment_base,
                Some(list.segment_urls.len()),
            );
        }

        if let Some(template) =
            effective_segment_template(node_period, adaptation_set, representation)
        {
            return Self::from_mult_segment_base(
                AddressingScheme::SegmentTemplate,
                period,
                &template.mult_segment_base,
                None,
            );
        }

        Ok(
            match effective_segment_base(node_period, adaptation_set, representation) {
                Some(base) => Self::single(AddressingScheme::SegmentBase, period, base),
                None => Self::single(AddressingScheme::Single, period, &SegmentBase::default()),
            },
        )
    }

    fn single(scheme: AddressingScheme, period: &StreamPeriod, base: &SegmentBase) -> Self {
        let timescale = base.timescale.max(1);
        Self {
            scheme,
            timescale,
            presentation_time_offset: base.presentation_time_offset,
            segments: vec![MediaSegment {
                number: 1,
                scale_start: base.presentation_time_offset,
                scale_duration: period
                    .duration
                    .map(|duration| to_scale(duration, timescale))
                    .unwrap_or_default(),
                repeat: 0,
                segment_url: None,
            }],
            open_ended: false,
        }
    }

    fn from_mult_segment_base(
        scheme: AddressingScheme,
        period: &StreamPeriod,
        mult: &MultSegmentBase,
        url_count: Option<usize>,
    ) -> MpdResult<Self> {
        let timescale = mult.segment_base.timescale.max(1);
        let presentation_time_offset = mult.segment_base.presentation_time_offset;
        let period_units = period.duration.map(|duration| to_scale(duration, timescale));
        let first_url = url_count.map(|_| 0);

        let mut layout = Self {
            scheme,
            timescale,
            presentation_time_offset,
            segments: Vec::new(),
            open_ended: false,
        };

        if let Some(timeline) = &mult.segment_timeline {
            let scale_end = period_units.map(|units| units.saturating_add(presentation_time_offset));
            layout.segments = expand_timeline(timeline, mult.start_number, scale_end)?;
            if let Some(url_count) = url_count {
                layout.assign_segment_urls(url_count);
            }
            return Ok(layout);
        }

        if let Some(duration) = mult.duration.filter(|duration| *duration > 0) {
            let count = match url_count {
                Some(url_count) => Some(url_count as u64),
                None => period_units.map(|units| units.div_ceil(duration)),
            };
            let repeat = match count {
                Some(0) => return Ok(layout),
                Some(count) => count - 1,
                None => {
                    layout.open_ended = true;
                    u64::MAX
                }
            };
            layout.segments.push(MediaSegment {
                number: mult.start_number,
                scale_start: presentation_time_offset,
                scale_duration: duration,
                repeat,
                segment_url: first_url,
            });
            return Ok(layout);
        }

        match url_count {
            Some(0) => Ok(layout),
            // a single segment spans the whole period
            Some(1) => {
                layout.segments.push(MediaSegment {
                    number: mult.start_number,
                    scale_start: presentation_time_offset,
                    scale_duration: period_units.unwrap_or_default(),
                    repeat: 0,
                    segment_url: first_url,
                });
                Ok(layout)
            }
            _ => Err(MpdError::NoAddressingScheme(format!(
                "{scheme:?} has neither SegmentTimeline nor duration"
            ))),
        }
    }

    /// Map timeline segments onto `SegmentURL`s in order, dropping segments without one.
    fn assign_segment_urls(&mut self, url_count: usize) {
        let mut remaining = url_count as u64;
        let mut next_url = 0usize;
        self.segments.retain_mut(|run| {
            if remaining == 0 {
                return false;
            }
            let count = run.count().min(remaining);
            run.repeat = count - 1;
            run.segment_url = Some(next_url);
            next_url += count as usize;
            remaining -= count;
            true
        });
        if remaining > 0 {
            tracing::debug!(remaining, "SegmentList has more URLs than timeline segments");
        }
    }
}

/// Cursor over the segments of one representation.
#[derive(Debug, Clone)]
pub struct ActiveStream {
    mpd: Arc<Mpd>,
    document_url: Option<Url>,

    period: StreamPeriod,
    adaptation_set_index: usize,
    representation_index: usize,

    scheme: AddressingScheme,
    base_url: Option<Url>,
    /// Query of the base url, reattached to every segment url.
    query: Option<String>,

    timescale: u32,
    presentation_time_offset: u64,
    segments: Vec<MediaSegment>,
    open_ended: bool,

    /// Current run in `segments`.
    segment_index: usize,
    /// Current repetition within the run.
    segment_repeat_index: u64,
    discontinuity: bool,
}

impl ActiveStream {
    /// Pin a representation by position.
    ///
    /// Fails with [`MpdError::UnresolvedXlink`] when the path goes through a placeholder.
    pub fn new(
        mpd: Arc<Mpd>,
        document_url: Option<Url>,
        period_index: usize,
        adaptation_set_index: usize,
        representation_index: usize,
        config: &StreamConfig,
    ) -> MpdResult<Self> {
        let period = stream_periods(&mpd)
            .into_iter()
            .find(|period| period.index == period_index)
            .ok_or(MpdError::NoPeriodFound)?;

        let node_period = mpd.periods.get(period_index).ok_or(MpdError::NoPeriodFound)?;
        ensure_resolved(&node_period.xlink)?;
        let adaptation_set = node_period
            .adaptation_sets
            .get(adaptation_set_index)
            .ok_or(MpdError::NoAdaptationSetFound)?;
        ensure_resolved(&adaptation_set.xlink)?;
        let representation = adaptation_set
            .representations
            .get(representation_index)
            .ok_or(MpdError::NoRepresentationFound)?;

        // BaseURLs are not concatenated across levels, the nearest level wins
        let nearest = [
            &representation.base_urls,
            &adaptation_set.base_urls,
            &node_period.base_urls,
            &mpd.base_urls,
        ]
        .into_iter()
        .find(|base_urls| !base_urls.is_empty())
        .and_then(|base_urls| select_base_url(base_urls, &config.service_location));
        let base_url = match nearest {
            Some(base_url) => Some(resolve_url(document_url.as_ref(), &base_url.base_url)?),
            None => document_url.clone(),
        };
        let query = base_url
            .as_ref()
            .and_then(|url| url.query())
            .map(str::to_string);

        let layout = Layout::new(&period, node_period, adaptation_set, representation)?;
        tracing::debug!(
            period = period_index,
            adaptation_set = adaptation_set_index,
            representation = %representation.id,
            scheme = ?layout.scheme,
            runs = layout.segments.len(),
            "Stream activated"
        );

        Ok(Self {
            mpd,
            document_url,
            period,
            adaptation_set_index,
            representation_index,
            scheme: layout.scheme,
            base_url,
            query,
            timescale: layout.timescale,
            presentation_time_offset: layout.presentation_time_offset,
            segments: layout.segments,
            open_ended: layout.open_ended,
            segment_index: 0,
            segment_repeat_index: 0,
            discontinuity: false,
        })
    }

    /// Pick an adaptation set of `stream_type` and the best representation within the
    /// configured limits.
    pub fn select(
        mpd: Arc<Mpd>,
        document_url: Option<Url>,
        period_index: usize,
        stream_type: StreamType,
        config: &StreamConfig,
    ) -> MpdResult<Self> {
        let period = mpd.periods.get(period_index).ok_or(MpdError::NoPeriodFound)?;
        ensure_resolved(&period.xlink)?;

        let adaptation_set_index =
            select_adaptation_set(period, stream_type).ok_or(MpdError::NoAdaptationSetFound)?;
        let representation_index = select_representation(
            &period.adaptation_sets[adaptation_set_index].representations,
            config.limits(stream_type),
        )
        .ok_or(MpdError::NoRepresentationFound)?;

        Self::new(
            mpd,
            document_url,
            period_index,
            adaptation_set_index,
            representation_index,
            config,
        )
    }

    pub fn mpd(&self) -> &Arc<Mpd> {
        &self.mpd
    }

    pub fn period(&self) -> &StreamPeriod {
        &self.period
    }

    pub fn period_node(&self) -> &Period {
        &self.mpd.periods[self.period.index]
    }

    pub fn adaptation_set(&self) -> &AdaptationSet {
        &self.period_node().adaptation_sets[self.adaptation_set_index]
    }

    pub fn representation(&self) -> &Representation {
        &self.adaptation_set().representations[self.representation_index]
    }

    pub fn caps(&self) -> Option<&MediaCaps> {
        self.representation().caps()
    }

    pub fn scheme(&self) -> AddressingScheme {
        self.scheme
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn timescale(&self) -> u32 {
        self.timescale
    }

    pub fn presentation_time_offset(&self) -> u64 {
        self.presentation_time_offset
    }

    fn segment_template(&self) -> MpdResult<&SegmentTemplate> {
        effective_segment_template(self.period_node(), self.adaptation_set(), self.representation())
            .ok_or_else(|| MpdError::NoAddressingScheme("SegmentTemplate is gone".to_string()))
    }

    fn segment_list(&self) -> MpdResult<&SegmentList> {
        effective_segment_list(self.period_node(), self.adaptation_set(), self.representation())
            .ok_or_else(|| MpdError::NoAddressingScheme("SegmentList is gone".to_string()))
    }

    fn segment_base(&self) -> Option<&SegmentBase> {
        effective_segment_base(self.period_node(), self.adaptation_set(), self.representation())
    }

    /// `SegmentBase` fields shared by every scheme.
    fn common_segment_base(&self) -> MpdResult<Option<&SegmentBase>> {
        Ok(match self.scheme {
            AddressingScheme::SegmentTemplate => {
                Some(&self.segment_template()?.mult_segment_base.segment_base)
            }
            AddressingScheme::SegmentList => {
                Some(&self.segment_list()?.mult_segment_base.segment_base)
            }
            AddressingScheme::SegmentBase => self.segment_base(),
            AddressingScheme::Single => None,
        })
    }

    /// Total number of segments, `None` while the last run is open ended.
    pub fn segment_count(&self) -> Option<u64> {
        if self.open_ended {
            return None;
        }
        Some(
            self.segments
                .iter()
                .fold(0u64, |total, run| total.saturating_add(run.count())),
        )
    }

    pub fn runs(&self) -> &[MediaSegment] {
        &self.segments
    }

    pub fn segment(&self, index: u64) -> MpdResult<SegmentTiming> {
        let mut first = 0u64;
        for run in &self.segments {
            let offset = index - first;
            if offset < run.count() {
                return Ok(run.at(offset, index));
            }
            first = first.saturating_add(run.count());
            if first > index {
                break;
            }
        }
        Err(MpdError::SegmentOutOfRange(index))
    }

    /// Every segment in order, endless for open ended streams.
    pub fn segments(&self) -> impl Iterator<Item = SegmentTiming> + '_ {
        let mut first = 0u64;
        self.segments.iter().flat_map(move |run| {
            let base = first;
            first = first.saturating_add(run.count());
            (0..run.count()).map(move |offset| run.at(offset, base + offset))
        })
    }

    fn scale_to_duration(&self, units: u64) -> Duration {
        let nanos = u128::from(units) * 1_000_000_000 / u128::from(self.timescale);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Presentation time of a segment.
    pub fn timestamp(&self, timing: &SegmentTiming) -> Duration {
        self.period.start
            + self.scale_to_duration(
                timing
                    .scale_start
                    .saturating_sub(self.presentation_time_offset),
            )
    }

    pub fn duration(&self, timing: &SegmentTiming) -> Duration {
        self.scale_to_duration(timing.scale_duration)
    }

    pub fn end_timestamp(&self, timing: &SegmentTiming) -> Duration {
        self.timestamp(timing) + self.duration(timing)
    }

    /// Number of leading segments satisfying `predicate`, which must hold for a prefix.
    fn partition_point(&self, predicate: impl Fn(&SegmentTiming) -> bool) -> u64 {
        let holds = |index: u64| {
            self.segment(index)
                .map(|timing| predicate(&timing))
                .unwrap_or(false)
        };

        let mut high = match self.segment_count() {
            Some(count) => count,
            None => {
                let mut high = 1u64;
                while high < u64::MAX / 2 && holds(high - 1) {
                    high *= 2;
                }
                high
            }
        };
        let mut low = 0u64;
        while low < high {
            let middle = low + (high - low) / 2;
            if holds(middle) {
                low = middle + 1;
            } else {
                high = middle;
            }
        }
        low
    }

    /// Number of segments starting at or before `timestamp`.
    pub fn segments_started_by(&self, timestamp: Duration) -> u64 {
        self.partition_point(|timing| self.timestamp(timing) <= timestamp)
    }

    /// Number of segments ending strictly before `timestamp`.
    pub fn segments_ended_before(&self, timestamp: Duration) -> u64 {
        self.partition_point(|timing| self.end_timestamp(timing) < timestamp)
    }

    fn template_variables(&self, timing: Option<&SegmentTiming>) -> Template {
        let representation = self.representation();
        let mut template = Template::new();
        template
            .insert(Template::REPRESENTATION_ID, &representation.id)
            .insert(Template::BANDWIDTH, representation.bandwidth);
        if let Some(timing) = timing {
            template
                .insert(Template::NUMBER, timing.number)
                .insert(Template::TIME, timing.scale_start);
        }
        template
    }

    /// Merge `media` with the base url, the base url itself when absent.
    fn resolve(&self, media: Option<&str>) -> MpdResult<Url> {
        let mut url = match media {
            Some(media) => resolve_url(self.base_url.as_ref(), media)?,
            None => self.base_url.clone().ok_or(MpdError::InvalidBaseUrl)?,
        };
        if url.query().is_none() {
            url.set_query(self.query.as_deref());
        }
        Ok(url)
    }

    fn url_type_request(&self, url: &UrlType) -> MpdResult<SegmentRequest> {
        let mut request =
            SegmentRequest::new(self.resolve(url.source_url.as_deref())?, self.period.start);
        request.range = url.range;
        Ok(request)
    }

    pub fn segment_request(&self, index: u64) -> MpdResult<SegmentRequest> {
        let timing = self.segment(index)?;
        let timestamp = self.timestamp(&timing);

        let mut request = match self.scheme {
            AddressingScheme::SegmentTemplate => {
                let template = self.segment_template()?;
                let variables = self.template_variables(Some(&timing));
                let media = template
                    .media
                    .as_deref()
                    .map(|media| variables.resolve(media))
                    .transpose()?;

                let mut request = SegmentRequest::new(self.resolve(media.as_deref())?, timestamp);
                if let Some(index) = &template.index {
                    request.index_uri = Some(self.resolve(Some(&variables.resolve(index)?))?);
                }
                request.time = Some(timing.scale_start);
                request
            }
            AddressingScheme::SegmentList => {
                let list = self.segment_list()?;
                let segment_url = timing
                    .segment_url
                    .and_then(|position| list.segment_urls.get(position))
                    .ok_or(MpdError::SegmentOutOfRange(index))?;

                let mut request =
                    SegmentRequest::new(self.resolve(segment_url.media.as_deref())?, timestamp);
                request.range = segment_url.media_range;
                if segment_url.index.is_some() || segment_url.index_range.is_some() {
                    request.index_uri = Some(self.resolve(segment_url.index.as_deref())?);
                    request.index_range = segment_url.index_range;
                }
                request.time = Some(timing.scale_start);
                request
            }
            AddressingScheme::SegmentBase => {
                let mut request = SegmentRequest::new(self.resolve(None)?, timestamp);
                if let Some(index) = self.index()? {
                    request.index_uri = Some(index.uri);
                    request.index_range = index.range;
                }
                request
            }
            AddressingScheme::Single => SegmentRequest::new(self.resolve(None)?, timestamp),
        };

        request.duration = self.duration(&timing);
        request.number = timing.number;
        Ok(request)
    }

    /// Initialization segment, if the representation has one.
    pub fn initialization(&self) -> MpdResult<Option<SegmentRequest>> {
        if self.scheme == AddressingScheme::SegmentTemplate {
            if let Some(initialization) = &self.segment_template()?.initialization {
                let url = self.template_variables(None).resolve(initialization)?;
                return Ok(Some(SegmentRequest::new(
                    self.resolve(Some(&url))?,
                    self.period.start,
                )));
            }
        }

        let Some(base) = self.common_segment_base()? else {
            return Ok(None);
        };
        if let Some(initialization) = &base.initialization {
            return self.url_type_request(initialization).map(Some);
        }

        // the header of an indexed resource precedes its index
        match base.index_range {
            Some(index_range)
                if self.scheme == AddressingScheme::SegmentBase
                    && index_range.first_byte_pos > 0 =>
            {
                let mut request = SegmentRequest::new(self.resolve(None)?, self.period.start);
                request.range = Some(ByteRange::new(0, Some(index_range.first_byte_pos - 1)));
                Ok(Some(request))
            }
            _ => Ok(None),
        }
    }

    /// Representation wide segment index, if the representation has one.
    pub fn index(&self) -> MpdResult<Option<SegmentRequest>> {
        if self.scheme == AddressingScheme::SegmentTemplate {
            // per segment indexes are attached to the segment requests
            if let Some(index) = &self.segment_template()?.index {
                if index.contains("$Number") || index.contains("$Time") {
                    return Ok(None);
                }
                let url = self.template_variables(None).resolve(index)?;
                return Ok(Some(SegmentRequest::new(
                    self.resolve(Some(&url))?,
                    self.period.start,
                )));
            }
        }

        let Some(base) = self.common_segment_base()? else {
            return Ok(None);
        };
        if let Some(representation_index) = &base.representation_index {
            return self.url_type_request(representation_index).map(Some);
        }
        match base.index_range {
            Some(index_range) if self.scheme == AddressingScheme::SegmentBase => {
                let mut request = SegmentRequest::new(self.resolve(None)?, self.period.start);
                request.range = Some(index_range);
                Ok(Some(request))
            }
            _ => Ok(None),
        }
    }

    /// Position of the next segment [`Self::next_request`] returns.
    pub fn position(&self) -> u64 {
        self.segments
            .iter()
            .take(self.segment_index)
            .fold(0u64, |total, run| total.saturating_add(run.count()))
            .saturating_add(self.segment_repeat_index)
    }

    pub fn set_position(&mut self, index: u64) {
        let mut first = 0u64;
        for (segment_index, run) in self.segments.iter().enumerate() {
            let offset = index.saturating_sub(first);
            if offset < run.count() {
                self.segment_index = segment_index;
                self.segment_repeat_index = offset;
                return;
            }
            first = first.saturating_add(run.count());
        }
        self.segment_index = self.segments.len();
        self.segment_repeat_index = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.segment_index >= self.segments.len()
    }

    fn advance(&mut self) {
        self.segment_repeat_index += 1;
        if let Some(run) = self.segments.get(self.segment_index) {
            if self.segment_repeat_index >= run.count() {
                self.segment_index += 1;
                self.segment_repeat_index = 0;
            }
        }
    }

    /// Request for the segment under the cursor, then move the cursor forward.
    pub fn next_request(&mut self) -> MpdResult<Option<SegmentRequest>> {
        let Some(run) = self.segments.get(self.segment_index) else {
            return Ok(None);
        };
        let gap = self.segment_repeat_index == 0
            && self.segment_index > 0
            && self.segments[self.segment_index - 1].scale_end() != run.scale_start;

        let mut request = self.segment_request(self.position())?;
        request.discontinuity = std::mem::take(&mut self.discontinuity) || gap;
        self.advance();
        Ok(Some(request))
    }

    /// [`Self::next_request`] limited to the segments `tracker` reports available at `now`.
    ///
    /// A cursor behind the time shift buffer jumps to its oldest segment and the request is
    /// marked discontinuous. `None` means nothing is available yet at the cursor.
    pub fn next_available_request(
        &mut self,
        tracker: &LiveEdgeTracker,
        now: DateTime<Utc>,
    ) -> MpdResult<Option<SegmentRequest>> {
        let available = tracker.available_segments(self, now);
        let position = self.position();
        if position < available.start {
            tracing::debug!(
                position,
                start = available.start,
                "Cursor fell behind the time shift buffer"
            );
            self.set_position(available.start);
            self.discontinuity = true;
        }
        if self.position() >= available.end {
            return Ok(None);
        }
        self.next_request()
    }

    /// Move the cursor to the segment containing `timestamp`, or the first one after it.
    pub fn seek(&mut self, timestamp: Duration) -> u64 {
        let index = self.partition_point(|timing| self.end_timestamp(timing) <= timestamp);
        self.set_position(index);
        self.discontinuity = true;
        tracing::debug!(?timestamp, index, "Stream seeked");
        index
    }

    /// Presentation time the cursor points at.
    fn resume_timestamp(&self) -> Option<Duration> {
        if let Ok(timing) = self.segment(self.position()) {
            return Some(self.timestamp(&timing));
        }
        let last = self.segment_count()?.checked_sub(1)?;
        self.segment(last)
            .ok()
            .map(|timing| self.end_timestamp(&timing))
    }

    /// Continue on a new snapshot of the manifest.
    ///
    /// The period is matched by `@id`, the adaptation set by `@id` and the representation by
    /// `@id`, falling back to positions when ids are absent. The cursor resumes at the first
    /// segment not before the current one. On error the stream keeps the old snapshot.
    pub fn reconcile(&mut self, mpd: Arc<Mpd>, config: &StreamConfig) -> MpdResult<()> {
        let old_period = self.period_node();
        let period_index = match &old_period.id {
            Some(id) => mpd
                .periods
                .iter()
                .position(|period| period.id.as_ref() == Some(id)),
            None => (self.period.index < mpd.periods.len()).then_some(self.period.index),
        }
        .ok_or(MpdError::NoPeriodFound)?;
        let period = &mpd.periods[period_index];

        let adaptation_set_index = match self.adaptation_set().id {
            Some(id) => period
                .adaptation_sets
                .iter()
                .position(|adaptation_set| adaptation_set.id == Some(id)),
            None => (self.adaptation_set_index < period.adaptation_sets.len())
                .then_some(self.adaptation_set_index),
        }
        .ok_or(MpdError::NoAdaptationSetFound)?;

        let representation_id = &self.representation().id;
        let representation_index = period.adaptation_sets[adaptation_set_index]
            .representations
            .iter()
            .position(|representation| &representation.id == representation_id)
            .ok_or(MpdError::NoRepresentationFound)?;

        let resume = self.resume_timestamp();
        let mut stream = Self::new(
            mpd,
            self.document_url.clone(),
            period_index,
            adaptation_set_index,
            representation_index,
            config,
        )?;

        if let Some(resume) = resume {
            let index = stream.partition_point(|timing| stream.timestamp(timing) < resume);
            stream.set_position(index);
            let continuous = stream
                .segment(index)
                .is_ok_and(|timing| stream.timestamp(&timing) == resume);
            stream.discontinuity = self.discontinuity || (!continuous && !stream.is_exhausted());
        }

        tracing::debug!(
            period = period_index,
            position = stream.position(),
            "Stream reconciled with new manifest"
        );
        *self = stream;
        Ok(())
    }
}
