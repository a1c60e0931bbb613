//! Live edge tracking and manifest refresh for dynamic presentations.
//!
//! References:
//! - [DASH-IF implementation guidelines: restricted timing model](https://dashif.org/Guidelines-TimingModel)

pub mod clock;

pub use clock::Clock;

use std::{ops::Range, sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::{
    sync::{watch, RwLock},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    config::StreamConfig,
    error::{MpdError, MpdResult},
    fetch::Fetcher,
    node::Mpd,
    parser,
    stream::{ActiveStream, SegmentRequest},
    util::url::resolve_url,
    xlink::XlinkResolver,
};

/// Lower bound between two reloads, also used after a failed reload.
const MIN_RELOAD_INTERVAL: Duration = Duration::from_millis(500);

fn delta_from_millis(ms: u64) -> TimeDelta {
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .unwrap_or(TimeDelta::MAX)
}

fn delta_from_std(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentAvailability {
    /// Dropped out of the time shift buffer.
    Expired,
    Available,
    NotYetAvailable,
}

/// Wall clock view of a presentation.
#[derive(Debug, Clone)]
pub struct LiveEdgeTracker {
    dynamic: bool,
    availability_start_time: Option<DateTime<Utc>>,
    time_shift_buffer_depth: Option<TimeDelta>,
    suggested_presentation_delay: TimeDelta,
    /// Including the configured fallback.
    minimum_update_period: Option<Duration>,
    last_fetch: Option<DateTime<Utc>>,
    clock: Clock,
}

impl LiveEdgeTracker {
    pub fn from_mpd(mpd: &Mpd, config: &StreamConfig) -> MpdResult<Self> {
        let mut tracker = Self {
            dynamic: false,
            availability_start_time: None,
            time_shift_buffer_depth: None,
            suggested_presentation_delay: TimeDelta::zero(),
            minimum_update_period: None,
            last_fetch: None,
            clock: Clock::new(),
        };
        tracker.update(mpd, config)?;
        Ok(tracker)
    }

    /// Take the timing parameters of a new snapshot, the clock offset is kept.
    pub fn update(&mut self, mpd: &Mpd, config: &StreamConfig) -> MpdResult<()> {
        let availability_start_time = mpd
            .availability_start_time
            .as_ref()
            .map(|time| time.to_utc())
            .transpose()?;
        if mpd.is_dynamic() && availability_start_time.is_none() {
            return Err(MpdError::MissingMandatoryField {
                element: "MPD",
                field: "availabilityStartTime",
            });
        }

        self.dynamic = mpd.is_dynamic();
        self.availability_start_time = availability_start_time;
        self.time_shift_buffer_depth = mpd.time_shift_buffer_depth.map(delta_from_millis);
        self.suggested_presentation_delay = mpd
            .suggested_presentation_delay
            .map(delta_from_millis)
            .unwrap_or_else(TimeDelta::zero);
        self.minimum_update_period = mpd
            .minimum_update_period
            .map(Duration::from_millis)
            .or(config.default_minimum_update_period);
        Ok(())
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Synchronised wall clock time.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn sync_clock<F: Fetcher>(
        &mut self,
        mpd: &Mpd,
        document_url: Option<&Url>,
        config: &StreamConfig,
        fetcher: &F,
    ) -> MpdResult<()> {
        self.clock
            .sync(&mpd.utc_timings, &config.utc_timing, document_url, fetcher)
            .await
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    pub fn mark_fetched(&mut self, at: DateTime<Utc>) {
        self.last_fetch = Some(at);
    }

    pub fn minimum_update_period(&self) -> Option<Duration> {
        self.minimum_update_period
    }

    /// Presentation time elapsed at `now`, `None` for static presentations and before the
    /// availability start time.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        let availability_start_time = self.availability_start_time.filter(|_| self.dynamic)?;
        (now - availability_start_time).to_std().ok()
    }

    /// Classify a segment placed at `start` on the presentation timeline.
    ///
    /// A segment is available from `availabilityStartTime + start` until
    /// `availabilityStartTime + start + duration + timeShiftBufferDepth`, both inclusive.
    pub fn availability_at(
        &self,
        start: Duration,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> SegmentAvailability {
        let Some(availability_start_time) = self.availability_start_time.filter(|_| self.dynamic)
        else {
            return SegmentAvailability::Available;
        };

        // past the representable range the window never opens or never closes
        let Some(window_start) = availability_start_time.checked_add_signed(delta_from_std(start))
        else {
            return SegmentAvailability::NotYetAvailable;
        };
        if now < window_start {
            return SegmentAvailability::NotYetAvailable;
        }
        let window_end = self.time_shift_buffer_depth.and_then(|time_shift_buffer_depth| {
            window_start
                .checked_add_signed(delta_from_std(duration))?
                .checked_add_signed(time_shift_buffer_depth)
        });
        match window_end {
            Some(window_end) if now > window_end => SegmentAvailability::Expired,
            _ => SegmentAvailability::Available,
        }
    }

    /// Presentation time span the time shift buffer covers at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> Option<(Duration, Duration)> {
        let elapsed = self.elapsed(now)?;
        let start = match self.time_shift_buffer_depth.and_then(|depth| depth.to_std().ok()) {
            Some(depth) => elapsed.saturating_sub(depth),
            None => Duration::ZERO,
        };
        Some((start, elapsed))
    }

    /// Presentation time span a player may seek within, ending at the suggested
    /// presentation delay behind the live edge.
    pub fn seek_range(&self, now: DateTime<Utc>) -> Option<(Duration, Duration)> {
        let (start, edge) = self.window(now)?;
        let delay = self.suggested_presentation_delay.to_std().unwrap_or_default();
        Some((start, edge.saturating_sub(delay).max(start)))
    }

    /// Positions of the segments of `stream` that may be requested at `now`.
    pub fn available_segments(&self, stream: &ActiveStream, now: DateTime<Utc>) -> Range<u64> {
        if !self.dynamic {
            return 0..stream.segment_count().unwrap_or(u64::MAX);
        }
        let Some(elapsed) = self.elapsed(now) else {
            return 0..0;
        };

        let end = stream.segments_started_by(elapsed);
        let start = match self.time_shift_buffer_depth.and_then(|depth| depth.to_std().ok()) {
            Some(depth) if elapsed > depth => stream.segments_ended_before(elapsed - depth),
            _ => 0,
        };
        start.min(end)..end
    }

    /// Whether the manifest is due for a reload at `now`.
    pub fn update_due(&self, now: DateTime<Utc>) -> bool {
        if !self.dynamic {
            return false;
        }
        match (self.last_fetch, self.minimum_update_period) {
            (None, _) => true,
            (Some(last_fetch), Some(period)) => now - last_fetch >= delta_from_std(period),
            (Some(_), None) => false,
        }
    }

    /// [`Self::update_due`], or `stream` ran out of segments in an open ended period.
    pub fn reload_due(&self, now: DateTime<Utc>, stream: &ActiveStream) -> bool {
        self.update_due(now)
            || (self.dynamic && stream.is_exhausted() && stream.period().duration.is_none())
    }

    /// Time left until the next scheduled reload, `None` when the manifest is not updated.
    pub fn until_next_update(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.dynamic {
            return None;
        }
        let period = self.minimum_update_period?;
        let Some(last_fetch) = self.last_fetch else {
            return Some(Duration::ZERO);
        };
        // an update period beyond the representable range never comes due
        let next_update = last_fetch.checked_add_signed(delta_from_std(period))?;
        Some((next_update - now).to_std().unwrap_or_default())
    }
}

/// A manifest kept up to date.
///
/// The current snapshot is published through a `watch` channel: [`Manifest::reload`] is the
/// only writer and swaps the whole tree at once, readers never see a partial update.
pub struct Manifest<F> {
    fetcher: Arc<F>,
    config: StreamConfig,
    /// Updated by redirects and `Location`.
    url: RwLock<Url>,
    snapshot: watch::Sender<Arc<Mpd>>,
    tracker: RwLock<LiveEdgeTracker>,
}

impl<F: Fetcher> Manifest<F> {
    /// Fetch, parse and resolve `onLoad` xlinks, then synchronise the clock of a dynamic
    /// manifest.
    pub async fn load(fetcher: F, url: Url, config: StreamConfig) -> MpdResult<Self> {
        let fetcher = Arc::new(fetcher);
        let (mpd, url) = fetch_snapshot(&fetcher, &url).await?;

        let mut tracker = LiveEdgeTracker::from_mpd(&mpd, &config)?;
        if tracker.is_dynamic() {
            if let Err(e) = tracker
                .sync_clock(&mpd, Some(&url), &config, &fetcher)
                .await
            {
                tracing::warn!(error = %e, "Failed to synchronise clock, using local time");
            }
        }
        tracker.mark_fetched(tracker.now());

        let (snapshot, _) = watch::channel(Arc::new(mpd));
        Ok(Self {
            fetcher,
            config,
            url: RwLock::new(url),
            snapshot,
            tracker: RwLock::new(tracker),
        })
    }

    pub fn current(&self) -> Arc<Mpd> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Mpd>> {
        self.snapshot.subscribe()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub async fn url(&self) -> Url {
        self.url.read().await.clone()
    }

    pub async fn tracker(&self) -> LiveEdgeTracker {
        self.tracker.read().await.clone()
    }

    /// Pin a representation of the current snapshot.
    pub async fn stream(
        &self,
        period_index: usize,
        adaptation_set_index: usize,
        representation_index: usize,
    ) -> MpdResult<ActiveStream> {
        ActiveStream::new(
            self.current(),
            Some(self.url().await),
            period_index,
            adaptation_set_index,
            representation_index,
            &self.config,
        )
    }

    /// Next request of `stream` within the availability window at the synchronised time.
    pub async fn next_available_request(
        &self,
        stream: &mut ActiveStream,
    ) -> MpdResult<Option<SegmentRequest>> {
        let tracker = self.tracker.read().await;
        stream.next_available_request(&tracker, tracker.now())
    }

    /// Fetch a new snapshot and publish it.
    ///
    /// Nothing is published when the reload fails or the future is dropped early.
    pub async fn reload(&self) -> MpdResult<Arc<Mpd>> {
        let url = self.url().await;
        let target = self
            .current()
            .locations
            .first()
            .and_then(|location| resolve_url(Some(&url), location).ok())
            .unwrap_or(url);

        let (mpd, url) = fetch_snapshot(&self.fetcher, &target).await?;
        {
            let mut tracker = self.tracker.write().await;
            tracker.update(&mpd, &self.config)?;
            let now = tracker.now();
            tracker.mark_fetched(now);
        }
        *self.url.write().await = url;

        let mpd = Arc::new(mpd);
        self.snapshot.send_replace(mpd.clone());
        tracing::debug!(periods = mpd.periods.len(), "Manifest reloaded");
        Ok(mpd)
    }
}

impl<F: Fetcher + 'static> Manifest<F> {
    /// Reload on the `minimumUpdatePeriod` schedule until `token` is cancelled or the
    /// manifest stops being updated.
    pub fn spawn_refresh(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let wait = {
                    let tracker = self.tracker.read().await;
                    match tracker.until_next_update(tracker.now()) {
                        Some(wait) => wait.max(MIN_RELOAD_INTERVAL),
                        None => break,
                    }
                };

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {}
                }

                tokio::select! {
                    _ = token.cancelled() => break,
                    result = self.reload() => {
                        if let Err(e) = result {
                            tracing::warn!(error = %e, "Failed to reload manifest");
                            let mut tracker = self.tracker.write().await;
                            let now = tracker.now();
                            tracker.mark_fetched(now);
                        }
                    }
                }
            }
            tracing::debug!("Manifest refresh stopped");
        })
    }
}

async fn fetch_snapshot<F: Fetcher>(fetcher: &Arc<F>, url: &Url) -> MpdResult<(Mpd, Url)> {
    let response = fetcher.fetch(url).await?;
    let mpd = parser::parse(&response.body)?;
    let resolver = XlinkResolver::new(fetcher.clone(), Some(response.url.clone()));
    let mpd = resolver.resolve_on_load(&mpd).await;
    Ok((mpd, response.url))
}
