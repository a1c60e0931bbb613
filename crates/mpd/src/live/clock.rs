use chrono::{DateTime, TimeDelta, Utc};
use url::Url;

use crate::{
    error::{MpdError, MpdResult},
    fetch::Fetcher,
    node::{UtcTiming, UtcTimingMethod},
    types::parse_date_time,
    util::url::resolve_url,
};

/// Seconds between the NTP epoch (1900) and the unix epoch.
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

#[derive(Debug, Clone, Copy, Default)]
pub struct Clock {
    /// How much time the local clock is behind the remote clock
    offset: TimeDelta,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            offset: TimeDelta::zero(),
        }
    }

    pub fn with_offset(offset: TimeDelta) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> TimeDelta {
        self.offset
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now() + self.offset
    }

    fn set_time(
        &mut self,
        remote_now: DateTime<Utc>,
        before_request: DateTime<Utc>,
        after_request: DateTime<Utc>,
    ) {
        // <before_request> (inaccurate now time)
        // <remote_now> (accurate remote time)
        // <after_request>
        //
        // the remote clock was read half a round trip before the response arrived
        let half_rtt = (after_request - before_request) / 2;
        let server_now = remote_now + half_rtt;
        self.offset = server_now - after_request;
        tracing::info!(offset_milliseconds = %self.offset.num_milliseconds(), "Clock time set to {}, offset calculated", remote_now);
    }

    /// Synchronise with the first `UTCTiming` source that answers.
    ///
    /// Sources are tried in the order of `preference`, or in manifest order when it is empty.
    /// Without any `UTCTiming` the local clock is used as is.
    pub async fn sync<F: Fetcher>(
        &mut self,
        timings: &[UtcTiming],
        preference: &[UtcTimingMethod],
        document_url: Option<&Url>,
        fetcher: &F,
    ) -> MpdResult<()> {
        if timings.is_empty() {
            tracing::warn!("No UTCTiming elements found in MPD, using local time.");
            self.offset = TimeDelta::zero();
            return Ok(());
        }

        let candidates: Vec<&UtcTiming> = if preference.is_empty() {
            timings.iter().collect()
        } else {
            preference
                .iter()
                .flat_map(|method| timings.iter().filter(move |timing| timing.method == *method))
                .collect()
        };
        if candidates.is_empty() {
            return Err(MpdError::InvalidTimingSchema(
                "No UTCTiming method matches the preference".to_string(),
            ));
        }

        let mut last_error: Option<MpdError> = None;
        for timing in candidates {
            for value in &timing.urls {
                tracing::debug!(method = ?timing.method, value = %value, "Attempting to sync time");
                match self.sync_with(timing.method, value, document_url, fetcher).await {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        tracing::warn!(method = ?timing.method, value = %value, error = %e, "Time sync failed");
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            MpdError::InvalidTimingSchema("All supported time sync methods failed".to_string())
        }))
    }

    async fn sync_with<F: Fetcher>(
        &mut self,
        method: UtcTimingMethod,
        value: &str,
        document_url: Option<&Url>,
        fetcher: &F,
    ) -> MpdResult<()> {
        let before_request = Utc::now();
        match method {
            UtcTimingMethod::Direct => {
                let remote_now = parse_iso8601_response(value)?;
                self.set_time(remote_now, before_request, before_request);
            }
            UtcTimingMethod::HttpXsdate | UtcTimingMethod::HttpIso => {
                let url = resolve_url(document_url, value)?;
                let response = fetcher.fetch(&url).await?;
                let after_request = Utc::now();
                let text = std::str::from_utf8(&response.body)?;
                self.set_time(
                    parse_iso8601_response(text.trim())?,
                    before_request,
                    after_request,
                );
            }
            UtcTimingMethod::HttpHead => {
                let url = resolve_url(document_url, value)?;
                let remote_now = fetcher.fetch_date(&url).await?;
                self.set_time(remote_now, before_request, Utc::now());
            }
            UtcTimingMethod::HttpNtp => {
                let url = resolve_url(document_url, value)?;
                let response = fetcher.fetch(&url).await?;
                let after_request = Utc::now();
                self.set_time(
                    parse_ntp_timestamp(&response.body)?,
                    before_request,
                    after_request,
                );
            }
            UtcTimingMethod::Ntp | UtcTimingMethod::Sntp => {
                return Err(MpdError::InvalidTimingSchema(format!(
                    "Unsupported scheme: {}",
                    method.scheme_id_uri()
                )));
            }
        }
        Ok(())
    }
}

fn parse_iso8601_response(response_text: &str) -> MpdResult<DateTime<Utc>> {
    match parse_date_time(response_text) {
        Ok(datetime) => datetime.to_utc(),
        Err(_) => Ok(DateTime::parse_from_rfc3339(response_text)?.with_timezone(&Utc)),
    }
}

/// 64 bit NTP timestamp: big endian seconds since 1900 and a 32 bit fraction.
fn parse_ntp_timestamp(body: &[u8]) -> MpdResult<DateTime<Utc>> {
    let invalid = || MpdError::DateTimeParsing(format!("Invalid NTP timestamp of {} bytes", body.len()));

    let bytes: [u8; 8] = body.get(..8).and_then(|b| b.try_into().ok()).ok_or_else(invalid)?;
    let seconds = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let fraction = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

    let nanos = (u64::from(fraction) * 1_000_000_000) >> 32;
    DateTime::from_timestamp(i64::from(seconds) - NTP_UNIX_OFFSET, nanos as u32).ok_or_else(invalid)
}
