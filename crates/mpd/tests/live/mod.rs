use std::{sync::Arc, time::Duration};

use chrono::TimeDelta;
use iori_mpd::{HttpFetcher, Manifest, MpdError, StreamConfig};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{init_test_tracing, setup_mock_server};

const LIVE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="dynamic"
     availabilityStartTime="2024-01-01T00:00:00Z" publishTime="2024-01-01T00:01:40Z"
     minimumUpdatePeriod="PT1S" timeShiftBufferDepth="PT30S">
  <Location>live-next.mpd</Location>
  <Period id="live" start="PT0S">
    <AdaptationSet id="1" contentType="video">
      <SegmentTemplate media="v/$Number$.m4s" duration="4" startNumber="0"/>
      <Representation id="v" bandwidth="1000000"/>
    </AdaptationSet>
  </Period>
  <UTCTiming schemeIdUri="urn:mpeg:dash:utc:http-xsdate:2014" value="time"/>
</MPD>"#;

// an audio set was published in front of the video set
const LIVE_NEXT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="dynamic"
     availabilityStartTime="2024-01-01T00:00:00Z" publishTime="2024-01-01T00:01:41Z"
     minimumUpdatePeriod="PT1S" timeShiftBufferDepth="PT30S">
  <Period id="live" start="PT0S">
    <AdaptationSet id="2" contentType="audio">
      <SegmentTemplate media="a/$Number$.m4s" duration="4" startNumber="0"/>
      <Representation id="a" bandwidth="128000"/>
    </AdaptationSet>
    <AdaptationSet id="1" contentType="video">
      <SegmentTemplate media="v/$Number$.m4s" duration="4" startNumber="0"/>
      <Representation id="v" bandwidth="1000000"/>
    </AdaptationSet>
  </Period>
  <UTCTiming schemeIdUri="urn:mpeg:dash:utc:http-xsdate:2014" value="time"/>
</MPD>"#;

async fn load_live() -> anyhow::Result<(wiremock::MockServer, Manifest<HttpFetcher>)> {
    init_test_tracing();
    let server = setup_mock_server(&[
        ("/live.mpd", LIVE),
        ("/live-next.mpd", LIVE_NEXT),
        ("/time", "2024-01-01T00:01:40Z"),
    ])
    .await;

    let url = Url::parse(&format!("{}/live.mpd", server.uri()))?;
    let manifest = Manifest::load(HttpFetcher::default(), url, StreamConfig::default()).await?;
    Ok((server, manifest))
}

#[tokio::test]
async fn test_live_edge_after_clock_sync() -> anyhow::Result<()> {
    let (_server, manifest) = load_live().await?;

    let tracker = manifest.tracker().await;
    assert!(tracker.is_dynamic());
    // the local clock is far ahead of the served time
    assert!(tracker.clock().offset() < TimeDelta::days(-30));
    assert_eq!(tracker.minimum_update_period(), Some(Duration::from_secs(1)));
    assert!(tracker.last_fetch().is_some());

    let stream = manifest.stream(0, 0, 0).await?;
    assert_eq!(stream.segment_count(), None);

    // 100s after the availability start with a 30s buffer
    let now = tracker.now();
    assert_eq!(tracker.available_segments(&stream, now), 17..26);

    let (start, edge) = tracker.window(now).unwrap();
    assert_eq!(start.as_secs(), 70);
    assert_eq!(edge.as_secs(), 100);

    let request = stream.segment_request(25)?;
    assert_eq!(request.number, 25);
    assert_eq!(
        request.uri.as_str(),
        format!("{}/v/25.m4s", manifest.url().await.origin().ascii_serialization())
    );

    // a fresh cursor starts at the oldest segment still in the buffer
    let mut stream = stream;
    let request = manifest.next_available_request(&mut stream).await?.unwrap();
    assert_eq!(request.number, 17);
    assert_eq!(request.timestamp, Duration::from_secs(68));
    assert!(request.discontinuity);

    Ok(())
}

#[tokio::test]
async fn test_reload_follows_location() -> anyhow::Result<()> {
    let (_server, manifest) = load_live().await?;

    let mut receiver = manifest.subscribe();
    let mut stream = manifest.stream(0, 0, 0).await?;
    stream.set_position(20);

    manifest.reload().await?;
    assert!(receiver.has_changed()?);
    assert!(manifest.url().await.path().ends_with("/live-next.mpd"));

    let mpd = receiver.borrow_and_update().clone();
    assert_eq!(mpd.periods[0].adaptation_sets.len(), 2);

    // matched by id although the position changed
    stream.reconcile(mpd, manifest.config())?;
    assert_eq!(stream.adaptation_set().id, Some(1));
    assert_eq!(stream.representation().id, "v");
    assert_eq!(stream.position(), 20);

    let request = stream.next_request()?.unwrap();
    assert_eq!(request.timestamp, Duration::from_secs(80));
    assert!(!request.discontinuity);

    Ok(())
}

#[tokio::test]
async fn test_refresh_until_cancelled() -> anyhow::Result<()> {
    let (_server, manifest) = load_live().await?;
    let manifest = Arc::new(manifest);

    let mut receiver = manifest.subscribe();
    let token = CancellationToken::new();
    let handle = manifest.clone().spawn_refresh(token.clone());

    tokio::time::timeout(Duration::from_secs(10), receiver.changed()).await??;
    assert_eq!(receiver.borrow().periods[0].adaptation_sets.len(), 2);

    token.cancel();
    tokio::time::timeout(Duration::from_secs(10), handle).await??;

    Ok(())
}

#[tokio::test]
async fn test_static_manifest_is_not_refreshed() -> anyhow::Result<()> {
    init_test_tracing();
    let server = setup_mock_server(&[(
        "/vod.mpd",
        include_str!("../fixtures/static-two-minutes.mpd"),
    )])
    .await;
    let url = Url::parse(&format!("{}/vod.mpd", server.uri()))?;
    let manifest =
        Arc::new(Manifest::load(HttpFetcher::default(), url, StreamConfig::default()).await?);

    let tracker = manifest.tracker().await;
    assert!(!tracker.is_dynamic());
    assert!(!tracker.update_due(tracker.now()));

    let stream = manifest.stream(0, 0, 1).await?;
    assert_eq!(tracker.available_segments(&stream, tracker.now()), 0..30);

    // returns at once without a schedule
    let handle = manifest.spawn_refresh(CancellationToken::new());
    tokio::time::timeout(Duration::from_secs(10), handle).await??;

    Ok(())
}

#[tokio::test]
async fn test_dynamic_without_availability_start() -> anyhow::Result<()> {
    init_test_tracing();
    let server = setup_mock_server(&[(
        "/broken.mpd",
        r#"<MPD type="dynamic" minimumUpdatePeriod="PT2S"><Period id="p"/></MPD>"#,
    )])
    .await;
    let url = Url::parse(&format!("{}/broken.mpd", server.uri()))?;

    let result = Manifest::load(HttpFetcher::default(), url, StreamConfig::default()).await;
    assert!(matches!(
        result,
        Err(MpdError::MissingMandatoryField {
            field: "availabilityStartTime",
            ..
        })
    ));

    let url = Url::parse(&format!("{}/gone.mpd", server.uri()))?;
    let result = Manifest::load(HttpFetcher::default(), url, StreamConfig::default()).await;
    assert!(matches!(result, Err(MpdError::HttpError(status)) if status.as_u16() == 404));

    Ok(())
}
