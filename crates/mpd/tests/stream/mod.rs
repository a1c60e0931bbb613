use std::{sync::Arc, time::Duration};

use iori_mpd::{
    parse_str, stream::stream_periods, template::Template, ActiveStream, AddressingScheme,
    MpdError, StreamConfig, StreamType,
};
use url::Url;

use crate::AssertWrapper;

const STATIC: &str = include_str!("../fixtures/static-two-minutes.mpd");
const MULTI_PERIOD: &str = include_str!("../fixtures/multi-period.mpd");

fn document_url() -> Option<Url> {
    Some(Url::parse("https://example.com/vod/manifest.mpd").unwrap())
}

#[test]
fn test_static_template_segments() -> anyhow::Result<()> {
    let mpd = Arc::new(parse_str(STATIC)?);
    let config = StreamConfig::default();

    let mut urls = Vec::new();
    for (representation_index, id) in [(0, "low"), (1, "high")] {
        let mut stream =
            ActiveStream::new(mpd.clone(), document_url(), 0, 0, representation_index, &config)?;
        assert_eq!(stream.scheme(), AddressingScheme::SegmentTemplate);
        assert_eq!(stream.representation().id, id);
        assert_eq!(stream.segment_count(), Some(30));

        let mut requests = Vec::new();
        while let Some(request) = stream.next_request()? {
            requests.push(request);
        }
        assert!(stream.is_exhausted());
        assert_eq!(requests.len(), 30);

        for (index, request) in requests.iter().enumerate() {
            assert_eq!(request.number, index as u64 + 1);
            assert_eq!(request.timestamp, Duration::from_secs(4 * index as u64));
            assert_eq!(request.duration, Duration::from_secs(4));
            assert!(!request.discontinuity);
        }

        let init = stream.initialization()?.assert_success();
        assert_eq!(
            init.uri.as_str(),
            format!("https://example.com/vod/init-{id}.mp4")
        );
        urls.push(
            requests
                .into_iter()
                .map(|request| request.uri.to_string())
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(urls[0][0], "https://example.com/vod/low/800000/seg-1.m4s");
    assert_eq!(urls[1][29], "https://example.com/vod/high/2400000/seg-30.m4s");
    // only the id and the bandwidth differ
    for (low, high) in urls[0].iter().zip(&urls[1]) {
        assert_eq!(low.replace("low/800000", "high/2400000"), *high);
    }

    Ok(())
}

#[test]
fn test_select_respects_limits() -> anyhow::Result<()> {
    let mpd = Arc::new(parse_str(STATIC)?);

    let stream = ActiveStream::select(
        mpd.clone(),
        document_url(),
        0,
        StreamType::Video,
        &StreamConfig::default(),
    )?;
    assert_eq!(stream.representation().id, "high");

    let mut config = StreamConfig::default();
    config.video.max_height = Some(480);
    let stream = ActiveStream::select(mpd.clone(), document_url(), 0, StreamType::Video, &config)?;
    assert_eq!(stream.representation().id, "low");

    let result = ActiveStream::select(mpd, document_url(), 0, StreamType::Audio, &config);
    assert!(matches!(result, Err(MpdError::NoAdaptationSetFound)));

    Ok(())
}

#[test]
fn test_seek_and_resume() -> anyhow::Result<()> {
    let mpd = Arc::new(parse_str(STATIC)?);
    let mut stream = ActiveStream::new(mpd, document_url(), 0, 0, 0, &StreamConfig::default())?;

    assert_eq!(stream.seek(Duration::from_secs(41)), 10);
    let request = stream.next_request()?.assert_success();
    assert_eq!(request.number, 11);
    assert_eq!(request.timestamp, Duration::from_secs(40));
    assert!(request.discontinuity);

    let request = stream.next_request()?.assert_success();
    assert_eq!(request.number, 12);
    assert!(!request.discontinuity);

    assert_eq!(stream.seek(Duration::from_secs(600)), 30);
    assert!(stream.next_request()?.is_none());

    Ok(())
}

#[test]
fn test_timeline_segments() -> anyhow::Result<()> {
    let mpd = Arc::new(parse_str(
        r#"<MPD mediaPresentationDuration="PT10S"><Period>
          <AdaptationSet mimeType="video/mp4">
            <SegmentTemplate media="$Time$.m4s" timescale="1000" startNumber="10">
              <SegmentTimeline>
                <S t="0" d="2000" r="2"/>
                <S d="4000"/>
              </SegmentTimeline>
            </SegmentTemplate>
            <Representation id="v" bandwidth="1"/>
          </AdaptationSet>
        </Period></MPD>"#,
    )?);
    let stream = ActiveStream::new(mpd, document_url(), 0, 0, 0, &StreamConfig::default())?;

    assert_eq!(stream.segment_count(), Some(4));
    let timings: Vec<_> = stream
        .segments()
        .map(|timing| (timing.number, timing.scale_start, timing.scale_duration))
        .collect();
    assert_eq!(
        timings,
        [(10, 0, 2000), (11, 2000, 2000), (12, 4000, 2000), (13, 6000, 4000)]
    );

    let last = stream.segment_request(3)?;
    assert_eq!(last.uri.as_str(), "https://example.com/vod/6000.m4s");
    assert_eq!(last.time, Some(6000));
    assert_eq!(last.duration, Duration::from_secs(4));
    stream.segment_request(4).assert_error();

    Ok(())
}

#[test]
fn test_template_substitution() {
    let mut template = Template::new();
    template
        .insert(Template::REPRESENTATION_ID, "720p")
        .insert(Template::NUMBER, 3);

    let url = "seg-$RepresentationID$-$Number%05d$.m4s";
    assert_eq!(template.resolve(url).unwrap(), "seg-720p-00003.m4s");
    // the same inputs always give the same url
    assert_eq!(template.resolve(url).unwrap(), template.resolve(url).unwrap());

    assert!(matches!(
        template.resolve("seg-$Foo$.m4s"),
        Err(MpdError::Template(_))
    ));
    assert!(matches!(
        template.resolve("seg-$Time$.m4s"),
        Err(MpdError::Template(_))
    ));
    assert_eq!(template.resolve("100$$.m4s").unwrap(), "100$.m4s");
}

#[test]
fn test_unsafe_representation_id() -> anyhow::Result<()> {
    let mpd = Arc::new(parse_str(
        r#"<MPD mediaPresentationDuration="PT4S"><Period><AdaptationSet>
          <SegmentTemplate media="$RepresentationID$/$Number$.m4s" duration="2"/>
          <Representation id="video 1" bandwidth="1"/>
        </AdaptationSet></Period></MPD>"#,
    )?);
    let stream = ActiveStream::new(mpd, document_url(), 0, 0, 0, &StreamConfig::default())?;

    assert!(matches!(
        stream.segment_request(0),
        Err(MpdError::Template(_))
    ));

    Ok(())
}

#[test]
fn test_multi_period_timing() -> anyhow::Result<()> {
    let mpd = parse_str(MULTI_PERIOD)?;
    let periods = stream_periods(&mpd);

    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0].start, Duration::ZERO);
    assert_eq!(periods[0].duration, Some(Duration::from_secs(10)));
    assert_eq!(periods[1].start, Duration::from_secs(10));
    assert_eq!(periods[1].duration, Some(Duration::from_secs(20)));
    assert_eq!(periods[1].end(), Some(Duration::from_secs(30)));

    Ok(())
}

#[test]
fn test_multi_period_service_location() -> anyhow::Result<()> {
    let mpd = Arc::new(parse_str(MULTI_PERIOD)?);

    let stream = ActiveStream::new(mpd.clone(), None, 0, 0, 0, &StreamConfig::default())?;
    assert_eq!(stream.segment_count(), Some(5));
    assert_eq!(
        stream.segment_request(0)?.uri.as_str(),
        "https://cdn-a.example.com/ad/0001.m4s"
    );

    let config = StreamConfig {
        service_location: vec!["b".to_string()],
        ..Default::default()
    };
    let stream = ActiveStream::new(mpd, None, 0, 0, 0, &config)?;
    let request = stream.segment_request(4)?;
    assert_eq!(request.uri.as_str(), "https://cdn-b.example.com/ad/0005.m4s");
    assert_eq!(request.timestamp, Duration::from_secs(8));

    Ok(())
}

#[test]
fn test_multi_period_open_timeline() -> anyhow::Result<()> {
    let mpd = Arc::new(parse_str(MULTI_PERIOD)?);
    let stream = ActiveStream::select(mpd, None, 1, StreamType::Video, &StreamConfig::default())?;

    // the repeat runs until the end of the period
    assert_eq!(stream.segment_count(), Some(10));
    let first = stream.segment_request(0)?;
    assert_eq!(first.uri.as_str(), "https://root.example.com/content/0.m4s");
    assert_eq!(first.timestamp, Duration::from_secs(10));

    let last = stream.segment_request(9)?;
    assert_eq!(
        last.uri.as_str(),
        "https://root.example.com/content/1620000.m4s"
    );
    assert_eq!(last.timestamp, Duration::from_secs(28));
    assert_eq!(stream.end_timestamp(&stream.segment(9)?), Duration::from_secs(30));

    Ok(())
}

#[test]
fn test_multi_period_segment_list() -> anyhow::Result<()> {
    let mpd = Arc::new(parse_str(MULTI_PERIOD)?);
    let mut stream =
        ActiveStream::select(mpd, None, 1, StreamType::Audio, &StreamConfig::default())?;

    assert_eq!(stream.scheme(), AddressingScheme::SegmentList);
    assert_eq!(stream.adaptation_set().lang.as_deref(), Some("en"));
    assert_eq!(
        stream.initialization()?.assert_success().uri.as_str(),
        "https://root.example.com/audio/init.mp4"
    );

    let mut requests = Vec::new();
    while let Some(request) = stream.next_request()? {
        requests.push((request.uri.to_string(), request.timestamp));
    }
    assert_eq!(
        requests,
        [
            (
                "https://root.example.com/audio/1.m4s".to_string(),
                Duration::from_secs(10)
            ),
            (
                "https://root.example.com/audio/2.m4s".to_string(),
                Duration::from_secs(12)
            ),
        ]
    );

    Ok(())
}
