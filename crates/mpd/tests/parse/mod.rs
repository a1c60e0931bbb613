use iori_mpd::{
    parse_str,
    stream::effective_segment_template,
    types::{format_duration, parse_duration},
    MpdError, MpdType, StreamType,
};

use crate::AssertWrapper;

const STATIC: &str = include_str!("../fixtures/static-two-minutes.mpd");

#[test]
fn test_parse_static_manifest() -> anyhow::Result<()> {
    let mpd = parse_str(STATIC)?;

    assert_eq!(mpd.mpd_type, MpdType::Static);
    assert_eq!(mpd.media_presentation_duration, Some(120_000));
    assert_eq!(mpd.min_buffer_time, Some(4_000));

    let period = mpd.periods.first().assert_success();
    assert_eq!(period.id.as_deref(), Some("main"));

    let adaptation_set = &period.adaptation_sets[0];
    assert_eq!(adaptation_set.representations.len(), 2);

    let high = adaptation_set.representation("high").assert_success();
    assert_eq!(high.bandwidth, 2_400_000);
    // inherited from the adaptation set
    assert_eq!(
        high.representation_base.mime_type.as_deref(),
        Some("video/mp4")
    );
    let caps = high.caps().assert_success();
    assert_eq!(caps.stream_type, StreamType::Video);
    assert_eq!(caps.media_type, "video/x-h264");

    Ok(())
}

#[test]
fn test_missing_bandwidth_drops_representation() -> anyhow::Result<()> {
    let mpd = parse_str(
        r#"<MPD mediaPresentationDuration="PT10S">
          <Period>
            <AdaptationSet>
              <SegmentTemplate media="$Number$.m4s" duration="2"/>
              <Representation id="broken"/>
              <Representation id="fine" bandwidth="1000"/>
            </AdaptationSet>
            <AdaptationSet>
              <SegmentTemplate media="$Number$.m4s" duration="2"/>
              <Representation id="other" bandwidth="2000"/>
            </AdaptationSet>
          </Period>
        </MPD>"#,
    )?;

    let period = &mpd.periods[0];
    let ids: Vec<_> = period.adaptation_sets[0]
        .representations
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(ids, ["fine"]);
    assert_eq!(period.adaptation_sets[1].representations.len(), 1);

    Ok(())
}

#[test]
fn test_structural_errors() {
    let result = parse_str("<Manifest/>");
    assert!(matches!(result, Err(MpdError::NotMpd(_))));
    assert!(result.unwrap_err().is_manifest_invalid());

    parse_str("<MPD><Period>").assert_error();
    let result = parse_str(r#"<?xml version="1.0" encoding="Shift_JIS"?><MPD/>"#);
    assert!(result.unwrap_err().is_manifest_invalid());
    parse_str("").assert_error();
    parse_str(r#"<MPD mediaPresentationDuration="two minutes"/>"#).assert_error();
}

#[test]
fn test_child_template_wins() -> anyhow::Result<()> {
    let representation = r#"<Representation id="v" bandwidth="1">
        <SegmentTemplate media="own-$Number$.m4s" index="own.sidx" initialization="own.mp4"
          timescale="1000" duration="2000" startNumber="5" presentationTimeOffset="7"/>
      </Representation>"#;

    let templates = [
        r#"<SegmentTemplate media="parent-$Number$.m4s" timescale="10" duration="3"
             startNumber="9" initialization="parent.mp4" presentationTimeOffset="1"/>"#,
        r#"<SegmentTemplate media="other.m4s" duration="1"/>"#,
        "",
    ]
    .into_iter()
    .map(|parent| {
        let mpd = parse_str(&format!(
            r#"<MPD mediaPresentationDuration="PT10S"><Period>{parent}
              <AdaptationSet>{parent}{representation}</AdaptationSet>
            </Period></MPD>"#
        ))?;
        Ok(mpd.periods[0].adaptation_sets[0].representations[0]
            .segment_template
            .clone()
            .assert_success())
    })
    .collect::<anyhow::Result<Vec<_>>>()?;

    assert_eq!(templates[0], templates[1]);
    assert_eq!(templates[1], templates[2]);

    let template = &templates[0];
    assert_eq!(template.media.as_deref(), Some("own-$Number$.m4s"));
    assert_eq!(template.mult_segment_base.start_number, 5);
    assert_eq!(template.mult_segment_base.duration, Some(2000));
    assert_eq!(template.mult_segment_base.segment_base.timescale, 1000);
    assert_eq!(
        template.mult_segment_base.segment_base.presentation_time_offset,
        7
    );

    Ok(())
}

#[test]
fn test_absent_template_is_inherited() -> anyhow::Result<()> {
    let mpd = parse_str(STATIC)?;
    let period = &mpd.periods[0];
    let adaptation_set = &period.adaptation_sets[0];

    for representation in &adaptation_set.representations {
        assert_eq!(representation.segment_template, None);
        let effective = effective_segment_template(period, adaptation_set, representation)
            .assert_success();
        assert_eq!(Some(effective), adaptation_set.segment_template.as_ref());
    }

    Ok(())
}

#[test]
fn test_partial_template_inherits_missing_fields() -> anyhow::Result<()> {
    let mpd = parse_str(
        r#"<MPD mediaPresentationDuration="PT10S"><Period><AdaptationSet>
          <SegmentTemplate media="$Number$.m4s" initialization="init.mp4" timescale="10" duration="20"/>
          <Representation id="v" bandwidth="1">
            <SegmentTemplate media="v/$Number$.m4s"/>
          </Representation>
        </AdaptationSet></Period></MPD>"#,
    )?;

    let template = mpd.periods[0].adaptation_sets[0].representations[0]
        .segment_template
        .as_ref()
        .assert_success();
    assert_eq!(template.media.as_deref(), Some("v/$Number$.m4s"));
    assert_eq!(template.initialization.as_deref(), Some("init.mp4"));
    assert_eq!(template.mult_segment_base.duration, Some(20));
    assert_eq!(template.mult_segment_base.segment_base.timescale, 10);

    Ok(())
}

#[test]
fn test_duration_round_trip() {
    let values = [
        0,
        1,
        999,
        1_000,
        59_999,
        60_000,
        3_599_999,
        3_600_000,
        86_399_999,
        86_400_000,
        90_061_001,
        31_536_000_000,
    ];
    for ms in values {
        let formatted = format_duration(ms);
        assert_eq!(parse_duration(&formatted).unwrap(), ms, "{formatted}");
    }
}

#[test]
fn test_serialize_and_parse_again() -> anyhow::Result<()> {
    let mpd = parse_str(STATIC)?;
    let xml = mpd.to_xml_string()?;
    assert!(xml.starts_with("<?xml"));

    let reparsed = parse_str(&xml)?;
    assert_eq!(reparsed.periods, mpd.periods);
    assert_eq!(
        reparsed.media_presentation_duration,
        mpd.media_presentation_duration
    );
    assert_eq!(reparsed.profiles, mpd.profiles);

    Ok(())
}
