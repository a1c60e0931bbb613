use std::sync::Arc;

use iori_mpd::{
    parse_str, ActiveStream, HttpFetcher, MpdError, StreamConfig, StreamType, XlinkResolver,
};
use url::Url;

use crate::{init_test_tracing, setup_mock_server, AssertWrapper};

const XLINK: &str = include_str!("../fixtures/xlink.mpd");
const PERIOD: &str = include_str!("../fixtures/period.xml");
const AUDIO: &str = include_str!("../fixtures/audio.xml");

async fn resolver() -> (wiremock::MockServer, XlinkResolver<HttpFetcher>) {
    let server = setup_mock_server(&[
        ("/xlink.mpd", XLINK),
        ("/period.xml", PERIOD),
        ("/audio.xml", AUDIO),
    ])
    .await;
    let document_url = Url::parse(&format!("{}/xlink.mpd", server.uri())).unwrap();
    let resolver = XlinkResolver::new(HttpFetcher::default(), Some(document_url));
    (server, resolver)
}

#[tokio::test]
async fn test_period_resolved_on_load() -> anyhow::Result<()> {
    init_test_tracing();
    let (_server, resolver) = resolver().await;

    let mpd = parse_str(XLINK)?;
    assert!(mpd.periods[0].xlink.is_unresolved());

    let resolved = resolver.resolve_on_load(&mpd).await;
    assert_eq!(resolved.periods.len(), 2);

    let remote = &resolved.periods[0];
    assert_eq!(remote.id.as_deref(), Some("remote"));
    assert!(!remote.xlink.is_unresolved());
    assert_eq!(remote.duration, Some(10_000));
    assert_eq!(remote.adaptation_sets[0].representations[0].id, "r");

    // onRequest adaptation sets wait until they are asked for
    let local = &resolved.periods[1];
    assert_eq!(local.adaptation_sets.len(), 4);
    assert!(local.adaptation_sets[1].xlink.is_unresolved());

    // the resolved period is playable
    let stream = ActiveStream::select(
        Arc::new(resolved),
        None,
        0,
        StreamType::Video,
        &StreamConfig::default(),
    )
    .assert_success();
    assert_eq!(stream.segment_count(), Some(5));

    Ok(())
}

#[tokio::test]
async fn test_unresolved_period_is_not_playable() -> anyhow::Result<()> {
    let mpd = Arc::new(parse_str(XLINK)?);
    let result = ActiveStream::new(mpd, None, 0, 0, 0, &StreamConfig::default());
    assert!(matches!(result, Err(MpdError::UnresolvedXlink(_))));
    Ok(())
}

#[tokio::test]
async fn test_adaptation_set_on_request() -> anyhow::Result<()> {
    init_test_tracing();
    let (_server, resolver) = resolver().await;

    let mpd = resolver.resolve_on_load(&parse_str(XLINK)?).await;
    let resolved = resolver.resolve_adaptation_set(&mpd, 1, 1).await?;

    let adaptation_sets = &resolved.periods[1].adaptation_sets;
    assert_eq!(adaptation_sets.len(), 4);
    let audio = &adaptation_sets[1];
    assert!(!audio.xlink.is_unresolved());
    assert_eq!(audio.lang.as_deref(), Some("ja"));
    assert_eq!(audio.representations[0].id, "a");

    // siblings keep their state
    assert_eq!(adaptation_sets[0], mpd.periods[1].adaptation_sets[0]);
    assert!(adaptation_sets[2].xlink.is_unresolved());
    assert!(adaptation_sets[3].xlink.is_unresolved());
    assert_eq!(resolved.periods[0], mpd.periods[0]);

    let stream = ActiveStream::select(
        Arc::new(resolved),
        None,
        1,
        StreamType::Audio,
        &StreamConfig::default(),
    )?;
    assert_eq!(stream.representation().id, "a");
    assert_eq!(stream.period().start, std::time::Duration::from_secs(10));

    Ok(())
}

#[tokio::test]
async fn test_failed_resolution_keeps_snapshot() -> anyhow::Result<()> {
    init_test_tracing();
    let (_server, resolver) = resolver().await;

    let mpd = resolver.resolve_on_load(&parse_str(XLINK)?).await;
    let before = mpd.clone();

    let error = resolver.resolve_adaptation_set(&mpd, 1, 2).await.unwrap_err();
    assert!(matches!(error, MpdError::XlinkResolution { .. }));
    assert_eq!(mpd, before);
    assert!(mpd.periods[1].adaptation_sets[2].xlink.is_unresolved());

    Ok(())
}

#[tokio::test]
async fn test_resolve_to_zero_removes_element() -> anyhow::Result<()> {
    let (_server, resolver) = resolver().await;

    let mpd = resolver.resolve_on_load(&parse_str(XLINK)?).await;
    let resolved = resolver.resolve_adaptation_set(&mpd, 1, 3).await?;

    let ids: Vec<_> = resolved.periods[1]
        .adaptation_sets
        .iter()
        .map(|adaptation_set| adaptation_set.id)
        .collect();
    assert_eq!(ids, [Some(1), Some(2), Some(3)]);

    // nothing left to resolve at that position
    resolver.resolve_adaptation_set(&resolved, 1, 3).await.assert_error();

    Ok(())
}
