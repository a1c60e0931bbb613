//! Resolution of remote `Period`, `AdaptationSet` and `SegmentList` elements.
//!
//! A placeholder is either resolved into zero or more fetched elements, or left untouched
//! when the fetch or the fragment parse fails. Resolution always works on a copy of the
//! snapshot, so a cancelled or failed resolution never leaks a partial splice.

use futures::future::join_all;
use url::Url;

use crate::{
    error::{MpdError, MpdResult},
    fetch::Fetcher,
    node::{AdaptationSet, Mpd, Period, SegmentList, RESOLVE_TO_ZERO},
    parser,
    util::url::resolve_url,
    xml::{self, XmlElement},
};

/// Where a `SegmentList` sits in the tree, as indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentListLocation {
    Period(usize),
    AdaptationSet(usize, usize),
    Representation(usize, usize, usize),
}

impl SegmentListLocation {
    pub fn get(self, mpd: &Mpd) -> Option<&SegmentList> {
        match self {
            Self::Period(p) => mpd.periods.get(p)?.segment_list.as_ref(),
            Self::AdaptationSet(p, a) => mpd
                .periods
                .get(p)?
                .adaptation_sets
                .get(a)?
                .segment_list
                .as_ref(),
            Self::Representation(p, a, r) => mpd
                .periods
                .get(p)?
                .adaptation_sets
                .get(a)?
                .representations
                .get(r)?
                .segment_list
                .as_ref(),
        }
    }

    fn slot(self, mpd: &mut Mpd) -> Option<&mut Option<SegmentList>> {
        match self {
            Self::Period(p) => Some(&mut mpd.periods.get_mut(p)?.segment_list),
            Self::AdaptationSet(p, a) => Some(
                &mut mpd
                    .periods
                    .get_mut(p)?
                    .adaptation_sets
                    .get_mut(a)?
                    .segment_list,
            ),
            Self::Representation(p, a, r) => Some(
                &mut mpd
                    .periods
                    .get_mut(p)?
                    .adaptation_sets
                    .get_mut(a)?
                    .representations
                    .get_mut(r)?
                    .segment_list,
            ),
        }
    }

    /// The resolved list one level up, which the fetched list inherits from.
    fn parent(self, mpd: &Mpd) -> Option<&SegmentList> {
        let parent = match self {
            Self::Period(_) => None,
            Self::AdaptationSet(p, _) => Self::Period(p).get(mpd),
            Self::Representation(p, a, _) => Self::AdaptationSet(p, a)
                .get(mpd)
                .or_else(|| Self::Period(p).get(mpd)),
        };
        parent.filter(|list| !list.xlink.is_unresolved())
    }
}

pub struct XlinkResolver<F> {
    fetcher: F,
    document_url: Option<Url>,
}

impl<F: Fetcher> XlinkResolver<F> {
    /// Relative `xlink:href`s resolve against `document_url`.
    pub fn new(fetcher: F, document_url: Option<Url>) -> Self {
        Self {
            fetcher,
            document_url,
        }
    }

    async fn fetch_fragment(&self, href: &str, expected: &str) -> MpdResult<Vec<XmlElement>> {
        if href == RESOLVE_TO_ZERO {
            return Ok(Vec::new());
        }

        let url = resolve_url(self.document_url.as_ref(), href)?;
        tracing::debug!(%url, expected, "Fetching xlink fragment");
        let response = self.fetcher.fetch(&url).await?;
        let elements = xml::parse_fragment(&response.body)?;
        if let Some(other) = elements.iter().find(|e| e.local_name() != expected) {
            return Err(MpdError::XlinkResolution {
                href: href.to_string(),
                reason: format!("expected {expected} fragment, found {}", other.name),
            });
        }
        Ok(elements)
    }

    /// Fetch and parse the periods a placeholder stands for.
    pub async fn fetch_periods(&self, href: &str) -> MpdResult<Vec<Period>> {
        let elements = self.fetch_fragment(href, "Period").await;
        elements
            .and_then(|elements| elements.iter().map(parser::parse_period).collect())
            .map_err(|e| failure(href, e))
    }

    /// Fetch and parse the adaptation sets a placeholder of `period` stands for.
    pub async fn fetch_adaptation_sets(
        &self,
        href: &str,
        period: &Period,
    ) -> MpdResult<Vec<AdaptationSet>> {
        let elements = self.fetch_fragment(href, "AdaptationSet").await;
        elements
            .and_then(|elements| {
                elements
                    .iter()
                    .map(|e| parser::parse_adaptation_set(e, period))
                    .collect()
            })
            .map_err(|e| failure(href, e))
    }

    /// Fetch and parse a segment list, `None` when it resolves to nothing.
    pub async fn fetch_segment_list(
        &self,
        href: &str,
        parent: Option<&SegmentList>,
    ) -> MpdResult<Option<SegmentList>> {
        let elements = self.fetch_fragment(href, "SegmentList").await;
        elements
            .and_then(|elements| match elements.as_slice() {
                [] => Ok(None),
                [element] => parser::parse_segment_list(element, parent).map(Some),
                _ => Err(MpdError::XlinkResolution {
                    href: href.to_string(),
                    reason: "more than one SegmentList in fragment".to_string(),
                }),
            })
            .map_err(|e| failure(href, e))
    }

    /// Resolve the period placeholder at `index` into a new snapshot.
    pub async fn resolve_period(&self, mpd: &Mpd, index: usize) -> MpdResult<Mpd> {
        let period = mpd.periods.get(index).ok_or(MpdError::NoPeriodFound)?;
        let Some(href) = &period.xlink.href else {
            return Ok(mpd.clone());
        };

        let periods = self.fetch_periods(href).await?;
        let mut resolved = mpd.clone();
        resolved.periods.splice(index..=index, periods);
        Ok(resolved)
    }

    /// Resolve one adaptation set placeholder into a new snapshot, siblings are untouched.
    pub async fn resolve_adaptation_set(
        &self,
        mpd: &Mpd,
        period_index: usize,
        index: usize,
    ) -> MpdResult<Mpd> {
        let period = mpd.periods.get(period_index).ok_or(MpdError::NoPeriodFound)?;
        let adaptation_set = period
            .adaptation_sets
            .get(index)
            .ok_or(MpdError::NoAdaptationSetFound)?;
        let Some(href) = &adaptation_set.xlink.href else {
            return Ok(mpd.clone());
        };

        let adaptation_sets = self.fetch_adaptation_sets(href, period).await?;
        let mut resolved = mpd.clone();
        resolved.periods[period_index]
            .adaptation_sets
            .splice(index..=index, adaptation_sets);
        Ok(resolved)
    }

    pub async fn resolve_segment_list(
        &self,
        mpd: &Mpd,
        location: SegmentListLocation,
    ) -> MpdResult<Mpd> {
        let segment_list = location.get(mpd).ok_or_else(|| {
            MpdError::UnresolvedXlink(format!("no SegmentList at {location:?}"))
        })?;
        let Some(href) = &segment_list.xlink.href else {
            return Ok(mpd.clone());
        };

        let fetched = self
            .fetch_segment_list(href, location.parent(mpd))
            .await?;
        let mut resolved = mpd.clone();
        if let Some(slot) = location.slot(&mut resolved) {
            *slot = fetched;
        }
        Ok(resolved)
    }

    /// Resolve every `actuate="onLoad"` placeholder.
    ///
    /// Placeholders are fetched concurrently. Failed ones are logged and kept as they are.
    /// Levels are resolved top down, so onLoad adaptation sets and segment lists inside
    /// fetched periods are resolved too. A fetched period that is itself a placeholder is
    /// kept as one.
    pub async fn resolve_on_load(&self, mpd: &Mpd) -> Mpd {
        let mut resolved = mpd.clone();

        // periods
        let pending: Vec<(usize, String)> = resolved
            .periods
            .iter()
            .enumerate()
            .filter(|(_, period)| period.xlink.is_on_load())
            .filter_map(|(index, period)| Some((index, period.xlink.href.clone()?)))
            .collect();
        let results = join_all(pending.iter().map(|(_, href)| self.fetch_periods(href))).await;
        for ((index, href), result) in pending.into_iter().zip(results).rev() {
            match result {
                Ok(periods) => {
                    tracing::debug!(%href, count = periods.len(), "Period xlink resolved");
                    resolved.periods.splice(index..=index, periods);
                }
                Err(e) => tracing::warn!(%href, error = %e, "Failed to resolve Period xlink"),
            }
        }

        // adaptation sets
        let pending: Vec<(usize, usize, String)> = resolved
            .periods
            .iter()
            .enumerate()
            .flat_map(|(p, period)| {
                period
                    .adaptation_sets
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| a.xlink.is_on_load())
                    .filter_map(move |(a, adaptation_set)| {
                        Some((p, a, adaptation_set.xlink.href.clone()?))
                    })
            })
            .collect();
        let results = join_all(pending.iter().map(|(p, _, href)| {
            self.fetch_adaptation_sets(href, &resolved.periods[*p])
        }))
        .await;
        for ((p, a, href), result) in pending.into_iter().zip(results).rev() {
            match result {
                Ok(adaptation_sets) => {
                    tracing::debug!(%href, count = adaptation_sets.len(), "AdaptationSet xlink resolved");
                    resolved.periods[p].adaptation_sets.splice(a..=a, adaptation_sets);
                }
                Err(e) => tracing::warn!(%href, error = %e, "Failed to resolve AdaptationSet xlink"),
            }
        }

        // segment lists, outer levels first so inner ones inherit resolved values
        for level in 0..3 {
            let pending: Vec<(SegmentListLocation, String)> = segment_list_locations(&resolved)
                .into_iter()
                .filter(|location| level_of(*location) == level)
                .filter_map(|location| {
                    let list = location.get(&resolved)?;
                    list.xlink
                        .is_on_load()
                        .then(|| list.xlink.href.clone())
                        .flatten()
                        .map(|href| (location, href))
                })
                .collect();
            let results = join_all(pending.iter().map(|(location, href)| {
                self.fetch_segment_list(href, location.parent(&resolved))
            }))
            .await;
            for ((location, href), result) in pending.into_iter().zip(results) {
                match result {
                    Ok(segment_list) => {
                        if let Some(slot) = location.slot(&mut resolved) {
                            *slot = segment_list;
                        }
                    }
                    Err(e) => tracing::warn!(%href, error = %e, "Failed to resolve SegmentList xlink"),
                }
            }
        }

        resolved
    }
}

fn failure(href: &str, e: MpdError) -> MpdError {
    match e {
        e @ MpdError::XlinkResolution { .. } => e,
        e => MpdError::XlinkResolution {
            href: href.to_string(),
            reason: e.to_string(),
        },
    }
}

fn level_of(location: SegmentListLocation) -> usize {
    match location {
        SegmentListLocation::Period(_) => 0,
        SegmentListLocation::AdaptationSet(..) => 1,
        SegmentListLocation::Representation(..) => 2,
    }
}

fn segment_list_locations(mpd: &Mpd) -> Vec<SegmentListLocation> {
    let mut locations = Vec::new();
    for (p, period) in mpd.periods.iter().enumerate() {
        if period.segment_list.is_some() {
            locations.push(SegmentListLocation::Period(p));
        }
        for (a, adaptation_set) in period.adaptation_sets.iter().enumerate() {
            if adaptation_set.segment_list.is_some() {
                locations.push(SegmentListLocation::AdaptationSet(p, a));
            }
            for (r, representation) in adaptation_set.representations.iter().enumerate() {
                if representation.segment_list.is_some() {
                    locations.push(SegmentListLocation::Representation(p, a, r));
                }
            }
        }
    }
    locations
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::{fetch::FetchResponse, parser::parse_str};

    struct MemoryFetcher(HashMap<&'static str, &'static str>);

    impl Fetcher for MemoryFetcher {
        async fn fetch(&self, url: &Url) -> MpdResult<FetchResponse> {
            let body = self
                .0
                .get(url.as_str())
                .ok_or(MpdError::HttpError(reqwest::StatusCode::NOT_FOUND))?;
            Ok(FetchResponse {
                url: url.clone(),
                body: Bytes::from_static(body.as_bytes()),
            })
        }

        async fn fetch_date(&self, _url: &Url) -> MpdResult<DateTime<Utc>> {
            Ok(Utc::now())
        }
    }

    fn resolver(files: &[(&'static str, &'static str)]) -> XlinkResolver<MemoryFetcher> {
        XlinkResolver::new(
            MemoryFetcher(files.iter().copied().collect()),
            Some(Url::parse("https://example.com/manifest.mpd").unwrap()),
        )
    }

    const MANIFEST: &str = r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" xmlns:xlink="http://www.w3.org/1999/xlink">
      <Period id="p0" xlink:href="periods.xml" xlink:actuate="onLoad"/>
      <Period id="p1" xlink:href="urn:mpeg:dash:resolve-to-zero:2013" xlink:actuate="onLoad"/>
      <Period id="p2" xlink:href="missing.xml" xlink:actuate="onLoad"/>
      <Period id="p3" xlink:href="later.xml"/>
    </MPD>"#;

    #[tokio::test]
    async fn test_resolve_on_load() {
        let resolver = resolver(&[(
            "https://example.com/periods.xml",
            r#"<Period id="a" duration="PT10S"/><Period id="b" duration="PT5S"/>"#,
        )]);
        let mpd = parse_str(MANIFEST).unwrap();
        let resolved = resolver.resolve_on_load(&mpd).await;

        let ids: Vec<_> = resolved
            .periods
            .iter()
            .map(|p| p.id.as_deref().unwrap_or_default())
            .collect();
        // p1 resolves to zero, p2 fails and stays, p3 waits for a request
        assert_eq!(ids, vec!["a", "b", "p2", "p3"]);
        assert!(resolved.periods[2].xlink.is_unresolved());
        assert!(resolved.periods[3].xlink.is_unresolved());
        assert_eq!(resolved.periods[0].duration, Some(10_000));

        // the input snapshot is untouched
        assert_eq!(mpd.periods.len(), 4);
    }

    #[tokio::test]
    async fn test_on_load_inside_fetched_period() {
        let resolver = resolver(&[
            (
                "https://example.com/periods.xml",
                r#"<Period id="a" xmlns:xlink="http://www.w3.org/1999/xlink">
                  <AdaptationSet xlink:href="sets.xml" xlink:actuate="onLoad"/>
                  <AdaptationSet id="9" xlink:href="sets.xml"/>
                </Period>
                <Period id="b" xmlns:xlink="http://www.w3.org/1999/xlink"
                  xlink:href="periods.xml" xlink:actuate="onLoad"/>"#,
            ),
            (
                "https://example.com/sets.xml",
                r#"<AdaptationSet id="1"><Representation id="r" bandwidth="1"/></AdaptationSet>"#,
            ),
        ]);
        let mpd = parse_str(
            r#"<MPD xmlns:xlink="http://www.w3.org/1999/xlink">
              <Period xlink:href="periods.xml" xlink:actuate="onLoad"/>
            </MPD>"#,
        )
        .unwrap();
        let resolved = resolver.resolve_on_load(&mpd).await;
        assert_eq!(resolved.periods.len(), 2);

        let adaptation_sets = &resolved.periods[0].adaptation_sets;
        assert_eq!(adaptation_sets[0].id, Some(1));
        assert!(!adaptation_sets[0].xlink.is_unresolved());
        assert_eq!(adaptation_sets[0].representations[0].id, "r");
        // onRequest stays a placeholder
        assert!(adaptation_sets[1].xlink.is_unresolved());

        // a fetched period placeholder is not followed
        assert_eq!(resolved.periods[1].id.as_deref(), Some("b"));
        assert!(resolved.periods[1].xlink.is_unresolved());
    }

    #[tokio::test]
    async fn test_fragment_root_mismatch() {
        let resolver = resolver(&[("https://example.com/later.xml", r#"<AdaptationSet/>"#)]);
        let mpd = parse_str(MANIFEST).unwrap();
        let error = resolver.resolve_period(&mpd, 3).await.unwrap_err();
        assert!(matches!(error, MpdError::XlinkResolution { .. }));
    }

    #[tokio::test]
    async fn test_segment_list_inherits_parent() {
        let resolver = resolver(&[(
            "https://example.com/list.xml",
            r#"<SegmentList><SegmentURL media="1.ts"/></SegmentList>"#,
        )]);
        let mpd = parse_str(
            r#"<MPD xmlns:xlink="http://www.w3.org/1999/xlink"><Period>
              <SegmentList timescale="90000" duration="900000"/>
              <AdaptationSet><SegmentList xlink:href="list.xml"/></AdaptationSet>
            </Period></MPD>"#,
        )
        .unwrap();

        let location = SegmentListLocation::AdaptationSet(0, 0);
        let resolved = resolver.resolve_segment_list(&mpd, location).await.unwrap();
        let list = location.get(&resolved).unwrap();
        assert!(!list.xlink.is_unresolved());
        assert_eq!(list.mult_segment_base.segment_base.timescale, 90000);
        assert_eq!(list.segment_urls.len(), 1);
    }
}
