use url::Url;

use crate::{
    error::{MpdError, MpdResult},
    node::BaseUrl,
};

pub fn is_absolute_url(s: &str) -> bool {
    s.starts_with("http://")
        || s.starts_with("https://")
        || s.starts_with("file://")
        || s.starts_with("ftp://")
}

pub fn merge_baseurls(current: &Url, new: &str) -> MpdResult<Url> {
    if is_absolute_url(new) {
        Ok(Url::parse(new)?)
    } else {
        // The query of the current URL (the manifest URL, the URL it redirected to, or a
        // BaseURL) is carried over to the merged URL unless the new URL brings its own.
        //
        // merge_baseurls(https://example.com/manifest.mpd?auth=secret, /video42.mp4) =>
        //   https://example.com/video42.mp4?auth=secret
        //
        // merge_baseurls(https://example.com/manifest.mpd?auth=old, /video42.mp4?auth=new) =>
        //   https://example.com/video42.mp4?auth=new
        let mut merged = current.join(new)?;
        if merged.query().is_none() {
            merged.set_query(current.query());
        }
        Ok(merged)
    }
}

/// Join `new` against `current` when there is one, otherwise `new` must be absolute.
pub fn resolve_url(current: Option<&Url>, new: &str) -> MpdResult<Url> {
    match current {
        Some(current) => merge_baseurls(current, new),
        None if is_absolute_url(new) => Ok(Url::parse(new)?),
        None => Err(MpdError::InvalidBaseUrl),
    }
}

/// Pick one mirror among the `BaseURL`s of a level.
///
/// The first entry whose `@serviceLocation` appears earliest in `preference` wins, and the
/// first entry in document order when nothing matches.
pub fn select_base_url<'a>(candidates: &'a [BaseUrl], preference: &[String]) -> Option<&'a BaseUrl> {
    preference
        .iter()
        .find_map(|location| {
            candidates
                .iter()
                .find(|candidate| candidate.service_location.as_ref() == Some(location))
        })
        .or_else(|| candidates.first())
}
