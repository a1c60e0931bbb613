//! MPEG-DASH media presentation descriptions.
//!
//! ```text
//!  bytes ──parse──► Mpd ──XlinkResolver──► Mpd ──ActiveStream──► SegmentRequest
//!                    ▲                                 │
//!                    └──────── Manifest::reload ◄──────┘ (dynamic)
//! ```
//!
//! [`parser::parse`] builds an immutable [`Mpd`] tree with inheritance already applied,
//! [`xlink::XlinkResolver`] splices remote elements into a new snapshot, and
//! [`stream::ActiveStream`] turns one representation into segment requests. For dynamic
//! presentations [`live::Manifest`] keeps the snapshot fresh and [`live::LiveEdgeTracker`]
//! decides which segments are available.

pub mod caps;
pub mod config;
pub mod error;
pub mod fetch;
pub mod live;
pub mod node;
pub mod parser;
pub mod stream;
pub mod template;
pub mod types;
pub mod util;
pub mod xlink;
pub mod xml;

pub use caps::{MediaCaps, StreamType};
pub use config::{StreamConfig, StreamLimits};
pub use error::{MpdError, MpdResult};
pub use fetch::{FetchResponse, Fetcher, HttpFetcher};
pub use live::{LiveEdgeTracker, Manifest, SegmentAvailability};
pub use node::*;
pub use parser::{parse, parse_str};
pub use stream::{ActiveStream, AddressingScheme, SegmentRequest};
pub use types::ByteRange;
pub use util::http::HttpClient;
pub use xlink::XlinkResolver;
