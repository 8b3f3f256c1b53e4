//! Merges the primary and secondary listings into one collection keyed by
//! resolved filename.
//!
//! Each listing is drained into a [`SourceFetch`] first, so a failing source
//! only truncates its own items. The merge itself is two pure folds:
//! [`collect_primary`] builds the accumulator and [`reconcile`] folds the
//! secondary items into it. On a shared filename the primary record wins
//! every field and the secondary contributes only `pegasusId`.

use std::fmt;

use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

use crate::error::ListingError;
use crate::models::{RawVideo, VideoCollection};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Primary,
    Secondary,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Primary => write!(f, "primary (Marengo)"),
            Source::Secondary => write!(f, "secondary (Pegasus)"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceOutcome {
    Complete,
    /// The listing failed; items produced before the failure were kept.
    Partial { reason: String },
}

impl SourceOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, SourceOutcome::Complete)
    }
}

#[derive(Debug)]
pub struct SourceFetch {
    pub items: Vec<RawVideo>,
    pub outcome: SourceOutcome,
}

/// Result of one aggregation. An empty collection with two partial outcomes
/// is still a valid result here.
#[derive(Debug)]
pub struct Aggregation {
    pub collection: VideoCollection,
    pub primary: SourceOutcome,
    pub secondary: SourceOutcome,
}

/// Pulls a listing to completion or to its first error.
pub async fn drain<S>(source: Source, listing: S) -> SourceFetch
where
    S: Stream<Item = Result<RawVideo, ListingError>>,
{
    futures::pin_mut!(listing);

    let mut items = Vec::new();
    while let Some(next) = listing.next().await {
        match next {
            Ok(video) if video.id.is_empty() => {
                warn!("[aggregate] Skipping {} record without an id", source);
            }
            Ok(video) => items.push(video),
            Err(e) => {
                error!(
                    "[aggregate] Error fetching videos from {} index after {} items: {}",
                    source,
                    items.len(),
                    e
                );
                return SourceFetch {
                    items,
                    outcome: SourceOutcome::Partial {
                        reason: e.to_string(),
                    },
                };
            }
        }
    }

    SourceFetch {
        items,
        outcome: SourceOutcome::Complete,
    }
}

/// Later items overwrite earlier ones with the same filename.
pub fn collect_primary(items: Vec<RawVideo>) -> VideoCollection {
    items.into_iter().fold(VideoCollection::new(), |mut acc, video| {
        let record = video.into_record();
        acc.insert(record.filename.clone(), record);
        acc
    })
}

/// One secondary item: tag an existing entry with its identity, or add a new
/// entry whose primary identity is approximated by the secondary one.
pub fn merge_secondary(mut acc: VideoCollection, video: RawVideo) -> VideoCollection {
    let filename = video.resolved_filename();
    match acc.get_mut(&filename) {
        Some(existing) => existing.pegasus_id = Some(video.id),
        None => {
            let mut record = video.into_record();
            record.pegasus_id = Some(record.id.clone());
            acc.insert(filename, record);
        }
    }
    acc
}

pub fn reconcile(primary: VideoCollection, secondary: Vec<RawVideo>) -> VideoCollection {
    secondary.into_iter().fold(primary, merge_secondary)
}

/// Drains the primary listing, then the secondary one, and merges them.
/// Neither listing's failure is propagated.
pub async fn aggregate<P, S>(primary: P, secondary: S) -> Aggregation
where
    P: Stream<Item = Result<RawVideo, ListingError>>,
    S: Stream<Item = Result<RawVideo, ListingError>>,
{
    let primary = drain(Source::Primary, primary).await;
    let secondary = drain(Source::Secondary, secondary).await;

    let primary_count = primary.items.len();
    let secondary_count = secondary.items.len();
    let collection = reconcile(collect_primary(primary.items), secondary.items);

    info!(
        "[aggregate] {} primary + {} secondary records -> {} videos",
        primary_count,
        secondary_count,
        collection.len()
    );

    Aggregation {
        collection,
        primary: primary.outcome,
        secondary: secondary.outcome,
    }
}
