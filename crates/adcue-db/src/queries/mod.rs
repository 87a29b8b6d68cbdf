//! Database query modules.
//!
//! - videos: video registration and ownership lookups
//! - monetization: per-video ad settings
//! - subscriptions: viewer subscription status
//! - ad_views: daily ad view tallies (the earnings ledger)

pub mod ad_views;
pub mod monetization;
pub mod subscriptions;
pub mod videos;

use rusqlite::types::Type;
use uuid::Uuid;

/// Parse a UUID column into a typed id, surfacing malformed rows as
/// conversion errors instead of panicking.
pub(crate) fn parse_id<T: From<Uuid>>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    Uuid::parse_str(raw)
        .map(T::from)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a kebab-case placement column.
pub(crate) fn parse_placement(
    idx: usize,
    raw: &str,
) -> rusqlite::Result<adcue_common::PlacementType> {
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}
