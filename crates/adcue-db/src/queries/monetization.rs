//! Per-video monetization settings.

use adcue_common::{Error, MediaId, MonetizationConfig, PlacementType, Result};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::Connection;
use std::collections::BTreeSet;

/// Get the monetization settings for a video.
///
/// # Returns
///
/// * `Ok(Some(MonetizationConfig))` - If the owner has saved settings
/// * `Ok(None)` - If the video was never configured
/// * `Err(Error)` - If a database error occurs
pub fn get_monetization(
    conn: &Connection,
    video_id: MediaId,
) -> Result<Option<MonetizationConfig>> {
    let result = conn.query_row(
        "SELECT enabled, ad_types FROM video_monetization WHERE video_id = :video_id",
        rusqlite::named_params! { ":video_id": video_id.to_string() },
        |row| {
            let raw: String = row.get(1)?;
            let allowed: BTreeSet<PlacementType> = serde_json::from_str(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
            })?;
            Ok(MonetizationConfig {
                enabled: row.get::<_, i32>(0)? != 0,
                allowed,
            })
        },
    );

    match result {
        Ok(config) => Ok(Some(config)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Insert or replace the monetization settings for a video.
///
/// The video must exist; the foreign key rejects settings for unknown ids.
pub fn upsert_monetization(
    conn: &Connection,
    video_id: MediaId,
    config: &MonetizationConfig,
) -> Result<()> {
    let ad_types =
        serde_json::to_string(&config.allowed).map_err(|e| Error::internal(e.to_string()))?;

    conn.execute(
        "INSERT INTO video_monetization (video_id, enabled, ad_types, updated_at)
         VALUES (:video_id, :enabled, :ad_types, :updated_at)
         ON CONFLICT(video_id) DO UPDATE SET
             enabled = excluded.enabled,
             ad_types = excluded.ad_types,
             updated_at = excluded.updated_at",
        rusqlite::named_params! {
            ":video_id": video_id.to_string(),
            ":enabled": config.enabled,
            ":ad_types": ad_types,
            ":updated_at": Utc::now().to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}
