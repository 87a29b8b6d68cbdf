//! Ad view ledger queries.
//!
//! Views are tallied per `(video, placement, day)`. Recording a view bumps the
//! day's counter; aggregation into earnings happens in the policy layer.

use adcue_common::{AdViewRecord, Error, MediaId, Result, ViewTally};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::Connection;

use super::{parse_id, parse_placement};

/// Add one view to the tally for the record's video, placement and day.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `record` - The ad view that was displayed
///
/// # Returns
///
/// * `Ok(())` - If the tally was incremented
/// * `Err(Error)` - If the video is unknown or a database error occurs
pub fn record_view(conn: &Connection, record: &AdViewRecord) -> Result<()> {
    let date = record.timestamp.date_naive();

    conn.execute(
        "INSERT INTO ad_views (video_id, ad_type, date, views)
         VALUES (:video_id, :ad_type, :date, 1)
         ON CONFLICT(video_id, ad_type, date) DO UPDATE SET views = views + 1",
        rusqlite::named_params! {
            ":video_id": record.media_id.to_string(),
            ":ad_type": record.placement.as_str(),
            ":date": date.to_string(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// List every tally row for a video, oldest day first.
pub fn list_tallies_for_video(conn: &Connection, video_id: MediaId) -> Result<Vec<ViewTally>> {
    let mut stmt = conn
        .prepare(
            "SELECT video_id, ad_type, date, views FROM ad_views
             WHERE video_id = :video_id
             ORDER BY date, ad_type",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map(
            rusqlite::named_params! { ":video_id": video_id.to_string() },
            |row| {
                let date: String = row.get(2)?;
                Ok(ViewTally {
                    media_id: parse_id(0, &row.get::<_, String>(0)?)?,
                    placement: parse_placement(1, &row.get::<_, String>(1)?)?,
                    date: date.parse::<NaiveDate>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                    })?,
                    views: row.get::<_, i64>(3)?.max(0) as u64,
                })
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let tallies = rows
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(tallies)
}
