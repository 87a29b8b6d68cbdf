//! Video database queries.
//!
//! The scheduler only needs a video's owner and duration; titles, uploads and
//! thumbnails belong to the content service.

use adcue_common::{Error, MediaId, MediaInfo, Result, ViewerId};
use chrono::Utc;
use rusqlite::Connection;

use super::parse_id;

/// Register a video.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `owner_id` - User who uploaded the video
/// * `duration_secs` - Duration if already known
///
/// # Returns
///
/// * `Ok(MediaInfo)` - The registered video
/// * `Err(Error::InvalidInput)` - If the duration is not a positive number
/// * `Err(Error)` - If a database error occurs
pub fn create_video(
    conn: &Connection,
    owner_id: ViewerId,
    duration_secs: Option<f64>,
) -> Result<MediaInfo> {
    if let Some(d) = duration_secs {
        check_duration(d)?;
    }
    let id = MediaId::new();

    conn.execute(
        "INSERT INTO videos (id, owner_id, duration_secs, created_at)
         VALUES (:id, :owner_id, :duration_secs, :created_at)",
        rusqlite::named_params! {
            ":id": id.to_string(),
            ":owner_id": owner_id.to_string(),
            ":duration_secs": duration_secs,
            ":created_at": Utc::now().to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(MediaInfo {
        id,
        owner_id,
        duration_secs,
    })
}

/// Get a video by ID.
///
/// # Returns
///
/// * `Ok(Some(MediaInfo))` - The video if found
/// * `Ok(None)` - If the video does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_video(conn: &Connection, id: MediaId) -> Result<Option<MediaInfo>> {
    let result = conn.query_row(
        "SELECT id, owner_id, duration_secs FROM videos WHERE id = :id",
        rusqlite::named_params! { ":id": id.to_string() },
        |row| {
            Ok(MediaInfo {
                id: parse_id(0, &row.get::<_, String>(0)?)?,
                owner_id: parse_id(1, &row.get::<_, String>(1)?)?,
                duration_secs: row.get(2)?,
            })
        },
    );

    match result {
        Ok(video) => Ok(Some(video)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List the ids of every video uploaded by `owner_id`.
pub fn list_video_ids_for_owner(conn: &Connection, owner_id: ViewerId) -> Result<Vec<MediaId>> {
    let mut stmt = conn
        .prepare("SELECT id FROM videos WHERE owner_id = :owner_id ORDER BY created_at")
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map(
            rusqlite::named_params! { ":owner_id": owner_id.to_string() },
            |row| parse_id::<MediaId>(0, &row.get::<_, String>(0)?),
        )
        .map_err(|e| Error::database(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Record the duration once the playback source has learned it.
pub fn set_duration(conn: &Connection, id: MediaId, duration_secs: f64) -> Result<()> {
    check_duration(duration_secs)?;
    let updated = conn
        .execute(
            "UPDATE videos SET duration_secs = :duration_secs WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":duration_secs": duration_secs,
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if updated == 0 {
        return Err(Error::not_found(format!("video {}", id)));
    }
    Ok(())
}

fn check_duration(duration_secs: f64) -> Result<()> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(Error::invalid_input(format!(
            "duration must be positive, got {}",
            duration_secs
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{get_conn, init_memory_pool};

    #[test]
    fn test_create_and_get_video() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let owner = ViewerId::new();

        let video = create_video(&conn, owner, Some(120.0)).unwrap();
        let fetched = get_video(&conn, video.id).unwrap().unwrap();
        assert_eq!(fetched, video);
        assert_eq!(fetched.owner_id, owner);
    }

    #[test]
    fn test_get_missing_video() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        assert!(get_video(&conn, MediaId::new()).unwrap().is_none());
    }

    #[test]
    fn test_list_videos_for_owner() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let owner = ViewerId::new();

        let a = create_video(&conn, owner, None).unwrap();
        let b = create_video(&conn, owner, None).unwrap();
        create_video(&conn, ViewerId::new(), None).unwrap();

        let ids = list_video_ids_for_owner(&conn, owner).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id));
        assert!(ids.contains(&b.id));
    }

    #[test]
    fn test_set_duration() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let video = create_video(&conn, ViewerId::new(), None).unwrap();

        set_duration(&conn, video.id, 42.5).unwrap();
        let fetched = get_video(&conn, video.id).unwrap().unwrap();
        assert_eq!(fetched.duration_secs, Some(42.5));

        let err = set_duration(&conn, MediaId::new(), 1.0).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let video = create_video(&conn, ViewerId::new(), None).unwrap();

        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = set_duration(&conn, video.id, bad).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
            let err = create_video(&conn, ViewerId::new(), Some(bad)).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }

        let fetched = get_video(&conn, video.id).unwrap().unwrap();
        assert_eq!(fetched.duration_secs, None);
        assert_eq!(list_video_ids_for_owner(&conn, video.owner_id).unwrap().len(), 1);
    }
}
