//! Viewer subscription status.
//!
//! Only the active flag matters to ad eligibility. Plans, pricing and expiry
//! are handled by the billing service.

use adcue_common::{Error, Result, SubscriptionStatus, ViewerId};
use chrono::Utc;
use rusqlite::Connection;

const STATUS_ACTIVE: &str = "active";
const STATUS_CANCELLED: &str = "cancelled";

/// Get a viewer's subscription status. Viewers without a row are inactive.
pub fn get_subscription(conn: &Connection, user_id: ViewerId) -> Result<SubscriptionStatus> {
    let result = conn.query_row(
        "SELECT status FROM subscriptions WHERE user_id = :user_id",
        rusqlite::named_params! { ":user_id": user_id.to_string() },
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(status) => Ok(SubscriptionStatus {
            active: status == STATUS_ACTIVE,
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(SubscriptionStatus::default()),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Mark a viewer's subscription active or cancelled.
pub fn set_subscription(conn: &Connection, user_id: ViewerId, active: bool) -> Result<()> {
    let status = if active { STATUS_ACTIVE } else { STATUS_CANCELLED };

    conn.execute(
        "INSERT INTO subscriptions (user_id, status, updated_at)
         VALUES (:user_id, :status, :updated_at)
         ON CONFLICT(user_id) DO UPDATE SET
             status = excluded.status,
             updated_at = excluded.updated_at",
        rusqlite::named_params! {
            ":user_id": user_id.to_string(),
            ":status": status,
            ":updated_at": Utc::now().to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}
