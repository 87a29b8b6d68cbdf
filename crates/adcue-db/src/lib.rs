//! Adcue-DB: database schema, migrations, and query operations
//!
//! SQLite storage for the data the ad scheduler reads and writes: videos and
//! their owners, per-video monetization settings, viewer subscriptions, and
//! the daily ad view ledger. Uses rusqlite with r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use adcue_common::ViewerId;
//! use adcue_db::pool::{init_pool, get_conn};
//! use adcue_db::queries::videos;
//!
//! let pool = init_pool("/var/lib/adcue/adcue.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let video = videos::create_video(&conn, ViewerId::new(), Some(600.0)).unwrap();
//! println!("Registered video: {}", video.id);
//! ```

pub mod migrations;
pub mod pool;
pub mod queries;
