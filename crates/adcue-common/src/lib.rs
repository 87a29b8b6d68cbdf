//! Adcue-Common: shared ids, domain types, and errors.
//!
//! - **Typed IDs**: UUID wrappers for media, viewers, and playback sessions
//! - **Domain Types**: placement types, playback states, monetization and
//!   subscription records, ad view records and ledger tallies
//! - **Error Handling**: common error type and result alias
//!
//! # Examples
//!
//! ```
//! use adcue_common::{MediaId, MonetizationConfig, PlacementType};
//!
//! let media = MediaId::new();
//! let config = MonetizationConfig::enabled_with([PlacementType::PreRoll]);
//! assert!(config.allows(PlacementType::PreRoll));
//! # let _ = media;
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
