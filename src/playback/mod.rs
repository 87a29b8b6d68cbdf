//! Playback sessions with ad breaks.
//!
//! - [`scheduler`]: the synchronous ad-break state machine
//! - [`driver`]: runs a scheduler against a source and a renderer
//! - [`renderer`]: how ads are shown
//! - [`source`]: the content player abstraction and a simulated player

pub mod driver;
pub mod renderer;
pub mod scheduler;
pub mod source;

pub use driver::{SessionDriver, SessionSummary};
pub use renderer::{AdRenderer, TimedAdRenderer, DEFAULT_AD_DURATION};
pub use scheduler::{AdScheduler, AdTicket, PlaybackError, ProgressReport, SchedulerAction};
pub use source::{PlaybackEvent, PlaybackSource, SimulatedPlayback, SimulationSettings};
