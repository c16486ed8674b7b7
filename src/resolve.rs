//! Stream URL resolution.
//!
//! A channel's nominal stream URL often points at a landing page, a
//! redirector or a playlist wrapping the real stream. The driver walks one
//! hop at a time until it reaches something that looks like media, and it
//! always comes back with a usable URL: when a hop goes wrong it settles
//! for the last URL it trusted.

pub mod classifier;
pub mod driver;
pub mod hop;
pub mod outcome;

pub use classifier::{needs_resolution, url_needs_resolution};
pub use driver::StreamResolver;
pub use hop::HopResolver;
pub use outcome::{FailureReason, HopOutcome, Resolution, ResolutionStatus};
