//! The attendance-window evaluation engine: calendar exceptions, window
//! resolution, shift roster, scan classification, and summary aggregation.
//! HTTP handlers call into this module; it performs no authentication and
//! renders no responses beyond the structured reply envelope.

pub mod calendar;
pub mod error;
pub mod evaluate;
pub mod payload;
pub mod roster;
pub mod summary;
pub mod window;
