//! Domain types shared by the video client crates.
//!
//! Pure functions only: status folding, request validation, and display
//! helpers. Nothing in this crate performs I/O.

pub mod display;
pub mod error;
pub mod job_status;
pub mod types;
pub mod video_request;
