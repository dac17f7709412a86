//! Video generation client library.
//!
//! Provides the REST client for the `/videos` API, payload normalization,
//! cancellable status polling, per-session job caching and history, paged
//! job listings, and the user-facing generate/open/delete workflows built
//! on top of them.

pub mod api;
pub mod config;
pub mod download;
pub mod history;
pub mod listing;
pub mod normalize;
pub mod payload;
pub mod poller;
pub mod session;
pub mod workflow;
