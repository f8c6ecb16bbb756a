//! Fair verse distribution with a bounded, expiring text cache and offline
//! fallbacks.
//!
//! [`VerseService`] composes the workspace crates: references come from
//! [`lectio_distribute`], text from [`lectio_cache`], and [`lectio_fallback`]
//! fills in whatever cannot be resolved. Build one at startup and share it as
//! a [`ServiceHandle`].
//!
//! # Features
//! - `http` (default): [`VerseService::from_config`] with local storage and
//!   the configured HTTP endpoints.

pub mod error;
mod models;
mod service;

pub use crate::models::{BatchVerse, HealthReport, RepairReport, ServiceStats, VerseSource};
pub use crate::service::{ServiceHandle, VerseService};
pub use lectio_config::Config;
