//! Canonical verse references.
//!
//! This crate owns the fixed structure of the canon (books, chapter counts
//! and verse counts) and everything derived from it:
//!
//! - [`Book`] lookup by name or abbreviation,
//! - [`VerseReference`] parsing, validation and canonical formatting,
//! - the reference *universe* ([`generate_all`], [`count`], [`universe`]):
//!   every verse exactly once, in canonical order.

mod book;
pub mod error;
mod reference;
mod universe;

pub use crate::book::{Book, Testament};
pub use crate::reference::VerseReference;
pub use crate::universe::{count, generate_all, universe};
