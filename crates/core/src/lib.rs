//! Core domain types shared by the Canopy index and sync engine.
//!
//! This crate defines:
//! - Identities (DIDs) and record addresses
//! - Content identifier helpers
//! - Configuration shared by the library crates and the CLI

pub mod address;
pub mod config;
pub mod content_id;
pub mod error;

pub use address::{Did, RecordAddress};
pub use content_id::{Cid, parse_cid};
pub use error::{AddressSegment, Error, Result};

/// Default upper bound for record listing. Sorts after every TID, which are
/// 13 characters from a base32 alphabet that never exceeds `z`.
pub const MAX_RECORD_KEY_CURSOR: &str = "zzzzzzzzzzzzzz";
