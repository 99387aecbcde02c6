//! Session storage for the probe command-line binary.
//!
//! This crate provides SQLite-backed conversation storage so that
//! `probe` can resume a prior session in the same working directory.
//! It is an optional collaborator: the agent core only requires a
//! trivial get/put interface and works without it.

mod error;
pub mod session;

pub use error::CliError;
pub use session::SqliteStore;
