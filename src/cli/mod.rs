//! CLI command handlers
//!
//! Each subcommand is implemented in its own module; shared setup lives in
//! `helpers`.

pub mod ask;
pub mod helpers;
pub mod record;
pub mod stats;
pub mod upload;
