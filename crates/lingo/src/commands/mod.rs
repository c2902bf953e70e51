//! Command implementations for lingo CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod auth;
pub mod subtitles;
