//! Command-line interface
//!
//! Argument definitions and command handlers for the `moodharmony` binary.

pub mod args;
pub mod commands;
