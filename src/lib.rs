//! `MoodHarmony` - Guided emotional transition sessions
//!
//! This library provides the emotion catalog, the phase clock, and the
//! session controller that walks a user from one emotion toward another
//! through timed phases, plus persistence for saved progress and
//! completed-session evaluations.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod phase;
pub mod session;
pub mod store;
