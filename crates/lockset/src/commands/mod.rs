//! Commands module for lockset CLI
//!
//! Provides command implementations for exec and check, plus settings
//! resolution shared by both.

pub mod check;
pub mod exec;
pub mod settings;
