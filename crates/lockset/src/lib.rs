//! Lockset - hold advisory locks on a group of files
//!
//! Thin command-line wrapper over `lockset-core`.

pub mod cli;
pub mod commands;
