//! CLI Tooling
//!
//! Command-line interface for all toolkit operations.

pub mod cli;
