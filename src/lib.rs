//! Opkit: Idempotent Agent Operations Toolkit
//!
//! File-system and version-control commands for autonomous agents, backed by
//! an append-only operation journal that detects and skips redundant writes
//! and deletes.

pub mod commands;
pub mod config;
pub mod error;
pub mod journal;
pub mod logging;
pub mod tooling;
