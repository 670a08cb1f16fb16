//! sos library crate: change tracking and merge engine.
//!
//! The primary interface is the `sos` binary. This lib.rs exposes the
//! engine so that integration tests and other front ends can use it
//! without going through the CLI:
//!
//! - [`text`] loads byte buffers or files as decoded lines.
//! - [`hash`] digests and stores file content.
//! - [`rename`] detects moves and plans glob-based batch renames.
//! - [`merge`] diffs and merges two versions of a text file.

pub mod config;
pub mod format;
pub mod hash;
pub mod merge;
pub mod model;
pub mod rename;
pub mod telemetry;
pub mod text;
