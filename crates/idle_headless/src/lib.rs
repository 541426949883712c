//! # Idle Headless
//!
//! Runs the economy core without a UI: a wall-clock timer loop, a
//! file-backed save store and structured logging. This crate is the
//! "scheduling host" and "storage medium" collaborator the core expects;
//! everything game-mechanical stays in `idle_core`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod runner;
pub mod store;
