//! Core particle epidemic simulation library.
//!
//! Main components:
//! - [`motion`] — arena bounds, straight-line motion and wall reflection.
//! - [`person`] — people and their health status.
//! - [`population`] — the registry of people and aggregate health counters.
//! - [`phases`] — per-person contagion and disease progression.
//! - [`clock`] — ticks and days.
//! - [`simulation`] — the loop controller that steps a run.
//! - [`render`] — drawable state handed to a display.
//! - [`scheduler`] — frame sources that drive the loop.
//! - [`config`] — run-wide parameters, loadable from TOML.
//! - [`error`] — the crate's error type.
//! - [`types`] — shared type aliases and IDs.

pub mod clock;
pub mod config;
pub mod error;
pub mod motion;
pub mod person;
pub mod phases;
pub mod population;
pub mod render;
pub mod scheduler;
pub mod simulation;
pub mod types;
