//! `xp-curves` library crate.
//!
//! The `xp` binary is a thin wrapper around this library: the fit, report
//! and plot logic stays unit-testable without a terminal attached, and the
//! TUI is one presentation layer among others rather than the program.

pub mod app;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
