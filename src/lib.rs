//! `wdi-dash` library crate.
//!
//! The binary (`wdi`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fetcher, pipeline and forecaster are reusable outside the terminal front-ends

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod geo;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;
