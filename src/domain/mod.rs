//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the canonical `Year` and the fixed `Indicator` set
//! - fetched data (`Observation`, `IndicatorDataset`, `RequestKey`)
//! - derived views (`IndicatorSeries`, `RegionalSnapshot`, `CountryUniverse`)

pub mod types;

pub use types::*;
