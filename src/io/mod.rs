//! Input/output helpers.
//!
//! - CSV exports of the series and the regional snapshot (`export`)
//! - JSON export of a whole render outcome (`json`)

pub mod export;
pub mod json;

pub use export::*;
pub use json::*;
