//! Reporting utilities: regional rankings and formatted terminal output.

mod format;

pub use format::{format_indicators, format_rankings, format_run_summary, format_series};
pub(crate) use format::fmt_value;

use crate::domain::{Observation, RegionalSnapshot};

/// Highest and lowest values of a regional snapshot (top-N each side).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rankings {
    pub highest: Vec<Observation>,
    pub lowest: Vec<Observation>,
}

/// Rank the snapshot rows by value.
pub fn rank_regional(snapshot: &RegionalSnapshot, top_n: usize) -> Rankings {
    let sorted = snapshot.ranked();

    let highest = sorted.iter().take(top_n).map(|o| (*o).clone()).collect();
    let lowest = sorted.iter().rev().take(top_n).map(|o| (*o).clone()).collect();

    Rankings { highest, lowest }
}
