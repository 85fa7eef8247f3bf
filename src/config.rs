//! Environment-driven settings.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory:
//!
//! - `WDI_API_BASE`          World Bank API root (default `https://api.worldbank.org/v2`)
//! - `WDI_CACHE_MAX_ENTRIES` cap on cached datasets (default: unbounded)
//! - `WDI_CACHE_TTL_SECS`    age after which a dataset is refetched (default: never)
//! - `WDI_LOG_FILE`          log destination for the TUI (default: `wdi.log` in the temp dir)

use std::path::PathBuf;
use std::time::Duration;

use crate::data::cache::CachePolicy;
use crate::data::worldbank::DEFAULT_BASE_URL;
use crate::domain::{DEFAULT_PRELOAD_SPAN, YearSpan};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base: String,
    pub cache: CachePolicy,
    pub preload_span: YearSpan,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_BASE_URL.to_string(),
            cache: CachePolicy::unbounded(),
            preload_span: DEFAULT_PRELOAD_SPAN,
            log_file: std::env::temp_dir().join("wdi.log"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut settings = Self::default();

        if let Some(base) = lookup("WDI_API_BASE").filter(|v| !v.trim().is_empty()) {
            settings.api_base = base.trim().to_string();
        }
        if let Some(max) = lookup("WDI_CACHE_MAX_ENTRIES") {
            settings.cache.max_entries = Some(parse_u64("WDI_CACHE_MAX_ENTRIES", &max)?);
        }
        if let Some(ttl) = lookup("WDI_CACHE_TTL_SECS") {
            let secs = parse_u64("WDI_CACHE_TTL_SECS", &ttl)?;
            settings.cache.time_to_live = Some(Duration::from_secs(secs));
        }
        if let Some(path) = lookup("WDI_LOG_FILE").filter(|v| !v.trim().is_empty()) {
            settings.log_file = PathBuf::from(path);
        }

        Ok(settings)
    }
}

fn parse_u64(name: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| AppError::new(2, format!("{name} must be a non-negative integer (got '{raw}').")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.api_base, "https://api.worldbank.org/v2");
        assert!(s.cache.is_unbounded());
        assert_eq!(s.preload_span, DEFAULT_PRELOAD_SPAN);
    }

    #[test]
    fn cache_policy_from_variables() {
        let s = Settings::from_lookup(lookup(&[
            ("WDI_CACHE_MAX_ENTRIES", "64"),
            ("WDI_CACHE_TTL_SECS", "3600"),
            ("WDI_API_BASE", "http://localhost:9000/v2"),
        ]))
        .unwrap();
        assert_eq!(s.cache.max_entries, Some(64));
        assert_eq!(s.cache.time_to_live, Some(Duration::from_secs(3600)));
        assert_eq!(s.api_base, "http://localhost:9000/v2");
    }

    #[test]
    fn invalid_number_is_a_usage_error() {
        let err = Settings::from_lookup(lookup(&[("WDI_CACHE_TTL_SECS", "soon")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("WDI_CACHE_TTL_SECS"));
    }
}
