use crate::error::{AppError, Result};
use crate::i18n::Locale;
use crate::types::CountrySort;

pub const UPSTREAM_API_URL: &str = "https://disease.sh/v3/covid-19";

/// Timeout for a single upstream request (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Days of history requested for the charts.
pub const HISTORY_DAYS: u32 = 30;

/// Cases chart: newest values above this get a scaled grid step.
pub const CASES_GRID_THRESHOLD: u64 = 1_000;

/// Cases chart grid step for small countries.
pub const CASES_GRID_SMALL_STEP: u64 = 100;

/// Deaths chart grid step.
pub const DEATHS_GRID_STEP: u64 = 2_500;

/// TUI auto-refresh interval (seconds).
pub const TUI_REFRESH_INTERVAL_SECS: u64 = 60;

/// How long a status-line notice stays visible in the TUI (seconds).
pub const TUI_NOTICE_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_api_url: String,
    pub log_level: String,
    pub api_port: u16,
    /// Display language (LOCALE, `tr-TR` or `en-US`)
    pub locale: Locale,
    /// Upstream sort key for the country list (COUNTRY_SORT)
    pub country_sort: CountrySort,
    /// Days of history for the charts (HISTORY_DAYS)
    pub history_days: u32,
    /// Per-request upstream timeout (HTTP_TIMEOUT_SECS)
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            upstream_api_url: var("UPSTREAM_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| UPSTREAM_API_URL.to_string()),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            api_port: var("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            locale: match var("LOCALE") {
                Some(code) => code.parse()?,
                None => Locale::default(),
            },
            country_sort: match var("COUNTRY_SORT") {
                Some(key) => key
                    .parse()
                    .map_err(|e| AppError::Config(format!("COUNTRY_SORT: {e}")))?,
                None => CountrySort::default(),
            },
            history_days: var("HISTORY_DAYS")
                .and_then(|d| d.parse::<u32>().ok())
                .filter(|&d| d > 0)
                .unwrap_or(HISTORY_DAYS),
            http_timeout_secs: var("HTTP_TIMEOUT_SECS")
                .and_then(|t| t.parse::<u64>().ok())
                .unwrap_or(HTTP_TIMEOUT_SECS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.upstream_api_url, UPSTREAM_API_URL);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.api_port, 3000);
        assert_eq!(cfg.locale, Locale::TrTr);
        assert_eq!(cfg.country_sort, CountrySort::Active);
        assert_eq!(cfg.history_days, HISTORY_DAYS);
        assert_eq!(cfg.http_timeout_secs, HTTP_TIMEOUT_SECS);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config_from(&[
            ("UPSTREAM_API_URL", "http://localhost:9000/v3/covid-19/"),
            ("API_PORT", "8080"),
            ("LOCALE", "en-US"),
            ("COUNTRY_SORT", "deaths"),
            ("HISTORY_DAYS", "90"),
        ])
        .unwrap();
        assert_eq!(cfg.upstream_api_url, "http://localhost:9000/v3/covid-19");
        assert_eq!(cfg.api_port, 8080);
        assert_eq!(cfg.locale, Locale::EnUs);
        assert_eq!(cfg.country_sort, CountrySort::Deaths);
        assert_eq!(cfg.history_days, 90);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(config_from(&[("API_PORT", "http")]), Err(AppError::Config(_))));
        assert!(matches!(config_from(&[("LOCALE", "fr-FR")]), Err(AppError::Config(_))));
        assert!(matches!(config_from(&[("COUNTRY_SORT", "tests")]), Err(AppError::Config(_))));
    }

    #[test]
    fn zero_history_days_falls_back() {
        let cfg = config_from(&[("HISTORY_DAYS", "0")]).unwrap();
        assert_eq!(cfg.history_days, HISTORY_DAYS);
    }
}
