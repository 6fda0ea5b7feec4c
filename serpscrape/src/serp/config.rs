//! Settings for fetching and batch execution.
//!
//! Settings are read from a JSON file whose keys all have defaults, so an
//! empty object is a valid settings file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::pipeline::PartialResultPolicy;

/// Desktop user agents rotated across fetch attempts.
pub const DEFAULT_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
];

/// Settings loaded from `settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpSettings {
    /// Search endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Retries after the first attempt.
    #[serde(default = "default_retries")]
    pub retries: usize,
    /// Base backoff between attempts in seconds.
    #[serde(default = "default_backoff")]
    pub retry_backoff_seconds: f64,
    /// Parameters sent with every request unless a page overrides them.
    #[serde(default = "default_params")]
    pub default_params: HashMap<String, serde_json::Value>,
    /// Headers sent with every request, applied over the rotated ones.
    #[serde(default)]
    pub default_headers: HashMap<String, String>,
    /// User agent pool.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
    /// Queries processed at once. 1 keeps the batch strictly sequential.
    #[serde(default = "default_concurrent")]
    pub max_concurrent_queries: usize,
    /// Optional deadline for each query.
    #[serde(default)]
    pub query_timeout_seconds: Option<f64>,
    /// What to do with collected results when a later page fails.
    #[serde(default)]
    pub partial_results: PartialResultPolicy,
}

fn default_base_url() -> String {
    "https://www.google.com/search".to_string()
}

fn default_timeout() -> f64 {
    15.0
}

fn default_retries() -> usize {
    2
}

fn default_backoff() -> f64 {
    1.0
}

fn default_params() -> HashMap<String, serde_json::Value> {
    HashMap::from([("num".to_string(), serde_json::json!(10))])
}

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(ToString::to_string).collect()
}

fn default_concurrent() -> usize {
    1
}

impl Default for SerpSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_backoff_seconds: default_backoff(),
            default_params: default_params(),
            default_headers: HashMap::new(),
            user_agents: default_user_agents(),
            max_concurrent_queries: default_concurrent(),
            query_timeout_seconds: None,
            partial_results: PartialResultPolicy::default(),
        }
    }
}

impl SerpSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search endpoint.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the retry count.
    #[must_use]
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the base backoff.
    #[must_use]
    pub fn with_backoff(mut self, seconds: f64) -> Self {
        self.retry_backoff_seconds = seconds;
        self
    }

    /// Adds a default header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Sets how many queries run at once.
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_queries = max;
        self
    }

    /// Sets a per-query deadline.
    #[must_use]
    pub fn with_query_timeout(mut self, seconds: f64) -> Self {
        self.query_timeout_seconds = Some(seconds);
        self
    }

    /// Sets the partial-result policy.
    #[must_use]
    pub fn with_partial_results(mut self, policy: PartialResultPolicy) -> Self {
        self.partial_results = policy;
        self
    }

    /// Request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        bounded_duration(self.timeout_seconds)
    }

    /// Per-query deadline as a Duration.
    #[must_use]
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_seconds.map(bounded_duration)
    }

    /// Retry policy derived from `retries` and `retry_backoff_seconds`.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            backoff_seconds: self.retry_backoff_seconds,
        }
    }

    /// Default parameters rendered as query-string values. Nulls are dropped.
    #[must_use]
    pub fn default_param_strings(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .default_params
            .iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k.clone(), v)))
            .collect();
        params.sort();
        params
    }

    /// Checks internal consistency.
    pub fn check(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if !self.timeout_seconds.is_finite() || self.timeout_seconds <= 0.0 {
            return Err("timeout_seconds must be positive".to_string());
        }
        check_ceiling("timeout_seconds", self.timeout_seconds)?;
        if !self.retry_backoff_seconds.is_finite() || self.retry_backoff_seconds < 0.0 {
            return Err("retry_backoff_seconds must not be negative".to_string());
        }
        // Longest wait: last attempt, rate limited.
        let attempts = u32::try_from(self.retry_policy().attempts()).unwrap_or(u32::MAX);
        check_ceiling(
            "retry_backoff_seconds",
            self.retry_backoff_seconds * f64::from(attempts) * 2.0,
        )?;
        if self.user_agents.is_empty() {
            return Err("user_agents must not be empty".to_string());
        }
        if self.max_concurrent_queries == 0 {
            return Err("max_concurrent_queries must be at least 1".to_string());
        }
        if let Some(t) = self.query_timeout_seconds {
            if !t.is_finite() || t <= 0.0 {
                return Err("query_timeout_seconds must be positive".to_string());
            }
            check_ceiling("query_timeout_seconds", t)?;
        }
        Ok(())
    }
}

/// Upper bound for any configured wait, one day.
pub const MAX_DURATION_SECONDS: f64 = 86_400.0;

fn check_ceiling(field: &str, seconds: f64) -> Result<(), String> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(_) if seconds <= MAX_DURATION_SECONDS => Ok(()),
        _ => Err(format!(
            "{field} must not exceed {MAX_DURATION_SECONDS} seconds"
        )),
    }
}

/// Seconds to a Duration clamped to `[0, MAX_DURATION_SECONDS]`. NaN maps to zero.
fn bounded_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.clamp(0.0, MAX_DURATION_SECONDS)).unwrap_or_default()
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Loads and checks settings from a JSON file.
pub fn load_settings(path: impl AsRef<Path>) -> Result<SerpSettings, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::new(path, e.to_string()))?;
    let settings: SerpSettings =
        serde_json::from_str(&raw).map_err(|e| ConfigError::new(path, e.to_string()))?;
    settings.check().map_err(|m| ConfigError::new(path, m))?;
    Ok(settings)
}

/// Linear backoff used by the HTTP fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: usize,
    /// Base delay in seconds.
    pub backoff_seconds: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            backoff_seconds: default_backoff(),
        }
    }
}

impl RetryPolicy {
    /// Total attempts, the first one included.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.retries.saturating_add(1)
    }

    /// Delay after a failed attempt (0-indexed). Rate-limited attempts wait
    /// twice as long.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize, rate_limited: bool) -> Duration {
        let factor = if rate_limited { 2.0 } else { 1.0 };
        let steps = u32::try_from(attempt.saturating_add(1)).unwrap_or(u32::MAX);
        bounded_duration(self.backoff_seconds * f64::from(steps) * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_defaults() {
        let settings = SerpSettings::default();
        assert_eq!(settings.base_url, "https://www.google.com/search");
        assert_eq!(settings.timeout_seconds, 15.0);
        assert_eq!(settings.retries, 2);
        assert_eq!(settings.user_agents.len(), 3);
        assert_eq!(settings.max_concurrent_queries, 1);
        assert_eq!(settings.partial_results, PartialResultPolicy::Discard);
        assert!(settings.check().is_ok());
    }

    #[test]
    fn test_empty_object_is_valid() {
        let settings: SerpSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, SerpSettings::default());
    }

    #[test]
    fn test_settings_builder() {
        let settings = SerpSettings::new()
            .with_base_url("http://localhost:8080/search")
            .with_retries(0)
            .with_header("Cookie", "CONSENT=YES")
            .with_max_concurrent(4)
            .with_query_timeout(30.0);

        assert_eq!(settings.retry_policy().attempts(), 1);
        assert_eq!(settings.default_headers.get("Cookie"), Some(&"CONSENT=YES".to_string()));
        assert_eq!(settings.query_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_default_param_strings() {
        let mut settings = SerpSettings::default();
        settings.default_params.insert("safe".to_string(), serde_json::json!("active"));
        settings.default_params.insert("pws".to_string(), serde_json::Value::Null);

        let params = settings.default_param_strings();
        assert_eq!(
            params,
            vec![
                ("num".to_string(), "10".to_string()),
                ("safe".to_string(), "active".to_string()),
            ]
        );
    }

    #[test]
    fn test_check_rejects_bad_values() {
        assert!(SerpSettings::default().with_max_concurrent(0).check().is_err());
        assert!(SerpSettings::default().with_base_url(" ").check().is_err());
        assert!(SerpSettings::default().with_query_timeout(0.0).check().is_err());
    }

    #[test]
    fn test_check_rejects_oversized_durations() {
        let mut settings = SerpSettings::default();
        settings.timeout_seconds = 1e30;
        assert!(settings.check().is_err());

        let settings = SerpSettings::default().with_query_timeout(1e19);
        assert!(settings.check().is_err());

        // 3 attempts, doubled on 429: 20_000 * 3 * 2 exceeds a day.
        let mut settings = SerpSettings::default();
        settings.retry_backoff_seconds = 20_000.0;
        assert!(settings.check().is_err());
        settings.retry_backoff_seconds = 10_000.0;
        assert!(settings.check().is_ok());
    }

    #[test]
    fn test_duration_accessors_clamp() {
        let mut settings = SerpSettings::default().with_query_timeout(1e30);
        settings.timeout_seconds = f64::NAN;

        assert_eq!(settings.timeout(), Duration::ZERO);
        assert_eq!(
            settings.query_timeout(),
            Some(Duration::from_secs_f64(MAX_DURATION_SECONDS))
        );

        let policy = RetryPolicy {
            retries: 2,
            backoff_seconds: 1e30,
        };
        assert_eq!(
            policy.delay_for_attempt(usize::MAX, true),
            Duration::from_secs_f64(MAX_DURATION_SECONDS)
        );
    }

    #[test]
    fn test_retry_policy_delay() {
        let policy = RetryPolicy {
            retries: 2,
            backoff_seconds: 1.0,
        };

        assert_eq!(policy.delay_for_attempt(0, false), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1, false), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(1, true), Duration::from_secs(4));
        assert_eq!(policy.attempts(), 3);
    }

    #[test]
    fn test_load_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"retries": 5, "partial_results": "keep"}}"#).unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.retries, 5);
        assert_eq!(settings.partial_results, PartialResultPolicy::Keep);
    }

    #[test]
    fn test_load_settings_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(load_settings(file.path()).is_err());

        assert!(load_settings("/nonexistent/settings.json").is_err());
    }

    #[test]
    fn test_load_settings_rejects_huge_durations() {
        for body in [
            r#"{"timeout_seconds": 1e30}"#,
            r#"{"query_timeout_seconds": 1e30}"#,
            r#"{"retry_backoff_seconds": 1e30}"#,
        ] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(file, "{body}").unwrap();

            let err = load_settings(file.path()).unwrap_err();
            assert!(err.message.contains("must not exceed"), "{body}: {err}");
        }
    }
}
