//! HTTP fetcher backed by `reqwest`.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::config::{RetryPolicy, SerpSettings, DEFAULT_USER_AGENTS};
use super::protocols::Fetcher;
use crate::core::RequestParams;
use crate::errors::FetchError;

const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Fetches result pages over HTTP.
///
/// Every attempt picks a fresh user agent from the pool. HTTP 429 and
/// other failures are retried with linear backoff; rate-limited attempts
/// wait twice as long.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    default_params: Vec<(String, String)>,
    default_headers: BTreeMap<String, String>,
    user_agents: Vec<String>,
    retry: RetryPolicy,
}

impl HttpFetcher {
    /// Builds a fetcher from settings.
    pub fn new(settings: &SerpSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let user_agents = if settings.user_agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(ToString::to_string).collect()
        } else {
            settings.user_agents.clone()
        };

        Ok(Self {
            client,
            default_params: settings.default_param_strings(),
            default_headers: settings
                .default_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            user_agents,
            retry: settings.retry_policy(),
        })
    }

    /// The retry policy in use.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Merges request parameters over the defaults. Absent values never
    /// override a default.
    #[must_use]
    pub fn merge_params(&self, params: &RequestParams) -> Vec<(String, String)> {
        let mut merged: BTreeMap<String, String> = self.default_params.iter().cloned().collect();
        for (key, value) in params {
            if let Some(value) = value {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged.into_iter().collect()
    }

    /// Headers for one attempt: a rotated identity, then the configured
    /// defaults on top.
    #[must_use]
    pub fn attempt_headers(&self, params: &RequestParams) -> BTreeMap<String, String> {
        let user_agent = self
            .user_agents
            .choose(&mut rand::thread_rng())
            .map_or(DEFAULT_USER_AGENTS[0], String::as_str);
        let language = params
            .get("hl")
            .and_then(Option::as_deref)
            .unwrap_or(DEFAULT_ACCEPT_LANGUAGE);

        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), user_agent.to_string());
        headers.insert("Accept-Language".to_string(), language.to_string());
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());
        headers.extend(self.default_headers.clone());
        headers
    }

    async fn attempt(
        &self,
        base_url: &str,
        query: &[(String, String)],
        headers: &BTreeMap<String, String>,
    ) -> Result<String, FetchError> {
        let mut request = self.client.get(base_url).query(query);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, base_url: &str, params: &RequestParams) -> Result<String, FetchError> {
        let query = self.merge_params(params);
        let attempts = self.retry.attempts();
        let mut last_error = String::new();

        for attempt in 0..attempts {
            let headers = self.attempt_headers(params);
            debug!(url = %base_url, attempt, "Fetching result page");

            match self.attempt(base_url, &query, &headers).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    let rate_limited = err.is_rate_limited();
                    if rate_limited {
                        warn!(url = %base_url, attempt, "Rate limited by upstream");
                    } else {
                        warn!(url = %base_url, attempt, error = %err, "Fetch attempt failed");
                    }
                    last_error = err.to_string();

                    if attempt + 1 < attempts {
                        let delay = self.retry.delay_for_attempt(attempt, rate_limited);
                        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                        debug!(delay_ms, "Backing off");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(FetchError::exhausted(attempts, last_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(hl: Option<&str>) -> RequestParams {
        let mut p = RequestParams::new();
        p.insert("q".to_string(), Some("nike shoes".to_string()));
        p.insert("num".to_string(), Some("20".to_string()));
        p.insert("hl".to_string(), hl.map(ToString::to_string));
        p.insert("uule".to_string(), None);
        p
    }

    #[test]
    fn test_merge_params_overrides_defaults() {
        let mut settings = SerpSettings::default();
        settings
            .default_params
            .insert("safe".to_string(), serde_json::json!("off"));
        let fetcher = HttpFetcher::new(&settings).unwrap();

        let merged = fetcher.merge_params(&params(None));
        assert_eq!(
            merged,
            vec![
                ("num".to_string(), "20".to_string()),
                ("q".to_string(), "nike shoes".to_string()),
                ("safe".to_string(), "off".to_string()),
            ]
        );
    }

    #[test]
    fn test_new_with_oversized_timeout() {
        let mut settings = SerpSettings::default();
        settings.timeout_seconds = 1e30;
        settings.retry_backoff_seconds = 1e30;

        assert!(HttpFetcher::new(&settings).is_ok());
        let delay = settings.retry_policy().delay_for_attempt(1, true);
        assert_eq!(u64::try_from(delay.as_millis()).unwrap(), 86_400_000);
    }

    #[test]
    fn test_attempt_headers() {
        let settings = SerpSettings::default().with_header("Cookie", "CONSENT=YES");
        let fetcher = HttpFetcher::new(&settings).unwrap();

        let headers = fetcher.attempt_headers(&params(Some("de")));
        assert_eq!(headers.get("Accept-Language").map(String::as_str), Some("de"));
        assert_eq!(headers.get("Cache-Control").map(String::as_str), Some("no-cache"));
        assert_eq!(headers.get("Cookie").map(String::as_str), Some("CONSENT=YES"));
        assert!(DEFAULT_USER_AGENTS.contains(&headers["User-Agent"].as_str()));

        let headers = fetcher.attempt_headers(&params(None));
        assert_eq!(headers["Accept-Language"], DEFAULT_ACCEPT_LANGUAGE);
    }

    #[test]
    fn test_default_headers_win() {
        let settings = SerpSettings::default().with_header("User-Agent", "pinned");
        let fetcher = HttpFetcher::new(&settings).unwrap();
        assert_eq!(fetcher.attempt_headers(&params(None))["User-Agent"], "pinned");
    }

    #[tokio::test]
    async fn test_unreachable_host_exhausts_attempts() {
        let settings = SerpSettings::default().with_retries(1).with_backoff(0.0);
        let fetcher = HttpFetcher::new(&settings).unwrap();

        let err = fetcher
            .fetch("http://127.0.0.1:9/search", &params(None))
            .await
            .unwrap_err();

        match err {
            FetchError::Exhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
