use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::JudgeError;
use crate::fetch::HttpClient;
use crate::infra::codeforces::cache as response_cache;
use crate::retry::{RetryPolicy, retry};
use crate::services::judge_api::{
    CachePolicy, Contest, JudgeApi, Standings, StandingsQuery, Submission, User,
};

pub const DEFAULT_BASE_URL: &str = "https://codeforces.com/api";

#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

/// [`JudgeApi`] over HTTP. Every call is retried under `retry` while the
/// failure is transient.
pub struct CodeforcesClient {
    http: Box<dyn HttpClient>,
    base_url: String,
    retry: RetryPolicy,
}

impl CodeforcesClient {
    pub fn new(http: impl HttpClient + 'static) -> Self {
        Self {
            http: Box::new(http),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[tracing::instrument(skip(self, params, cache))]
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
        cache: CachePolicy<'_>,
    ) -> Result<T, JudgeError> {
        if let Some(path) = cache.load_from_file {
            if let Some(value) = response_cache::read(path)? {
                debug!(path, "Loaded judge response from cache");
                return Ok(serde_json::from_value(value)?);
            }
        }

        let value = retry(&self.retry, JudgeError::is_retryable, || {
            self.fetch_once(method, params)
        })
        .await?;

        if let Some(path) = cache.output_file {
            response_cache::write(path, &value)?;
            info!(path, "Wrote judge response to cache");
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn fetch_once(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<Value, JudgeError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/{}", self.base_url, method),
            params.iter().map(|(k, v)| (*k, v.as_str())),
        )
        .map_err(|e| JudgeError::Api {
            comment: format!("invalid request url: {e}"),
        })?;
        debug!(%url, "Calling judge API");

        let resp = self
            .http
            .execute(reqwest::Request::new(reqwest::Method::GET, url))
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        parse_envelope(status, &body)
    }
}

/// Unwraps the judge's `{status, comment, result}` envelope.
pub fn parse_envelope(http_status: u16, body: &str) -> Result<Value, JudgeError> {
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) if envelope.status == "OK" => Ok(envelope.result.unwrap_or(Value::Null)),
        Ok(envelope) => Err(JudgeError::Api {
            comment: envelope
                .comment
                .unwrap_or_else(|| format!("judge returned status {}", envelope.status)),
        }),
        Err(_) if !(200..300).contains(&http_status) => Err(JudgeError::Status {
            status: http_status,
            body: body.chars().take(200).collect(),
        }),
        Err(e) => Err(JudgeError::Decode(e)),
    }
}

#[async_trait]
impl JudgeApi for CodeforcesClient {
    async fn standings(
        &self,
        query: StandingsQuery,
        cache: CachePolicy<'_>,
    ) -> Result<Standings, JudgeError> {
        let params = [
            ("contestId", query.contest_id.to_string()),
            ("from", query.from.to_string()),
            ("count", query.count.to_string()),
            ("asManager", query.as_manager.to_string()),
            ("showUnofficial", query.show_unofficial.to_string()),
        ];
        self.call("contest.standings", &params, cache).await
    }

    async fn submissions(
        &self,
        contest_id: u64,
        from: u32,
        count: u32,
        cache: CachePolicy<'_>,
    ) -> Result<Vec<Submission>, JudgeError> {
        let params = [
            ("contestId", contest_id.to_string()),
            ("from", from.to_string()),
            ("count", count.to_string()),
        ];
        self.call("contest.status", &params, cache).await
    }

    async fn user_info(&self, handles: &[String]) -> Result<Vec<User>, JudgeError> {
        let params = [("handles", handles.join(";"))];
        self.call("user.info", &params, CachePolicy::default()).await
    }

    async fn contest_list(
        &self,
        gym: bool,
        cache: CachePolicy<'_>,
    ) -> Result<Vec<Contest>, JudgeError> {
        let params = [("gym", gym.to_string())];
        self.call("contest.list", &params, cache).await
    }

    async fn rated_list(
        &self,
        active_only: bool,
        cache: CachePolicy<'_>,
    ) -> Result<Vec<User>, JudgeError> {
        let params = [("activeOnly", active_only.to_string())];
        self.call("user.ratedList", &params, cache).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_yields_result() {
        let body = r#"{"status":"OK","result":[{"handle":"tourist"}]}"#;
        let value = parse_envelope(200, body).unwrap();
        let users: Vec<User> = serde_json::from_value(value).unwrap();
        assert_eq!(users[0].handle, "tourist");
    }

    #[test]
    fn test_failed_envelope_is_definitive() {
        let err = parse_envelope(
            400,
            r#"{"status":"FAILED","comment":"handles: User with handle nobody_xyz not found"}"#,
        )
        .unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "handles: User with handle nobody_xyz not found");
    }

    #[test]
    fn test_call_limit_is_transient() {
        let body = r#"{"status":"FAILED","comment":"Call limit exceeded"}"#;
        let err = parse_envelope(503, body).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_html_error_page_is_transient() {
        let err = parse_envelope(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, JudgeError::Status { status: 502, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_garbage_success_body_is_decode_error() {
        let err = parse_envelope(200, "not json").unwrap_err();
        assert!(matches!(err, JudgeError::Decode(_)));
    }
}
