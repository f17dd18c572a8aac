use crate::models::submission::{StatusResponse, SubmissionRecord};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("HTTP error code: {0}")]
    HttpStatus(u16),
    #[error("API returned error status: {0}")]
    Api(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Where submissions come from. The coordinator only ever sees this seam.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    async fn fetch_submissions(&self, handle: &str) -> Result<Vec<SubmissionRecord>, FetchError>;
}

/// `user.status` client with bounded connect and read times.
#[derive(Debug, Clone)]
pub struct CodeforcesClient {
    client: reqwest::Client,
    base_url: String,
}

impl CodeforcesClient {
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .timeout(connect_timeout + read_timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn status_url(&self) -> String {
        format!("{}/api/user.status", self.base_url)
    }
}

#[async_trait]
impl SubmissionSource for CodeforcesClient {
    async fn fetch_submissions(&self, handle: &str) -> Result<Vec<SubmissionRecord>, FetchError> {
        let response = self
            .client
            .get(self.status_url())
            .query(&[("handle", handle)])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        parse_status_body(&body)
    }
}

/// Decodes a `user.status` body. Transport success does not imply API success: the
/// envelope's `status` must also be `OK`.
pub fn parse_status_body(body: &str) -> Result<Vec<SubmissionRecord>, FetchError> {
    let envelope: StatusResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if envelope.status != "OK" {
        return Err(FetchError::Api(
            envelope.comment.unwrap_or(envelope.status),
        ));
    }

    let records = envelope
        .result
        .ok_or_else(|| FetchError::Malformed("missing `result` array".to_string()))?;

    // Accepted records must carry a timestamp or the whole payload is rejected.
    if let Some(index) = records
        .iter()
        .position(|r| r.is_accepted() && r.creation_time_seconds.is_none())
    {
        return Err(FetchError::Malformed(format!(
            "accepted submission #{index} has no `creationTimeSeconds`"
        )));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ok_envelope() {
        let body = r#"{"status":"OK","result":[{"verdict":"OK","creationTimeSeconds":10}]}"#;
        let records = parse_status_body(body).unwrap();
        assert_eq!(records, vec![SubmissionRecord::new(Some("OK"), 10)]);
    }

    #[test]
    fn failed_status_is_an_api_error() {
        let body = r#"{"status":"FAILED","comment":"handle: User with handle nobody not found"}"#;
        assert_eq!(
            parse_status_body(body),
            Err(FetchError::Api(
                "handle: User with handle nobody not found".to_string()
            ))
        );
    }

    #[test]
    fn garbage_and_missing_result_are_malformed() {
        assert!(matches!(parse_status_body("<html>"), Err(FetchError::Malformed(_))));
        assert!(matches!(
            parse_status_body(r#"{"status":"OK"}"#),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn accepted_record_without_timestamp_is_malformed() {
        let body = r#"{"status":"OK","result":[{"verdict":"OK","creationTimeSeconds":10},{"verdict":"OK"}]}"#;
        assert_eq!(
            parse_status_body(body),
            Err(FetchError::Malformed(
                "accepted submission #1 has no `creationTimeSeconds`".to_string()
            ))
        );
    }

    #[test]
    fn rejected_record_without_timestamp_is_tolerated() {
        let body = r#"{"status":"OK","result":[{"verdict":"WRONG_ANSWER"},{"id":7}]}"#;
        assert_eq!(parse_status_body(body).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn status_url_ignores_trailing_slash() {
        let client =
            CodeforcesClient::new("http://localhost:1/", Duration::from_secs(1), Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.status_url(), "http://localhost:1/api/user.status");
    }
}
