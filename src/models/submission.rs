use serde::{Deserialize, Serialize};

pub const ACCEPTED_VERDICT: &str = "OK";

/// One entry of the `user.status` result array. Only the fields the heat-map needs are kept;
/// everything else in the payload is ignored on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(rename = "creationTimeSeconds", default)]
    pub creation_time_seconds: Option<i64>,
}

impl SubmissionRecord {
    pub fn new(verdict: Option<&str>, creation_time_seconds: i64) -> Self {
        Self {
            verdict: verdict.map(str::to_string),
            creation_time_seconds: Some(creation_time_seconds),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict.as_deref() == Some(ACCEPTED_VERDICT)
    }
}

/// Envelope returned by the Codeforces API.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub result: Option<Vec<SubmissionRecord>>,
}
