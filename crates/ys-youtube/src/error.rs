use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum YouTubeError {
    #[error("Daily quota limit exceeded; quota resets at midnight Pacific Time")]
    QuotaExceeded,
    #[error("YouTube API returned {status} ({reason}): {message}")]
    Http {
        status: u16,
        reason: String,
        message: String,
    },
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("YouTube API key not provided; set YOUTUBE_API_KEY")]
    MissingApiKey,
}

impl YouTubeError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, YouTubeError::QuotaExceeded)
    }

    /// Classifies a non-success response. Only a 403 carrying a quota reason
    /// halts collection; everything else is an ordinary failure.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<ErrorEnvelope> = serde_json::from_str(body).ok();
        let (reason, message) = match parsed {
            Some(envelope) => {
                let reason = envelope
                    .error
                    .errors
                    .first()
                    .map(|detail| detail.reason.clone())
                    .unwrap_or_default();
                (reason, envelope.error.message)
            }
            None => (String::new(), body.trim().to_string()),
        };

        if status == 403 && is_quota_reason(&reason) {
            return YouTubeError::QuotaExceeded;
        }

        YouTubeError::Http {
            status,
            reason,
            message,
        }
    }
}

fn is_quota_reason(reason: &str) -> bool {
    matches!(reason, "quotaExceeded" | "dailyLimitExceeded")
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTA_BODY: &str = r#"{
        "error": {
            "code": 403,
            "message": "The request cannot be completed because you have exceeded your quota.",
            "errors": [{"domain": "youtube.quota", "reason": "quotaExceeded"}]
        }
    }"#;

    #[test]
    fn forbidden_with_quota_reason_is_quota_exceeded() {
        let err = YouTubeError::from_response(403, QUOTA_BODY);
        assert!(err.is_quota_exceeded());
    }

    #[test]
    fn quota_reason_with_other_status_is_plain_http() {
        let err = YouTubeError::from_response(400, QUOTA_BODY);
        assert!(matches!(err, YouTubeError::Http { status: 400, .. }));
    }

    #[test]
    fn forbidden_without_quota_reason_is_plain_http() {
        let body = r#"{"error": {"code": 403, "message": "forbidden",
            "errors": [{"reason": "forbidden"}]}}"#;
        match YouTubeError::from_response(403, body) {
            YouTubeError::Http {
                status,
                reason,
                message,
            } => {
                assert_eq!(status, 403);
                assert_eq!(reason, "forbidden");
                assert_eq!(message, "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_kept_as_message() {
        let err = YouTubeError::from_response(502, "  Bad Gateway \n");
        match err {
            YouTubeError::Http { message, reason, .. } => {
                assert_eq!(message, "Bad Gateway");
                assert!(reason.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
