use thiserror::Error;

use crate::provider::ProviderId;

/// Failure while talking to a forecast or news provider.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("no credentials configured for provider '{0}'")]
    MissingCredentials(ProviderId),

    #[error("request to {provider} failed: {source}")]
    Connection {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} responded with status {status}: {body}")]
    Status {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    #[error("failed to read {provider} response body: {source}")]
    BodyRead {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode {provider} response: {source}")]
    Decode {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} returned no items")]
    Empty(ProviderId),

    #[error("forecast grouping task failed: {0}")]
    Grouping(#[from] tokio::task::JoinError),
}

impl UpstreamError {
    pub fn provider(&self) -> ProviderId {
        match self {
            UpstreamError::MissingCredentials(p) | UpstreamError::Empty(p) => *p,
            UpstreamError::Connection { provider, .. }
            | UpstreamError::Status { provider, .. }
            | UpstreamError::BodyRead { provider, .. }
            | UpstreamError::Decode { provider, .. } => *provider,
            UpstreamError::Grouping(_) => ProviderId::Kma,
        }
    }

    /// True for failures where the provider answered but the payload was unusable.
    pub fn is_bad_payload(&self) -> bool {
        matches!(
            self,
            UpstreamError::Decode { .. } | UpstreamError::Empty(_) | UpstreamError::BodyRead { .. }
        )
    }
}

const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Shorten a response body before it ends up in an error message or log line.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }

    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
