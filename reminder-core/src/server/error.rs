use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::error::UpstreamError;

/// Which cached resource a failed upstream call was serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Weather,
    News,
}

impl Resource {
    fn unavailable_message(self) -> &'static str {
        match self {
            Resource::Weather => "날씨 정보를 가져올 수 없습니다.",
            Resource::News => "뉴스 정보를 가져올 수 없습니다.",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{resource:?} upstream failed: {source}")]
    Upstream {
        resource: Resource,
        #[source]
        source: UpstreamError,
    },

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("not found")]
    NotFound,
}

impl AppError {
    pub fn weather(source: UpstreamError) -> Self {
        AppError::Upstream {
            resource: Resource::Weather,
            source,
        }
    }

    pub fn news(source: UpstreamError) -> Self {
        AppError::Upstream {
            resource: Resource::News,
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Upstream { resource, source } => {
                error!(
                    ?resource,
                    provider = %source.provider(),
                    bad_payload = source.is_bad_payload(),
                    error = %source,
                    "upstream request failed"
                );
                (status, resource.unavailable_message()).into_response()
            }
            AppError::BadRequest(message) => (status, message).into_response(),
            AppError::NotFound => (status, "Todo not found").into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            AppError::weather(UpstreamError::Empty(ProviderId::Kma)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::BadRequest("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
    }
}
