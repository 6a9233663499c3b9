use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::services::node_tree::NodeTreeError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => msg,
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<NodeTreeError> for ApiError {
    fn from(err: NodeTreeError) -> Self {
        match err {
            NodeTreeError::Validation(_) => ApiError::BadRequest(err.to_string()),
            NodeTreeError::NotFound(_) => ApiError::NotFound(err.to_string()),
            NodeTreeError::Store(ref e) => {
                tracing::error!(error = ?e, "node_store_failed");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "request_failed");
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_tree_errors_map_to_status_codes() {
        let cases = [
            (NodeTreeError::validation("bad"), StatusCode::BAD_REQUEST),
            (NodeTreeError::not_found("gone"), StatusCode::NOT_FOUND),
            (
                NodeTreeError::Store(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn message_is_carried_into_the_body() {
        match ApiError::from(NodeTreeError::validation("projects cannot be moved")) {
            ApiError::BadRequest(msg) => assert!(msg.contains("projects cannot be moved")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
