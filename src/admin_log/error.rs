use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// A value could not be represented as JSON.
#[derive(Debug, Error)]
#[error("failed to encode value as JSON: {0}")]
pub struct SerializationError(#[from] pub serde_json::Error);

/// Failures raised by the interceptor itself.
///
/// Failures of the wrapped handler never appear here; they are returned to
/// the caller untouched inside the inner `Result`.
#[derive(Debug, Error)]
pub enum AdminLogError {
    /// The ambient form was used outside a bound request scope.
    #[error("no request context is bound to the current task")]
    MissingContext,

    /// An argument failed to encode while the `propagate` policy is active.
    #[error("argument {index} could not be serialized")]
    ArgumentSerialization {
        index: usize,
        #[source]
        source: SerializationError,
    },
}

impl IntoResponse for AdminLogError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Request logging failed",
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
