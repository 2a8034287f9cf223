use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

#[derive(Serialize)]
pub struct InternalServerError {
    pub message: String,
}

impl Default for InternalServerError {
    fn default() -> Self {
        Self {
            message: "Internal server error.".to_string(),
        }
    }
}

impl IntoResponse for InternalServerError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// The body of every error response.
///
/// `errors` holds field errors keyed by field name and `details` holds any
/// other structured information about the failure.
#[derive(Debug, Serialize)]
pub struct ErrorRep {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorRep {
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            errors: None,
            details: None,
        }
    }

    pub fn with_errors<E: Serialize>(mut self, errors: &E) -> Self {
        self.errors = Some(to_value(errors));
        self
    }

    pub fn with_details<D: Serialize>(mut self, details: &D) -> Self {
        self.details = Some(to_value(details));
        self
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|error| {
        error!(?error, "Failed to serialize error information.");

        Value::Null
    })
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(ErrorRep),
    NotFound(ErrorRep),
    Conflict(ErrorRep),
    UnprocessableEntity(ErrorRep),
    InternalServerError,
}

impl ApiError {
    pub fn bad_request<M: Into<String>>(message: M) -> Self {
        Self::BadRequest(ErrorRep::new(message))
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::NotFound(ErrorRep::new(message))
    }

    pub fn conflict<M: Into<String>>(message: M) -> Self {
        Self::Conflict(ErrorRep::new(message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(rep) => (StatusCode::BAD_REQUEST, Json(rep)).into_response(),
            Self::NotFound(rep) => (StatusCode::NOT_FOUND, Json(rep)).into_response(),
            Self::Conflict(rep) => (StatusCode::CONFLICT, Json(rep)).into_response(),
            Self::UnprocessableEntity(rep) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(rep)).into_response()
            }
            Self::InternalServerError => InternalServerError::default().into_response(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        error!(?error, "Received error.");

        Self::InternalServerError
    }
}

/// Request bodies that are not JSON, or do not fit the expected shape, are
/// reported like any other invalid input.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(%rejection, "Rejected request body.");

        Self::BadRequest(
            ErrorRep::new("Invalid request body.")
                .with_errors(&serde_json::json!({ "body": [rejection.body_text()] })),
        )
    }
}

pub type ApiResponse<T> = Result<T, ApiError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_rep_omits_empty_fields() {
        let rep = ErrorRep::new("Tenant not found.");

        let json = serde_json::to_value(&rep).expect("rep should serialize");

        assert_eq!(serde_json::json!({"message": "Tenant not found."}), json);
    }

    #[test]
    fn error_rep_with_errors() {
        let rep = ErrorRep::new("Invalid tenant.")
            .with_errors(&serde_json::json!({"name": ["Name is required."]}));

        let json = serde_json::to_value(&rep).expect("rep should serialize");

        assert_eq!(
            serde_json::json!({
                "message": "Invalid tenant.",
                "errors": {"name": ["Name is required."]}
            }),
            json
        );
    }

    #[test]
    fn anyhow_becomes_internal_server_error() {
        let error = ApiError::from(anyhow::anyhow!("disk on fire"));

        assert_eq!(
            StatusCode::INTERNAL_SERVER_ERROR,
            error.into_response().status()
        );
    }
}
