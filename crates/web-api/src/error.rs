use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.body.code
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(DomainError::InvalidArgument { field, reason }) => {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "INVALID_ARGUMENT",
                    format!("{field}: {reason}"),
                )
            }
            ApplicationError::Domain(DomainError::AlreadyOnline { name }) => ApiError::new(
                StatusCode::CONFLICT,
                "ALREADY_ONLINE",
                format!("name {name} is already online"),
            ),
            ApplicationError::Domain(DomainError::UserNotFound { id }) => ApiError::new(
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                format!("user {id} not found"),
            ),
            ApplicationError::Repository(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                format!("store error: {err}"),
            ),
            ApplicationError::Broadcast(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "BROADCAST_ERROR",
                format!("broadcast error: {err}"),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_validation_errors_to_bad_request() {
        let err: ApiError =
            ApplicationError::Domain(DomainError::invalid_argument("name", "cannot be empty"))
                .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn maps_name_conflict_to_conflict() {
        let err: ApiError =
            ApplicationError::Domain(DomainError::already_online("alice")).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "ALREADY_ONLINE");
    }

    #[test]
    fn maps_unknown_user_to_not_found() {
        let err: ApiError = ApplicationError::Domain(DomainError::user_not_found(9)).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "USER_NOT_FOUND");
    }

    #[test]
    fn maps_store_failures_to_internal_error() {
        let err: ApiError =
            ApplicationError::Repository(domain::RepositoryError::storage("down")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "STORE_ERROR");
    }
}
