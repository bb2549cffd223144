use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::EngineError;
use serde::Serialize;
use thiserror::Error;

/// API error taxonomy.
///
/// Client input and authorization failures carry specific codes and are
/// never retried automatically. Version conflicts are recovered by the
/// client's bounded re-read-and-retry. Infrastructure failures surface as
/// 5xx so the UI does not imply user error. Expired rooms are reported
/// exactly like rooms that never existed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Wrong room password")]
    WrongPassword,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Room is full")]
    RoomFull,

    #[error("Version conflict")]
    VersionConflict,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unknown script: {0}")]
    InvalidScript(String),

    #[error("Upgrade required: {0}")]
    UpgradeRequired(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::WrongPassword => (
                StatusCode::FORBIDDEN,
                "wrong_password",
                "Wrong room password".into(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::RoomFull => (StatusCode::CONFLICT, "room_full", "Room is full".into()),
            ApiError::VersionConflict => (
                StatusCode::CONFLICT,
                "version_conflict",
                "State changed since it was read; re-read and retry".into(),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::InvalidScript(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_script", msg.clone())
            }
            ApiError::UpgradeRequired(msg) => {
                (StatusCode::PAYMENT_REQUIRED, "upgrade_required", msg.clone())
            }
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                ApiError::ServiceUnavailable("Service temporarily unavailable".into())
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message.clone().unwrap_or_default()
                    )
                })
            })
            .collect();

        ApiError::Validation(details.join(", "))
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotHost | EngineError::NotInRoster | EngineError::SpectatorVote => {
                ApiError::Forbidden(err.to_string())
            }
            EngineError::UnknownVoteOption(_)
            | EngineError::NoVoteNode
            | EngineError::NoPunishmentNode
            | EngineError::WrongGame
            | EngineError::MissingScript => ApiError::Validation(err.to_string()),
            EngineError::NotStarted
            | EngineError::AlreadyStarted
            | EngineError::GameEnded
            | EngineError::PendingPunishment
            | EngineError::PendingVote
            | EngineError::RosterSize { .. }
            | EngineError::NotEnoughRoles => ApiError::Conflict(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::Validation("bad".into()).into_response(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::WrongPassword.into_response(),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::Forbidden("nope".into()).into_response(),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::NotFound("gone".into()).into_response(),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::RoomFull.into_response(), StatusCode::CONFLICT),
            (
                ApiError::VersionConflict.into_response(),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::InvalidScript("x".into()).into_response(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::UpgradeRequired("tier".into()).into_response(),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                ApiError::RateLimited.into_response(),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ApiError::Internal("boom".into()).into_response(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::ServiceUnavailable("later".into()).into_response(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (response, expected) in cases {
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_engine_error_mapping() {
        assert!(matches!(
            ApiError::from(EngineError::NotHost),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(EngineError::SpectatorVote),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(EngineError::UnknownVoteOption("X".into())),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(EngineError::PendingPunishment),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(EngineError::GameEnded),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, ApiError::NotFound(_)));
    }
}
