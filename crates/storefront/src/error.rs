//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Handlers that can fail return `Result<T, AppError>`;
//! flows whose failures are only logged (guest cart transfer, cart removal)
//! handle them in place.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shop backend request failed.
    #[error("Shop API error: {0}")]
    Api(#[from] ApiError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Api(err) => match err.status() {
                Some(StatusCode::UNAUTHORIZED) => StatusCode::UNAUTHORIZED,
                Some(StatusCode::NOT_FOUND) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) => "Internal server error".to_string(),
            Self::Api(_) if status == StatusCode::BAD_GATEWAY => {
                "External service error".to_string()
            }
            Self::Api(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
            Self::BadRequest(_) => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Removed cart line", Some(&[("item_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[tokio::test]
    async fn test_responses_hide_gateway_details() {
        async fn body(err: AppError) -> (StatusCode, String) {
            let response = err.into_response();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap_or_default();
            (status, String::from_utf8_lossy(&bytes).into_owned())
        }

        assert_eq!(
            body(AppError::BadRequest("quantity must be between 1 and 999".to_string())).await,
            (
                StatusCode::BAD_REQUEST,
                "Bad request: quantity must be between 1 and 999".to_string()
            )
        );
        assert_eq!(
            body(AppError::Api(ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: Some("db password rejected".to_string()),
            }))
            .await,
            (StatusCode::BAD_GATEWAY, "External service error".to_string())
        );
    }

    #[test]
    fn test_api_errors_map_to_gateway_unless_client_facing() {
        let upstream = AppError::Api(ApiError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: None,
        });
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let expired = AppError::Api(ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: Some("jwt expired".to_string()),
        });
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);

        let invalid = AppError::Api(ApiError::InvalidUrl("bad id".to_string()));
        assert_eq!(invalid.status(), StatusCode::BAD_GATEWAY);
    }
}
