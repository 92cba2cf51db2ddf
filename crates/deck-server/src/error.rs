use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deck_core::DeckError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 422 validation errors
// ---------------------------------------------------------------------------

/// Private sentinel error type used to carry an explicit HTTP 422 through the
/// `anyhow::Error` chain without touching the `DeckError` enum.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct ValidationError(String);

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 422 Unprocessable Entity error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self(ValidationError(msg.into()).into())
    }

    pub fn unauthenticated() -> Self {
        Self(DeckError::Unauthenticated.into())
    }

    pub fn forbidden(organization_id: impl Into<String>) -> Self {
        Self(DeckError::Forbidden(organization_id.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(v) = self.0.downcast_ref::<ValidationError>() {
            let body = serde_json::json!({ "error": v.0.clone() });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<DeckError>() {
            match e {
                DeckError::Unauthenticated => StatusCode::UNAUTHORIZED,
                DeckError::Forbidden(_) => StatusCode::FORBIDDEN,
                DeckError::InvalidPath(_)
                | DeckError::InvalidFolderPath(_)
                | DeckError::ReservedKey(_)
                | DeckError::InvalidKey(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DeckError::OrganizationNotFound(_)
                | DeckError::EventNotFound(_)
                | DeckError::StorageKeyNotFound(_)
                | DeckError::RecordNotFound(_) => StatusCode::NOT_FOUND,
                DeckError::NameTaken(_) => StatusCode::CONFLICT,
                DeckError::Store(_) | DeckError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_maps_to_401() {
        let response = AppError::unauthenticated().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let response = AppError::forbidden("o1").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn invalid_path_maps_to_422() {
        let err = AppError(DeckError::InvalidPath("a/b".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn reserved_key_maps_to_422() {
        let err = AppError(DeckError::ReservedKey("new".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn event_not_found_maps_to_404() {
        let err = AppError(DeckError::EventNotFound("e1".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn name_taken_maps_to_409() {
        let err = AppError(DeckError::NameTaken("/a".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_errors_map_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_constructor_maps_to_422() {
        let err = AppError::validation("SearchParams \"path\" is required");
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn validation_message_reaches_the_body() {
        use http_body_util::BodyExt;

        let response = AppError::validation("SearchParams \"path\" is required.").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "SearchParams \"path\" is required.");
    }

    #[test]
    fn response_body_is_json_with_error_field() {
        let err = AppError(DeckError::EventNotFound("e1".into()).into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
