//! Error conversions - HTTP response rendering
//!
//! Renders [`AppError`] as `{ "error", "code" }` with the kind's status.

#[cfg(feature = "axum")]
use super::app_error::AppError;

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // 5xx の詳細はクライアントに返さない
        let message = if self.is_server_error() {
            "Internal server error"
        } else {
            self.message()
        };

        let body = serde_json::json!({
            "error": message,
            "code": self.code(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(all(test, feature = "axum"))]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;
    use axum::response::IntoResponse;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_into_response_body_shape() {
        let response = AppError::new(ErrorKind::BadRequest, "Invalid OTP code")
            .with_code("INVALID_CODE")
            .into_response();
        assert_eq!(response.status().as_u16(), 400);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INVALID_CODE");
        assert_eq!(body["error"], "Invalid OTP code");
    }

    #[tokio::test]
    async fn test_server_error_hides_detail() {
        let response = AppError::new(
            ErrorKind::InternalServerError,
            "connection reset by peer at 10.0.0.3",
        )
        .into_response();
        assert_eq!(response.status().as_u16(), 500);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"], "Internal server error");
    }
}
