use api_types::error::{ErrorBody, FieldError};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run_with_listener};

mod deposits;
mod health;
mod promo_codes;
mod server;
mod validation;
mod webhooks;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// The request body failed validation; one entry per offending field.
    Validation(Vec<FieldError>),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Gateway(_) | EngineError::Database(_) | EngineError::CorruptRecord(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::InvalidState(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidCode(_)
        | EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Gateway(gateway_err) => {
            tracing::error!("payment gateway error: {gateway_err}");
            "internal server error".to_string()
        }
        EngineError::CorruptRecord(detail) => {
            tracing::error!("corrupt record: {detail}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, details) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                message_for_engine_error(err),
                Vec::new(),
            ),
            ServerError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                "Invalid request data".to_string(),
                details,
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err, Vec::new()),
        };

        let body = ErrorBody {
            success: false,
            error,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use engine::GatewayError;
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_state_maps_to_400() {
        let res = ServerError::from(EngineError::InvalidState("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_gateway_maps_to_503() {
        let res =
            ServerError::from(EngineError::GatewayUnavailable("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn gateway_failure_hides_details() {
        let res = ServerError::from(EngineError::Gateway(GatewayError::Rejected {
            status: 401,
            message: "Invalid API Key provided: sk_live_****".to_string(),
        }))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "internal server error");
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let res = ServerError::Validation(vec![FieldError {
            field: "bookingId".to_string(),
            message: "bookingId is required".to_string(),
        }])
        .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["details"][0]["field"], "bookingId");
    }

    #[tokio::test]
    async fn corrupt_record_hides_details() {
        let res = ServerError::from(EngineError::CorruptRecord(
            "invalid stored booking id: 42".to_string(),
        ))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert_eq!(body["error"], "internal server error");
    }

    #[test]
    fn invalid_input_maps_to_400() {
        let res = ServerError::from(EngineError::InvalidInput("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
