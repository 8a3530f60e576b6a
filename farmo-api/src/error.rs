use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use farmo_dispatch::DispatchError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    Dispatch(DispatchError),
    Anyhow(anyhow::Error),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::AuthenticationError(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AppError::AuthorizationError(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            AppError::Dispatch(err) => (dispatch_status(err), err.code()),
            AppError::Anyhow(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

fn dispatch_status(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::InvalidRequest(_)
        | DispatchError::InvalidOtp
        | DispatchError::InstantDisabled(_)
        | DispatchError::PriceUnset(_) => StatusCode::BAD_REQUEST,
        DispatchError::CategoryNotFound(_) | DispatchError::BookingNotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::NotAssignedProvider(_) => StatusCode::FORBIDDEN,
        // Lost races and stale actions
        DispatchError::AlreadyDecided(_)
        | DispatchError::Expired(_)
        | DispatchError::NoPendingRequest(_)
        | DispatchError::IllegalTransition { .. } => StatusCode::CONFLICT,
        DispatchError::NoProvidersNearby { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DispatchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let error_message = match &self {
            AppError::AuthenticationError(msg)
            | AppError::AuthorizationError(msg)
            | AppError::ValidationError(msg) => msg.clone(),
            AppError::Dispatch(DispatchError::Storage(msg)) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Dispatch(err) => err.to_string(),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                "Internal Server Error".to_string()
            }
        };

        let mut body = json!({
            "error": error_message,
            "code": code,
        });
        if let AppError::Dispatch(DispatchError::NoProvidersNearby { booking_id }) = &self {
            body["booking_id"] = json!(booking_id);
        }

        (status, Json(body)).into_response()
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        Self::Dispatch(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_lost_maps_to_conflict() {
        let err = AppError::from(DispatchError::AlreadyDecided("FB-1A2B3C4D".to_string()));
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "ALREADY_DECIDED"));

        let err = AppError::from(DispatchError::NoProvidersNearby {
            booking_id: "FB-1A2B3C4D".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = AppError::from(DispatchError::Storage("connection reset".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
