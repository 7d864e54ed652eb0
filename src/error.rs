use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::actor::ActorRole;
use crate::models::suborder::{PaymentStatus, SuborderStatus};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: SuborderStatus,
        to: SuborderStatus,
    },

    #[error("{role:?} is not permitted to perform this transition")]
    Unauthorized { role: ActorRole },

    #[error("suborder was already claimed by another rider")]
    AlreadyClaimed,

    #[error("suborder is {status:?}, not ready to be claimed")]
    NotReady { status: SuborderStatus },

    #[error("rider is not the active rider for this suborder")]
    NotActiveRider,

    #[error("no rider position available")]
    NoPosition,

    #[error("pickup is {distance_km:.2} km away, outside the {radius_km} km claim radius")]
    TooFar { distance_km: f64, radius_km: f64 },

    #[error("coordinate out of range: lat {lat}, lng {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("payment cannot be confirmed while the suborder is {status:?}")]
    PaymentTooEarly { status: SuborderStatus },

    #[error("invalid payment transition from {from:?} to {to:?}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidTransition { .. }
            | AppError::AlreadyClaimed
            | AppError::NotReady { .. }
            | AppError::PaymentTooEarly { .. }
            | AppError::InvalidPaymentTransition { .. } => StatusCode::CONFLICT,
            AppError::Unauthorized { .. } | AppError::NotActiveRider => StatusCode::FORBIDDEN,
            AppError::NoPosition | AppError::TooFar { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidCoordinate { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({
            "error": self.to_string()
        });

        // Structured fields the acting UI needs to build an actionable message.
        match &self {
            AppError::InvalidTransition { from, to } => {
                body["from"] = json!(from);
                body["to"] = json!(to);
            }
            AppError::NotReady { status } | AppError::PaymentTooEarly { status } => {
                body["status"] = json!(status);
            }
            AppError::TooFar {
                distance_km,
                radius_km,
            } => {
                body["distance_km"] = json!(distance_km);
                body["radius_km"] = json!(radius_km);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
