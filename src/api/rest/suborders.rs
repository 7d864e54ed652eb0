use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::{dispatch, lifecycle};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::actor::ActorContext;
use crate::models::suborder::{Suborder, SuborderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/suborders/claimable", get(list_claimable))
        .route("/suborders/:id", get(get_suborder))
        .route("/suborders/:id/claim", post(claim_suborder))
        .route("/suborders/:id/start-preparing", post(start_preparing))
        .route("/suborders/:id/mark-ready", post(mark_ready))
        .route("/suborders/:id/confirm-handover", post(confirm_handover))
        .route("/suborders/:id/confirm-delivery", post(confirm_delivery))
        .route("/suborders/:id/finalize", post(finalize_suborder))
        .route("/suborders/:id/cancel", post(cancel_suborder))
        .route("/suborders/:id/confirm-payment", post(confirm_payment))
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub actor: ActorContext,
}

#[derive(Deserialize)]
pub struct ClaimRequest {
    pub rider_id: Uuid,
    pub position: Option<GeoPoint>,
}

async fn get_suborder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Suborder>, AppError> {
    let suborder = state
        .suborders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("suborder {id} not found")))?;

    Ok(Json(suborder.value().clone()))
}

async fn list_claimable(State(state): State<Arc<AppState>>) -> Json<Vec<Suborder>> {
    Json(dispatch::claimable(&state))
}

async fn claim_suborder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClaimRequest>,
) -> Result<Json<Suborder>, AppError> {
    let updated = dispatch::claim(&state, id, payload.rider_id, payload.position)?;
    Ok(Json(updated))
}

async fn start_preparing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Suborder>, AppError> {
    let updated = lifecycle::transition(&state, id, SuborderStatus::InProgress, &payload.actor)?;
    Ok(Json(updated))
}

async fn mark_ready(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Suborder>, AppError> {
    let updated = lifecycle::transition(&state, id, SuborderStatus::Ready, &payload.actor)?;
    Ok(Json(updated))
}

async fn confirm_handover(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Suborder>, AppError> {
    let updated =
        lifecycle::transition(&state, id, SuborderStatus::HandoverConfirmed, &payload.actor)?;
    Ok(Json(updated))
}

async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Suborder>, AppError> {
    let updated = lifecycle::transition(&state, id, SuborderStatus::Delivered, &payload.actor)?;
    Ok(Json(updated))
}

async fn finalize_suborder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Suborder>, AppError> {
    let updated = lifecycle::transition(&state, id, SuborderStatus::Completed, &payload.actor)?;
    Ok(Json(updated))
}

async fn cancel_suborder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Suborder>, AppError> {
    let updated = lifecycle::transition(&state, id, SuborderStatus::Cancelled, &payload.actor)?;
    Ok(Json(updated))
}

async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Suborder>, AppError> {
    let updated = lifecycle::confirm_payment(&state, id, &payload.actor)?;
    Ok(Json(updated))
}
