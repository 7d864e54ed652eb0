use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::lifecycle;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::event::TransitionEvent;
use crate::models::tracking::{LocationPing, RouteView};
use crate::state::AppState;
use crate::tracking;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/suborders/:id/location", post(report_location))
        .route("/suborders/:id/route", get(get_route))
        .route("/suborders/:id/events", get(list_events))
}

#[derive(Deserialize)]
pub struct ReportLocationRequest {
    pub rider_id: Uuid,
    pub position: GeoPoint,
}

async fn report_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReportLocationRequest>,
) -> Result<Json<LocationPing>, AppError> {
    let ping = tracking::report_position(&state, id, payload.rider_id, payload.position)?;
    Ok(Json(ping))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteView>, AppError> {
    Ok(Json(tracking::route(&state, id)?))
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TransitionEvent>>, AppError> {
    Ok(Json(lifecycle::audit_log(&state, id)?))
}
