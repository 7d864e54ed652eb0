use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::tracking::{FeedState, LocationPing, RouteView};
use crate::state::AppState;

/// Append a position report to the suborder's route. Only the assigned rider
/// may report, and only while the suborder is in an active-transit state.
/// Reporting is best-effort: a rider that skips a beat just leaves a gap in
/// the route, nothing here or downstream treats that as a failure.
pub fn report_position(
    state: &AppState,
    suborder_id: Uuid,
    rider_id: Uuid,
    position: GeoPoint,
) -> Result<LocationPing, AppError> {
    position.validate()?;

    // read guard held across the append so a concurrent transition out of
    // the transit window cannot slip a ping past the check
    let suborder = state
        .suborders
        .get(&suborder_id)
        .ok_or_else(|| AppError::NotFound(format!("suborder {suborder_id} not found")))?;

    if suborder.assigned_rider != Some(rider_id) || !suborder.status.is_active_transit() {
        return Err(AppError::NotActiveRider);
    }

    let ping = LocationPing {
        suborder_id,
        position,
        recorded_at: Utc::now(),
    };

    state
        .routes
        .entry(suborder_id)
        .or_default()
        .push(ping.clone());
    state.metrics.location_pings_total.inc();

    debug!(
        suborder_id = %suborder_id,
        lat = position.lat,
        lng = position.lng,
        "position reported"
    );

    Ok(ping)
}

/// Snapshot of the route so far, plus the destination and whether the feed is
/// still live. This is a poll endpoint: consumers re-read it on their own
/// cadence (the reference interval is 10 seconds) and stop once the feed
/// reports itself final. Staleness is bounded only by the caller's interval.
/// Successive reads only ever grow until the feed freezes.
pub fn route(state: &AppState, suborder_id: Uuid) -> Result<RouteView, AppError> {
    let suborder = state
        .suborders
        .get(&suborder_id)
        .ok_or_else(|| AppError::NotFound(format!("suborder {suborder_id} not found")))?;

    let destination = state
        .orders
        .get(&suborder.order_id)
        .map(|order| order.delivery_address.clone())
        .ok_or_else(|| {
            AppError::Internal(format!(
                "order {} missing for suborder {suborder_id}",
                suborder.order_id
            ))
        })?;

    let pings = state
        .routes
        .get(&suborder_id)
        .map(|route| route.value().clone())
        .unwrap_or_default();

    Ok(RouteView {
        suborder_id,
        feed: FeedState::for_status(suborder.status),
        destination,
        pings,
    })
}
