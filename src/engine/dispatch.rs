use tracing::info;
use uuid::Uuid;

use crate::engine::{eligibility, lifecycle};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::actor::{ActorContext, ActorRole};
use crate::models::suborder::{Suborder, SuborderStatus};
use crate::state::AppState;

/// Claim a ready suborder for a rider. Status check, eligibility, the
/// ready -> picked_up transition, and the rider assignment all happen under
/// the suborder's entry guard: when two riders race, the guard serializes
/// them and the second one sees a suborder that is no longer ready.
pub fn claim(
    state: &AppState,
    suborder_id: Uuid,
    rider_id: Uuid,
    position: Option<GeoPoint>,
) -> Result<Suborder, AppError> {
    let result = try_claim(state, suborder_id, rider_id, position);

    let outcome = if result.is_ok() { "success" } else { "rejected" };
    state
        .metrics
        .claims_total
        .with_label_values(&[outcome])
        .inc();

    result
}

fn try_claim(
    state: &AppState,
    suborder_id: Uuid,
    rider_id: Uuid,
    position: Option<GeoPoint>,
) -> Result<Suborder, AppError> {
    let mut suborder = state
        .suborders
        .get_mut(&suborder_id)
        .ok_or_else(|| AppError::NotFound(format!("suborder {suborder_id} not found")))?;

    if suborder.status != SuborderStatus::Ready {
        return Err(if suborder.assigned_rider.is_some() {
            AppError::AlreadyClaimed
        } else {
            AppError::NotReady {
                status: suborder.status,
            }
        });
    }

    let distance_km = eligibility::check(position.as_ref(), &suborder.pickup, state.claim_radius_km)?;

    let actor = ActorContext {
        role: ActorRole::Rider,
        id: rider_id,
    };
    let event = lifecycle::apply(&mut suborder, SuborderStatus::PickedUp, &actor)?;
    suborder.assigned_rider = Some(rider_id);

    let updated = suborder.clone();
    lifecycle::commit(state, vec![event]);

    state.metrics.claim_distance_km.observe(distance_km);
    info!(
        suborder_id = %suborder_id,
        rider_id = %rider_id,
        distance_km,
        "suborder claimed"
    );

    Ok(updated)
}

/// The rider order-list view: every suborder currently open for claiming.
pub fn claimable(state: &AppState) -> Vec<Suborder> {
    state
        .suborders
        .iter()
        .filter(|entry| entry.value().status == SuborderStatus::Ready)
        .map(|entry| entry.value().clone())
        .collect()
}
