use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::actor::{ActorContext, ActorRole};
use crate::models::event::TransitionEvent;
use crate::models::suborder::{PaymentStatus, Suborder, SuborderStatus};
use crate::state::AppState;

/// The transition table: which roles may move a suborder from one status to
/// another. Anything not listed here does not exist as a transition.
fn permitted_roles(
    from: SuborderStatus,
    to: SuborderStatus,
) -> Option<&'static [ActorRole]> {
    use ActorRole::*;
    use SuborderStatus::*;

    match (from, to) {
        (Pending, InProgress) => Some(&[Vendor]),
        (InProgress, Ready) => Some(&[Vendor]),
        (Ready, PickedUp) => Some(&[Rider]),
        (PickedUp, HandoverConfirmed) => Some(&[Vendor]),
        (HandoverConfirmed, InTransit) => Some(&[System]),
        (HandoverConfirmed, Delivered) | (InTransit, Delivered) => Some(&[Customer]),
        (Delivered, Completed) => Some(&[System, Vendor]),
        (from, Cancelled) if !from.is_terminal() => Some(&[Vendor, Customer, System]),
        _ => None,
    }
}

/// Validate and apply one transition against the current status. The caller
/// must hold the suborder's entry guard so that the read-verify-write here is
/// a single atomic step; a stale request simply fails the table lookup.
pub fn apply(
    suborder: &mut Suborder,
    target: SuborderStatus,
    actor: &ActorContext,
) -> Result<TransitionEvent, AppError> {
    let from = suborder.status;
    let roles = permitted_roles(from, target).ok_or(AppError::InvalidTransition {
        from,
        to: target,
    })?;

    if !roles.contains(&actor.role) {
        return Err(AppError::Unauthorized { role: actor.role });
    }

    suborder.status = target;
    Ok(TransitionEvent::record(suborder, from, target, actor))
}

/// Look up a suborder and drive one actor-initiated transition, auditing the
/// result. `handover_confirmed` auto-advances to `in_transit` inside the same
/// critical section, as the system actor.
pub fn transition(
    state: &AppState,
    suborder_id: Uuid,
    target: SuborderStatus,
    actor: &ActorContext,
) -> Result<Suborder, AppError> {
    let mut suborder = state
        .suborders
        .get_mut(&suborder_id)
        .ok_or_else(|| AppError::NotFound(format!("suborder {suborder_id} not found")))?;

    // ready -> picked_up is owned by dispatch::claim, which assigns the rider
    // under the same guard; it is not reachable as a bare transition.
    if target == SuborderStatus::PickedUp {
        state
            .metrics
            .transitions_total
            .with_label_values(&[target.as_str(), "rejected"])
            .inc();
        return Err(AppError::InvalidTransition {
            from: suborder.status,
            to: target,
        });
    }

    let mut events = Vec::with_capacity(2);
    match apply(&mut suborder, target, actor) {
        Ok(event) => events.push(event),
        Err(err) => {
            state
                .metrics
                .transitions_total
                .with_label_values(&[target.as_str(), "rejected"])
                .inc();
            return Err(err);
        }
    }

    if target == SuborderStatus::HandoverConfirmed {
        let event = apply(
            &mut suborder,
            SuborderStatus::InTransit,
            &ActorContext::system(),
        )?;
        events.push(event);
    }

    let updated = suborder.clone();
    commit(state, events);
    Ok(updated)
}

/// Advance the payment dimension. The target state is derived from the
/// confirming role: rider collection, vendor settlement, or the customer's
/// prepaid confirmation. No payment may be confirmed before the goods are
/// being prepared.
pub fn confirm_payment(
    state: &AppState,
    suborder_id: Uuid,
    actor: &ActorContext,
) -> Result<Suborder, AppError> {
    let mut suborder = state
        .suborders
        .get_mut(&suborder_id)
        .ok_or_else(|| AppError::NotFound(format!("suborder {suborder_id} not found")))?;

    let target = match actor.role {
        ActorRole::Rider => PaymentStatus::ConfirmedByRider,
        ActorRole::Vendor => PaymentStatus::ConfirmedByVendor,
        ActorRole::Customer => PaymentStatus::ConfirmedByCustomer,
        ActorRole::System => return Err(AppError::Unauthorized { role: actor.role }),
    };

    if matches!(
        suborder.status,
        SuborderStatus::Pending | SuborderStatus::InProgress
    ) {
        return Err(AppError::PaymentTooEarly {
            status: suborder.status,
        });
    }

    let from = suborder.payment_status;
    let allowed = matches!(
        (from, target),
        (PaymentStatus::Pending, PaymentStatus::ConfirmedByRider)
            | (PaymentStatus::ConfirmedByRider, PaymentStatus::ConfirmedByVendor)
            | (PaymentStatus::Pending, PaymentStatus::ConfirmedByCustomer)
    );

    if !allowed {
        return Err(AppError::InvalidPaymentTransition { from, to: target });
    }

    suborder.payment_status = target;
    info!(
        suborder_id = %suborder.id,
        from = ?from,
        to = ?target,
        "payment status advanced"
    );

    Ok(suborder.clone())
}

pub fn audit_log(state: &AppState, suborder_id: Uuid) -> Result<Vec<TransitionEvent>, AppError> {
    if !state.suborders.contains_key(&suborder_id) {
        return Err(AppError::NotFound(format!(
            "suborder {suborder_id} not found"
        )));
    }

    Ok(state
        .events
        .get(&suborder_id)
        .map(|events| events.value().clone())
        .unwrap_or_default())
}

/// Append events to the audit log and fan them out. Callers invoke this while
/// still holding the suborder guard so log order matches transition order.
pub(crate) fn commit(state: &AppState, events: Vec<TransitionEvent>) {
    for event in events {
        state
            .metrics
            .transitions_total
            .with_label_values(&[event.next.as_str(), "success"])
            .inc();

        info!(
            suborder_id = %event.suborder_id,
            from = event.previous.as_str(),
            to = event.next.as_str(),
            role = ?event.actor.role,
            "suborder transition"
        );

        state
            .events
            .entry(event.suborder_id)
            .or_default()
            .push(event.clone());
        let _ = state.transition_events_tx.send(event);
    }
}
