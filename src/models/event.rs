use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::actor::ActorContext;
use crate::models::suborder::{Suborder, SuborderStatus};

/// Audit record of one successful status transition. Appended to the
/// suborder's event log and broadcast to websocket subscribers so the owning
/// order can recompute its aggregate display status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub id: Uuid,
    pub suborder_id: Uuid,
    pub order_id: Uuid,
    pub previous: SuborderStatus,
    pub next: SuborderStatus,
    pub actor: ActorContext,
    pub occurred_at: DateTime<Utc>,
}

impl TransitionEvent {
    pub fn record(
        suborder: &Suborder,
        previous: SuborderStatus,
        next: SuborderStatus,
        actor: &ActorContext,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            suborder_id: suborder.id,
            order_id: suborder.order_id,
            previous,
            next,
            actor: *actor,
            occurred_at: Utc::now(),
        }
    }
}
