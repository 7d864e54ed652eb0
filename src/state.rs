use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::event::TransitionEvent;
use crate::models::order::Order;
use crate::models::suborder::Suborder;
use crate::models::tracking::LocationPing;
use crate::observability::metrics::Metrics;

/// Shared in-memory state. The suborder entry guard is the per-suborder
/// critical section: every transition and claim does its check-and-write
/// while holding it, which is what serializes racing actors.
pub struct AppState {
    pub orders: DashMap<Uuid, Order>,
    pub suborders: DashMap<Uuid, Suborder>,
    pub routes: DashMap<Uuid, Vec<LocationPing>>,
    pub events: DashMap<Uuid, Vec<TransitionEvent>>,
    pub transition_events_tx: broadcast::Sender<TransitionEvent>,
    pub claim_radius_km: f64,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(claim_radius_km: f64, event_buffer_size: usize) -> Self {
        let (transition_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            orders: DashMap::new(),
            suborders: DashMap::new(),
            routes: DashMap::new(),
            events: DashMap::new(),
            transition_events_tx,
            claim_radius_km,
            metrics: Metrics::new(),
        }
    }
}
