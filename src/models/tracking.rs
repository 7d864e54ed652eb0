use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::order::DeliveryAddress;
use crate::models::suborder::SuborderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPing {
    pub suborder_id: Uuid,
    pub position: GeoPoint,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeedState {
    /// No rider assigned yet; the route is empty.
    Idle,
    /// Rider in an active-transit state; pings may still arrive.
    Live,
    /// Route frozen; no further pings will ever be accepted.
    Final,
}

impl FeedState {
    pub fn for_status(status: SuborderStatus) -> Self {
        if status.is_active_transit() {
            FeedState::Live
        } else if matches!(
            status,
            SuborderStatus::Delivered | SuborderStatus::Completed | SuborderStatus::Cancelled
        ) {
            FeedState::Final
        } else {
            FeedState::Idle
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteView {
    pub suborder_id: Uuid,
    pub feed: FeedState,
    pub destination: DeliveryAddress,
    pub pings: Vec<LocationPing>,
}
