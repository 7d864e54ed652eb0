use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::suborder::SuborderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub location: GeoPoint,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub delivery_address: DeliveryAddress,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Aggregate display status of an order, derived from its suborders: the
/// least-advanced suborder still on the forward path, or `Cancelled` once
/// every suborder has been cancelled. Empty input yields `None`.
pub fn aggregate_status(statuses: &[SuborderStatus]) -> Option<SuborderStatus> {
    if statuses.is_empty() {
        return None;
    }

    statuses
        .iter()
        .filter(|status| status.rank().is_some())
        .copied()
        .min_by_key(|status| status.rank())
        .or(Some(SuborderStatus::Cancelled))
}
