use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SuborderStatus {
    Pending,
    InProgress,
    Ready,
    PickedUp,
    HandoverConfirmed,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
}

impl SuborderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SuborderStatus::Completed | SuborderStatus::Cancelled)
    }

    /// The window during which the assigned rider may report positions.
    pub fn is_active_transit(self) -> bool {
        matches!(
            self,
            SuborderStatus::PickedUp
                | SuborderStatus::HandoverConfirmed
                | SuborderStatus::InTransit
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SuborderStatus::Pending => "pending",
            SuborderStatus::InProgress => "in_progress",
            SuborderStatus::Ready => "ready",
            SuborderStatus::PickedUp => "picked_up",
            SuborderStatus::HandoverConfirmed => "handover_confirmed",
            SuborderStatus::InTransit => "in_transit",
            SuborderStatus::Delivered => "delivered",
            SuborderStatus::Completed => "completed",
            SuborderStatus::Cancelled => "cancelled",
        }
    }

    /// Position along the forward path, for aggregate display status.
    /// `Cancelled` sits outside the forward path and has no rank.
    pub fn rank(self) -> Option<u8> {
        match self {
            SuborderStatus::Pending => Some(0),
            SuborderStatus::InProgress => Some(1),
            SuborderStatus::Ready => Some(2),
            SuborderStatus::PickedUp => Some(3),
            SuborderStatus::HandoverConfirmed => Some(4),
            SuborderStatus::InTransit => Some(5),
            SuborderStatus::Delivered => Some(6),
            SuborderStatus::Completed => Some(7),
            SuborderStatus::Cancelled => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    ConfirmedByRider,
    ConfirmedByVendor,
    ConfirmedByCustomer,
}

/// The vendor+shop+branch triple a cart line belongs to; the grouping key
/// that materializes suborders at checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VendorRef {
    pub vendor_id: Uuid,
    pub shop_id: Uuid,
    pub branch_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suborder {
    pub id: Uuid,
    pub order_id: Uuid,
    pub vendor: VendorRef,
    pub pickup: GeoPoint,
    pub assigned_rider: Option<Uuid>,
    pub status: SuborderStatus,
    pub payment_status: PaymentStatus,
    pub items: Vec<LineItem>,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Suborder {
    /// Total is fixed here, at creation; transitions never touch it.
    pub fn new(order_id: Uuid, vendor: VendorRef, pickup: GeoPoint, items: Vec<LineItem>) -> Self {
        let total = items.iter().map(LineItem::subtotal).sum();

        Self {
            id: Uuid::new_v4(),
            order_id,
            vendor,
            pickup,
            assigned_rider: None,
            status: SuborderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            items,
            total,
            created_at: Utc::now(),
        }
    }
}
