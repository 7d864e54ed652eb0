use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::order::{aggregate_status, DeliveryAddress, Order};
use crate::models::suborder::{LineItem, Suborder, SuborderStatus, VendorRef};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
}

/// One finalized cart line from the checkout service. Pricing arrives
/// already settled; this core consumes it, it does not validate it.
#[derive(Deserialize)]
pub struct CartLine {
    pub vendor: VendorRef,
    pub pickup: GeoPoint,
    pub item_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub delivery_address: DeliveryAddress,
    pub lines: Vec<CartLine>,
}

#[derive(Serialize)]
pub struct OrderView {
    pub order: Order,
    pub status: SuborderStatus,
    pub suborders: Vec<Suborder>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<OrderView>, AppError> {
    if payload.lines.is_empty() {
        return Err(AppError::BadRequest(
            "order must contain at least one line".to_string(),
        ));
    }
    payload.delivery_address.location.validate()?;

    // group cart lines by vendor+shop+branch, keeping first-seen order
    let mut groups: Vec<(VendorRef, GeoPoint, Vec<LineItem>)> = Vec::new();
    for line in payload.lines {
        if line.quantity == 0 {
            return Err(AppError::BadRequest(format!(
                "line {} has zero quantity",
                line.item_id
            )));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(AppError::BadRequest(format!(
                "line {} has a negative unit price",
                line.item_id
            )));
        }
        line.pickup.validate()?;

        let item = LineItem {
            item_id: line.item_id,
            name: line.name,
            quantity: line.quantity,
            unit_price: line.unit_price,
        };

        match groups.iter_mut().find(|(vendor, _, _)| *vendor == line.vendor) {
            Some((_, _, items)) => items.push(item),
            None => groups.push((line.vendor, line.pickup, vec![item])),
        }
    }

    let order_id = Uuid::new_v4();
    let suborders: Vec<Suborder> = groups
        .into_iter()
        .map(|(vendor, pickup, items)| Suborder::new(order_id, vendor, pickup, items))
        .collect();

    let order = Order {
        id: order_id,
        customer_id: payload.customer_id,
        delivery_address: payload.delivery_address,
        total: suborders.iter().map(|suborder| suborder.total).sum(),
        created_at: Utc::now(),
    };

    state.orders.insert(order.id, order.clone());
    for suborder in &suborders {
        state.suborders.insert(suborder.id, suborder.clone());
    }

    tracing::info!(
        order_id = %order.id,
        suborders = suborders.len(),
        total = %order.total,
        "order placed"
    );

    Ok(Json(OrderView {
        order,
        status: SuborderStatus::Pending,
        suborders,
    }))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?
        .value()
        .clone();

    let mut suborders: Vec<Suborder> = state
        .suborders
        .iter()
        .filter(|entry| entry.value().order_id == id)
        .map(|entry| entry.value().clone())
        .collect();
    suborders.sort_by_key(|suborder| (suborder.created_at, suborder.id));

    let statuses: Vec<SuborderStatus> = suborders.iter().map(|suborder| suborder.status).collect();
    let status = aggregate_status(&statuses).unwrap_or(SuborderStatus::Pending);

    Ok(Json(OrderView {
        order,
        status,
        suborders,
    }))
}
