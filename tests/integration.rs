use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use delivery_fulfillment::api::rest::router;
use delivery_fulfillment::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn setup() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(10.0, 64));
    (router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn actor(role: &str) -> Value {
    json!({ "role": role, "id": Uuid::new_v4() })
}

fn single_vendor_order() -> Value {
    json!({
        "customer_id": Uuid::new_v4(),
        "delivery_address": {
            "location": { "lat": 24.9056, "lng": 67.0822 },
            "street": "Shahrah-e-Faisal",
            "city": "Karachi",
            "postal_code": "75350"
        },
        "lines": [
            {
                "vendor": {
                    "vendor_id": Uuid::new_v4(),
                    "shop_id": Uuid::new_v4(),
                    "branch_id": Uuid::new_v4()
                },
                "pickup": { "lat": 24.8607, "lng": 67.0011 },
                "item_id": Uuid::new_v4(),
                "name": "chicken biryani",
                "quantity": 2,
                "unit_price": "350.00"
            }
        ]
    })
}

/// Places a one-vendor order and returns (order_id, suborder_id).
async fn place_order(app: &axum::Router) -> (String, String) {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/orders", single_vendor_order()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let order_id = body["order"]["id"].as_str().unwrap().to_string();
    let suborder_id = body["suborders"][0]["id"].as_str().unwrap().to_string();
    (order_id, suborder_id)
}

async fn post_transition(app: &axum::Router, suborder_id: &str, op: &str, role: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/{op}"),
            json!({ "actor": actor(role) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "{op} as {role} failed");
    body_json(response).await
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["orders"], 0);
    assert_eq!(body["suborders"], 0);
    assert_eq!(body["routes"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("location_pings_total"));
    assert!(body.contains("claim_distance_km"));
}

#[tokio::test]
async fn create_order_groups_lines_by_vendor() {
    let (app, _state) = setup();

    let shared_vendor = json!({
        "vendor_id": Uuid::new_v4(),
        "shop_id": Uuid::new_v4(),
        "branch_id": Uuid::new_v4()
    });
    let other_vendor = json!({
        "vendor_id": Uuid::new_v4(),
        "shop_id": Uuid::new_v4(),
        "branch_id": Uuid::new_v4()
    });

    let mut payload = single_vendor_order();
    payload["lines"] = json!([
        {
            "vendor": shared_vendor.clone(),
            "pickup": { "lat": 24.8607, "lng": 67.0011 },
            "item_id": Uuid::new_v4(),
            "name": "chicken biryani",
            "quantity": 2,
            "unit_price": "350.00"
        },
        {
            "vendor": shared_vendor,
            "pickup": { "lat": 24.8607, "lng": 67.0011 },
            "item_id": Uuid::new_v4(),
            "name": "raita",
            "quantity": 1,
            "unit_price": "120.50"
        },
        {
            "vendor": other_vendor,
            "pickup": { "lat": 24.8710, "lng": 67.0300 },
            "item_id": Uuid::new_v4(),
            "name": "falooda",
            "quantity": 1,
            "unit_price": "250.00"
        }
    ]);

    let response = app
        .oneshot(json_request("POST", "/orders", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let suborders = body["suborders"].as_array().unwrap();
    assert_eq!(suborders.len(), 2);
    assert_eq!(suborders[0]["items"].as_array().unwrap().len(), 2);
    assert_eq!(suborders[0]["total"], "820.50");
    assert_eq!(suborders[1]["total"], "250.00");
    assert_eq!(body["order"]["total"], "1070.50");
    assert_eq!(body["status"], "Pending");
    for suborder in suborders {
        assert_eq!(suborder["status"], "Pending");
        assert_eq!(suborder["payment_status"], "Pending");
        assert!(suborder["assigned_rider"].is_null());
    }
}

#[tokio::test]
async fn create_order_without_lines_returns_400() {
    let (app, _state) = setup();
    let mut payload = single_vendor_order();
    payload["lines"] = json!([]);

    let response = app
        .oneshot(json_request("POST", "/orders", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_order_with_zero_quantity_returns_400() {
    let (app, _state) = setup();
    let mut payload = single_vendor_order();
    payload["lines"][0]["quantity"] = json!(0);

    let response = app
        .oneshot(json_request("POST", "/orders", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_order_with_bad_pickup_returns_400() {
    let (app, _state) = setup();
    let mut payload = single_vendor_order();
    payload["lines"][0]["pickup"] = json!({ "lat": 124.0, "lng": 67.0 });

    let response = app
        .oneshot(json_request("POST", "/orders", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_nonexistent_order_returns_404() {
    let (app, _state) = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/orders/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn vendor_cannot_skip_preparation() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/mark-ready"),
            json!({ "actor": actor("Vendor") }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["from"], "Pending");
    assert_eq!(body["to"], "Ready");
}

#[tokio::test]
async fn rider_cannot_drive_vendor_transitions() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/start-preparing"),
            json!({ "actor": actor("Rider") }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn claim_requires_ready_status() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/claim"),
            json!({
                "rider_id": Uuid::new_v4(),
                "position": { "lat": 24.8650, "lng": 67.0050 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Pending");
}

#[tokio::test]
async fn claim_without_position_is_rejected() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;
    post_transition(&app, &suborder_id, "start-preparing", "Vendor").await;
    post_transition(&app, &suborder_id, "mark-ready", "Vendor").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/claim"),
            json!({ "rider_id": Uuid::new_v4() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // still claimable afterwards
    let response = app
        .oneshot(get_request("/suborders/claimable"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn distant_rider_gets_too_far_with_distance() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;
    post_transition(&app, &suborder_id, "start-preparing", "Vendor").await;
    post_transition(&app, &suborder_id, "mark-ready", "Vendor").await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/claim"),
            json!({
                "rider_id": Uuid::new_v4(),
                "position": { "lat": 25.2000, "lng": 67.0011 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["distance_km"].as_f64().unwrap() > 10.0);
    assert_eq!(body["radius_km"].as_f64().unwrap(), 10.0);
}

#[tokio::test]
async fn losing_claim_returns_already_claimed() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;
    post_transition(&app, &suborder_id, "start-preparing", "Vendor").await;
    post_transition(&app, &suborder_id, "mark-ready", "Vendor").await;

    let winner = Uuid::new_v4();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/claim"),
            json!({
                "rider_id": winner,
                "position": { "lat": 24.8650, "lng": 67.0050 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/claim"),
            json!({
                "rider_id": Uuid::new_v4(),
                "position": { "lat": 24.8650, "lng": 67.0050 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(get_request(&format!("/suborders/{suborder_id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "PickedUp");
    assert_eq!(body["assigned_rider"], winner.to_string());
}

#[tokio::test]
async fn wrong_rider_cannot_report_position() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;
    post_transition(&app, &suborder_id, "start-preparing", "Vendor").await;
    post_transition(&app, &suborder_id, "mark-ready", "Vendor").await;

    let rider = Uuid::new_v4();
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/claim"),
            json!({
                "rider_id": rider,
                "position": { "lat": 24.8650, "lng": 67.0050 }
            }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/location"),
            json!({
                "rider_id": Uuid::new_v4(),
                "position": { "lat": 24.8660, "lng": 67.0060 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get_request(&format!("/suborders/{suborder_id}/route")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["pings"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn payment_cannot_be_confirmed_before_preparation() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/confirm-payment"),
            json!({ "actor": actor("Rider") }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Pending");
}

#[tokio::test]
async fn cash_payment_flows_rider_then_vendor() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;
    post_transition(&app, &suborder_id, "start-preparing", "Vendor").await;
    post_transition(&app, &suborder_id, "mark-ready", "Vendor").await;

    let body = post_transition(&app, &suborder_id, "confirm-payment", "Rider").await;
    assert_eq!(body["payment_status"], "ConfirmedByRider");

    let body = post_transition(&app, &suborder_id, "confirm-payment", "Vendor").await;
    assert_eq!(body["payment_status"], "ConfirmedByVendor");
}

#[tokio::test]
async fn cancelled_suborder_is_not_claimable() {
    let (app, _state) = setup();
    let (_order_id, suborder_id) = place_order(&app).await;
    post_transition(&app, &suborder_id, "start-preparing", "Vendor").await;
    post_transition(&app, &suborder_id, "mark-ready", "Vendor").await;

    let body = post_transition(&app, &suborder_id, "cancel", "Customer").await;
    assert_eq!(body["status"], "Cancelled");

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/claim"),
            json!({
                "rider_id": Uuid::new_v4(),
                "position": { "lat": 24.8650, "lng": 67.0050 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn full_fulfillment_flow() {
    let (app, _state) = setup();
    let (order_id, suborder_id) = place_order(&app).await;

    let body = post_transition(&app, &suborder_id, "start-preparing", "Vendor").await;
    assert_eq!(body["status"], "InProgress");

    let body = post_transition(&app, &suborder_id, "mark-ready", "Vendor").await;
    assert_eq!(body["status"], "Ready");

    let response = app
        .clone()
        .oneshot(get_request("/suborders/claimable"))
        .await
        .unwrap();
    let claimable = body_json(response).await;
    assert_eq!(claimable.as_array().unwrap().len(), 1);

    // rider roughly 3 km north of the pickup
    let rider = Uuid::new_v4();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/claim"),
            json!({
                "rider_id": rider,
                "position": { "lat": 24.8877, "lng": 67.0011 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "PickedUp");
    assert_eq!(body["assigned_rider"], rider.to_string());

    let body = post_transition(&app, &suborder_id, "confirm-handover", "Vendor").await;
    assert_eq!(body["status"], "InTransit");

    for n in 0..5 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/suborders/{suborder_id}/location"),
                json!({
                    "rider_id": rider,
                    "position": { "lat": 24.8877 + 0.003 * n as f64, "lng": 67.0050 }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get_request(&format!("/suborders/{suborder_id}/route")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["feed"], "Live");
    assert_eq!(body["pings"].as_array().unwrap().len(), 5);
    assert_eq!(body["destination"]["city"], "Karachi");

    let body = post_transition(&app, &suborder_id, "confirm-delivery", "Customer").await;
    assert_eq!(body["status"], "Delivered");

    let body = post_transition(&app, &suborder_id, "finalize", "Vendor").await;
    assert_eq!(body["status"], "Completed");

    // route is frozen and marked final
    let response = app
        .clone()
        .oneshot(get_request(&format!("/suborders/{suborder_id}/route")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["feed"], "Final");
    let pings = body["pings"].as_array().unwrap();
    assert_eq!(pings.len(), 5);
    for (n, ping) in pings.iter().enumerate() {
        let lat = ping["position"]["lat"].as_f64().unwrap();
        assert!((lat - (24.8877 + 0.003 * n as f64)).abs() < 1e-9);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/suborders/{suborder_id}/location"),
            json!({
                "rider_id": rider,
                "position": { "lat": 24.9056, "lng": 67.0822 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // the order's aggregate display status follows its single suborder
    let response = app
        .clone()
        .oneshot(get_request(&format!("/orders/{order_id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "Completed");

    // full audit trail, in order
    let response = app
        .oneshot(get_request(&format!("/suborders/{suborder_id}/events")))
        .await
        .unwrap();
    let events = body_json(response).await;
    let transitions: Vec<(String, String)> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|event| {
            (
                event["previous"].as_str().unwrap().to_string(),
                event["next"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            ("Pending".to_string(), "InProgress".to_string()),
            ("InProgress".to_string(), "Ready".to_string()),
            ("Ready".to_string(), "PickedUp".to_string()),
            ("PickedUp".to_string(), "HandoverConfirmed".to_string()),
            ("HandoverConfirmed".to_string(), "InTransit".to_string()),
            ("InTransit".to_string(), "Delivered".to_string()),
            ("Delivered".to_string(), "Completed".to_string()),
        ]
    );
}
