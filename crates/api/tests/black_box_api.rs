use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use stockroom_api::app::{build_app, services::AppServices};
use stockroom_api::middleware::{PRINCIPAL_ID_HEADER, PRINCIPAL_ROLE_HEADER};
use stockroom_infra::{EngineConfig, InMemoryWarehouseStore};

struct TestServer {
    base_url: String,
    principal_id: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let services = AppServices::new(InMemoryWarehouseStore::new(), EngineConfig::default());
        let app = build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            principal_id: stockroom_core::UserId::new().to_string(),
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(PRINCIPAL_ID_HEADER, &self.principal_id)
            .header(PRINCIPAL_ROLE_HEADER, "HEAD_OF_WAREHOUSE")
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .request(reqwest::Method::POST, path)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    /// Category + supplier + one item with `initial_stock`; returns (supplier id, item id).
    async fn seed(&self, initial_stock: i64) -> (String, String) {
        let (status, category) = self
            .post("/categories", json!({ "name": "Hardware" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, supplier) = self
            .post("/suppliers", json!({ "name": "Acme Supply" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, item) = self
            .post(
                "/items",
                json!({
                    "name": "Bolt M8",
                    "categoryId": category["id"],
                    "unit": "pcs",
                    "minStock": 5,
                    "initialStock": initial_stock,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(item["sku"].as_str().unwrap().starts_with("HARD-"));

        (
            supplier["id"].as_str().unwrap().to_string(),
            item["id"].as_str().unwrap().to_string(),
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn principal_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");

    let (status, body) = srv.get("/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principal_id"], srv.principal_id.as_str());
    assert_eq!(body["role"], "HEAD_OF_WAREHOUSE");
}

#[tokio::test]
async fn incoming_goods_lifecycle_moves_stock() {
    let srv = TestServer::spawn().await;
    let (supplier_id, item_id) = srv.seed(10).await;

    let (status, created) = srv
        .post(
            "/transactions/incoming-goods",
            json!({
                "supplierId": supplier_id,
                "referenceNumber": "DO-881",
                "items": [{ "itemId": item_id, "quantity": 5 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "DRAFT");
    assert!(created["number"].as_str().unwrap().starts_with("IN-"));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, submitted) = srv
        .post(&format!("/transactions/incoming-goods/{id}/submit"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "WAITING_APPROVAL");

    // Submitting alone changes nothing.
    let (_, item) = srv.get(&format!("/items/{item_id}")).await;
    assert_eq!(item["currentStock"], 10);

    let (status, outcome) = srv
        .post(
            &format!("/transactions/incoming-goods/{id}/approve"),
            json!({ "rejectedItemIds": [], "signature": "data:image/png;base64,AAAA" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["approvedLineCount"], 1);
    assert_eq!(outcome["rejectedLineCount"], 0);

    let (_, item) = srv.get(&format!("/items/{item_id}")).await;
    assert_eq!(item["currentStock"], 15);

    let (_, approved) = srv.get(&format!("/transactions/incoming-goods/{id}")).await;
    assert_eq!(approved["status"], "APPROVED");
    assert_eq!(approved["approvedBy"], srv.principal_id.as_str());

    let (status, movements) = srv
        .get(&format!("/stock-movements?itemId={item_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let movements = movements.as_array().unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["direction"], "in");
    assert_eq!(movements[0]["previousStock"], 10);
    assert_eq!(movements[0]["newStock"], 15);
    assert_eq!(movements[0]["reference"], created["number"]);

    // Approving twice is a lifecycle conflict.
    let (status, body) = srv
        .post(&format!("/transactions/incoming-goods/{id}/approve"), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn item_request_beyond_stock_is_unprocessable() {
    let srv = TestServer::spawn().await;
    let (_, item_id) = srv.seed(3).await;

    let (status, created) = srv
        .post(
            "/transactions/item-requests",
            json!({
                "department": "Maintenance",
                "requestedBy": "Sam",
                "lines": [{ "itemId": item_id, "quantity": 4 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    srv.post(&format!("/transactions/item-requests/{id}/submit"), json!({}))
        .await;
    let (status, body) = srv
        .post(&format!("/transactions/item-requests/{id}/approve"), json!({}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "insufficient_stock");

    let (_, item) = srv.get(&format!("/items/{item_id}")).await;
    assert_eq!(item["currentStock"], 3);
    let (_, still_waiting) = srv.get(&format!("/transactions/item-requests/{id}")).await;
    assert_eq!(still_waiting["status"], "WAITING_APPROVAL");
    let (_, movements) = srv.get("/stock-movements").await;
    assert!(movements.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_approval_body_is_rejected_without_moving_stock() {
    let srv = TestServer::spawn().await;
    let (_, bolt_id) = srv.seed(10).await;
    let (_, bolt) = srv.get(&format!("/items/{bolt_id}")).await;

    let (status, nut) = srv
        .post(
            "/items",
            json!({
                "name": "Nut M8",
                "categoryId": bolt["categoryId"],
                "unit": "pcs",
                "minStock": 0,
                "initialStock": 10,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let nut_id = nut["id"].as_str().unwrap().to_string();

    let (status, created) = srv
        .post(
            "/transactions/outgoing-goods",
            json!({
                "destination": "Site B",
                "recipientName": "Ari",
                "lines": [
                    { "itemId": bolt_id, "quantity": 4 },
                    { "itemId": nut_id, "quantity": 6 },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    srv.post(&format!("/transactions/outgoing-goods/{id}/submit"), json!({}))
        .await;

    // A bare string is not a list of rejected ids.
    let (status, body) = srv
        .post(
            &format!("/transactions/outgoing-goods/{id}/approve"),
            json!({ "rejectedItemIds": nut_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // Neither is a body that isn't JSON at all.
    let res = srv
        .request(
            reqwest::Method::POST,
            &format!("/transactions/outgoing-goods/{id}/approve"),
        )
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let (_, nut) = srv.get(&format!("/items/{nut_id}")).await;
    assert_eq!(nut["currentStock"], 10);
    let (_, bolt) = srv.get(&format!("/items/{bolt_id}")).await;
    assert_eq!(bolt["currentStock"], 10);
    let (_, still_waiting) = srv.get(&format!("/transactions/outgoing-goods/{id}")).await;
    assert_eq!(still_waiting["status"], "WAITING_APPROVAL");
    let (_, movements) = srv.get("/stock-movements").await;
    assert!(movements.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn low_stock_lists_items_at_or_below_minimum() {
    let srv = TestServer::spawn().await;
    let (_, item_id) = srv.seed(5).await;

    let (status, items) = srv.get("/items/low-stock").await;
    assert_eq!(status, StatusCode::OK);
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], item_id.as_str());
}

#[tokio::test]
async fn unknown_kind_and_missing_transaction_are_not_found() {
    let srv = TestServer::spawn().await;

    let (status, _) = srv.post("/transactions/returns", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = stockroom_core::TransactionId::new();
    let (status, body) = srv
        .get(&format!("/transactions/purchase-orders/{missing}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = srv.get("/transactions/purchase-orders/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn empty_line_set_is_a_validation_error() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .post(
            "/transactions/outgoing-goods",
            json!({ "destination": "Site B", "recipientName": "Ari", "lines": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}
