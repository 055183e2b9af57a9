//! Integration tests for the HTTP surface.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use stockbook_api::notify::NotifyError;
use stockbook_api::{create_app, ApiConfig, AppState, LogNotifier, TransactionNotifier};
use stockbook_core::{Contact, ContactType, Product, TransactionDetails};
use stockbook_db::{Database, DbConfig};

struct TestApp {
    app: Router,
    state: Arc<AppState>,
    token: String,
    business_id: String,
    customer: Contact,
    vendor: Contact,
}

async fn setup() -> TestApp {
    setup_with_notifier(Arc::new(LogNotifier)).await
}

async fn setup_with_notifier(notifier: Arc<dyn TransactionNotifier>) -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig::from_vars(HashMap::new()).unwrap();
    let state = Arc::new(AppState::new(&config, db, notifier));

    let business_id = Uuid::new_v4().to_string();
    let customer = contact(&business_id, "Ayesha Khan", "0300-1", ContactType::Customer);
    let vendor = contact(&business_id, "Metro Wholesale", "0300-2", ContactType::Vendor);
    state.db.contacts().insert(&customer).await.unwrap();
    state.db.contacts().insert(&vendor).await.unwrap();

    let token = state.jwt.generate_token("user-1", &business_id).unwrap();

    TestApp {
        app: create_app(state.clone()),
        state,
        token,
        business_id,
        customer,
        vendor,
    }
}

fn contact(business_id: &str, name: &str, phone: &str, contact_type: ContactType) -> Contact {
    let now = Utc::now();
    Contact {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
        contact_type,
        credit_limit_cents: 0,
        current_balance_cents: 0,
        is_active: true,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

impl TestApp {
    async fn add_product(&self, name: &str, stock: i64, min_stock_level: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id.clone(),
            name: name.to_string(),
            description: None,
            sku: None,
            category: "Grocery".to_string(),
            price_cents: 500,
            stock,
            min_stock_level,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        self.state.db.products().insert(&product).await.unwrap();
        product
    }

    async fn stock_of(&self, id: &str) -> i64 {
        self.state
            .db
            .products()
            .get_by_id(&self.business_id, id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(Some(&self.token), method, uri, body).await
    }

    async fn send_as(
        &self,
        token: Option<&str>,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    fn sale(&self, product: &Product, quantity: i64, price: f64) -> Value {
        json!({
            "type": "sale",
            "customerId": self.customer.id,
            "products": [{"productId": product.id, "quantity": quantity, "price": price}]
        })
    }
}

// =============================================================================
// Health & Auth
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let t = setup().await;

    let (status, json) = t.send_as(None, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["database"], true);
}

#[tokio::test]
async fn test_state_takes_retry_budget_from_config() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig::from_vars(HashMap::from([
        ("STOCKBOOK_POSTING_MAX_ATTEMPTS".to_string(), "5".to_string()),
        ("STOCKBOOK_POSTING_BACKOFF_MS".to_string(), "7".to_string()),
    ]))
    .unwrap();

    let state = AppState::new(&config, db, Arc::new(LogNotifier));

    assert_eq!(state.engine.retry_policy(), config.retry_policy());
    assert_eq!(state.engine.retry_policy().max_attempts, 5);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let t = setup().await;

    let (status, json) = t.send_as(None, "GET", "/api/transactions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);

    let (status, _) = t
        .send_as(Some("not-a-jwt"), "GET", "/api/transactions", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Posting
// =============================================================================

#[tokio::test]
async fn test_post_sale() {
    let t = setup().await;
    let product = t.add_product("Rice", 10, 2).await;

    let mut body = t.sale(&product, 10, 5.0);
    body["totalAmount"] = json!(1);
    let (status, json) = t.send("POST", "/api/transactions", Some(body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Sale recorded successfully");

    let transaction = &json["data"]["transaction"];
    assert_eq!(transaction["type"], "sale");
    assert_eq!(transaction["totalAmount"], json!(50.0));
    assert_eq!(transaction["status"], "completed");
    assert_eq!(transaction["paymentMethod"], "cash");
    assert_eq!(transaction["customerId"], json!(t.customer.id));
    assert_eq!(transaction["vendorId"], Value::Null);
    assert_eq!(transaction["counterparty"]["name"], "Ayesha Khan");
    assert_eq!(transaction["products"][0]["productName"], "Rice");
    assert_eq!(transaction["summary"]["totalQuantity"], 10);

    assert_eq!(t.stock_of(&product.id).await, 0);

    let (_, low) = t.send("GET", "/api/products/low-stock", None).await;
    assert_eq!(low["data"]["count"], 1);
    assert_eq!(low["data"]["products"][0]["isOutOfStock"], true);
}

#[tokio::test]
async fn test_post_purchase() {
    let t = setup().await;
    let product = t.add_product("Oil", 5, 2).await;

    let body = json!({
        "type": "purchase",
        "vendorId": t.vendor.id,
        "products": [{"productId": product.id, "quantity": 20, "price": 2}],
        "paymentMethod": "credit"
    });
    let (status, json) = t.send("POST", "/api/transactions", Some(body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Purchase recorded successfully");
    assert_eq!(json["data"]["transaction"]["totalAmount"], json!(40.0));
    assert_eq!(t.stock_of(&product.id).await, 25);
}

#[tokio::test]
async fn test_insufficient_stock_is_bad_request() {
    let t = setup().await;
    let product = t.add_product("Sugar", 3, 1).await;

    let (status, json) = t
        .send("POST", "/api/transactions", Some(t.sale(&product, 5, 1.0)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(
        json["message"],
        "Insufficient stock for product Sugar. Available: 3, Requested: 5"
    );
    assert_eq!(t.stock_of(&product.id).await, 3);
}

#[tokio::test]
async fn test_type_mismatch_is_bad_request() {
    let t = setup().await;
    let product = t.add_product("Rice", 10, 0).await;

    let body = json!({
        "type": "sale",
        "customerId": t.vendor.id,
        "products": [{"productId": product.id, "quantity": 1, "price": 1}]
    });
    let (status, _) = t.send("POST", "/api/transactions", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(t.stock_of(&product.id).await, 10);
}

#[tokio::test]
async fn test_unknown_counterparty_and_product_are_not_found() {
    let t = setup().await;
    let product = t.add_product("Rice", 10, 0).await;

    let body = json!({
        "type": "purchase",
        "vendorId": Uuid::new_v4().to_string(),
        "products": [{"productId": product.id, "quantity": 1, "price": 1}]
    });
    let (status, json) = t.send("POST", "/api/transactions", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Vendor not found");

    let body = json!({
        "type": "sale",
        "customerId": t.customer.id,
        "products": [{"productId": Uuid::new_v4().to_string(), "quantity": 1, "price": 1}]
    });
    let (status, _) = t.send("POST", "/api/transactions", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_request() {
    let t = setup().await;
    let product = t.add_product("Rice", 10, 0).await;

    let cases = [
        json!({"type": "refund", "customerId": t.customer.id, "products": []}),
        json!({"type": "sale", "customerId": t.customer.id, "products": []}),
        json!({"type": "sale", "customerId": t.customer.id,
               "products": [{"productId": product.id, "quantity": 0, "price": 1}]}),
        json!({"type": "sale", "customerId": t.customer.id,
               "products": [{"productId": product.id, "quantity": 1, "price": 1.234}]}),
        json!({"type": "sale", "customerId": t.customer.id, "paymentMethod": "barter",
               "products": [{"productId": product.id, "quantity": 1, "price": 1}]}),
    ];

    for body in cases {
        let (status, json) = t.send("POST", "/api/transactions", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json["success"], false);
    }
    assert_eq!(t.stock_of(&product.id).await, 10);
}

#[tokio::test]
async fn test_sub_cent_price_names_the_precision_rule() {
    let t = setup().await;
    let product = t.add_product("Rice", 10, 0).await;

    let body = json!({"type": "sale", "customerId": t.customer.id,
                      "products": [{"productId": product.id, "quantity": 1, "price": 1.234}]});
    let (status, json) = t.send("POST", "/api/transactions", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "price must be in whole cents (at most 2 decimal places)");
}

// =============================================================================
// Ledger Reads & Status
// =============================================================================

#[tokio::test]
async fn test_list_get_and_summary() {
    let t = setup().await;
    let product = t.add_product("Rice", 100, 0).await;

    for quantity in [1, 2, 3] {
        let (status, _) = t
            .send("POST", "/api/transactions", Some(t.sale(&product, quantity, 10.0)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = t
        .send("GET", "/api/transactions?type=sale&page=1&limit=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["pagination"], json!({"current": 1, "pages": 2, "total": 3, "limit": 2}));

    let id = json["data"]["transactions"][0]["id"].as_str().unwrap().to_string();
    let (status, json) = t.send("GET", &format!("/api/transactions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["transaction"]["id"], json!(id));

    let (status, json) = t.send("GET", "/api/transactions/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["summary"]["sales"]["totalAmount"], json!(60.0));
    assert_eq!(json["data"]["summary"]["sales"]["transactionCount"], 3);
    assert_eq!(json["data"]["summary"]["profitLoss"], json!(60.0));

    let (status, _) = t.send("GET", "/api/transactions?startDate=nonsense", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = Uuid::new_v4();
    let (status, json) = t.send("GET", &format!("/api/transactions/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_status_transitions() {
    let t = setup().await;
    let product = t.add_product("Rice", 10, 0).await;
    let (_, json) = t
        .send("POST", "/api/transactions", Some(t.sale(&product, 2, 1.0)))
        .await;
    let id = json["data"]["transaction"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/transactions/{}/status", id);

    let (status, json) = t
        .send("PATCH", &uri, Some(json!({"status": "cancelled"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Transaction status updated successfully");
    assert_eq!(json["data"]["transaction"]["status"], "cancelled");
    assert_eq!(t.stock_of(&product.id).await, 8);

    let (status, json) = t
        .send("PATCH", &uri, Some(json!({"status": "completed"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

// =============================================================================
// Adjustments
// =============================================================================

#[tokio::test]
async fn test_adjust_stock_endpoint() {
    let t = setup().await;
    let product = t.add_product("Rice", 10, 2).await;
    let uri = format!("/api/products/{}/stock", product.id);

    let (status, json) = t
        .send("PATCH", &uri, Some(json!({"quantity": 4, "operation": "subtract"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["previousStock"], 10);
    assert_eq!(json["data"]["newStock"], 6);
    assert_eq!(json["data"]["product"]["stock"], 6);

    let (status, json) = t.send("PATCH", &uri, Some(json!({"quantity": 1}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["operation"], "set");
    assert_eq!(t.stock_of(&product.id).await, 1);

    let missing = format!("/api/products/{}/stock", Uuid::new_v4());
    let (status, _) = t.send("PATCH", &missing, Some(json!({"quantity": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_adjust_balance_endpoint() {
    let t = setup().await;
    let uri = format!("/api/contacts/{}/balance", t.customer.id);

    let (status, json) = t
        .send("PATCH", &uri, Some(json!({"amount": 12.5, "operation": "subtract"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Contact balance updated successfully");
    assert_eq!(json["data"]["previousBalance"], json!(0.0));
    assert_eq!(json["data"]["newBalance"], json!(-12.5));
    assert_eq!(json["data"]["contact"]["currentBalance"], json!(-12.5));
}

// =============================================================================
// Notifications
// =============================================================================

struct ChannelNotifier(mpsc::UnboundedSender<String>);

#[async_trait]
impl TransactionNotifier for ChannelNotifier {
    async fn transaction_posted(
        &self,
        _business_id: &str,
        details: &TransactionDetails,
    ) -> Result<(), NotifyError> {
        self.0
            .send(details.transaction.id.clone())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

struct FailingNotifier;

#[async_trait]
impl TransactionNotifier for FailingNotifier {
    async fn transaction_posted(
        &self,
        _business_id: &str,
        _details: &TransactionDetails,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("mail server down".to_string()))
    }
}

#[tokio::test]
async fn test_notifier_receives_committed_transaction() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let t = setup_with_notifier(Arc::new(ChannelNotifier(tx))).await;
    let product = t.add_product("Rice", 10, 0).await;

    let (_, json) = t
        .send("POST", "/api/transactions", Some(t.sale(&product, 1, 1.0)))
        .await;

    let notified = rx.recv().await.unwrap();
    assert_eq!(json["data"]["transaction"]["id"], json!(notified));
}

#[tokio::test]
async fn test_failing_notifier_does_not_affect_response() {
    let t = setup_with_notifier(Arc::new(FailingNotifier)).await;
    let product = t.add_product("Rice", 10, 0).await;

    let (status, _) = t
        .send("POST", "/api/transactions", Some(t.sale(&product, 1, 1.0)))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(t.stock_of(&product.id).await, 9);
}
