//! Test utilities and fixtures for Kolekta integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use kolekta::db::{init_db, queries, AppState};
pub use kolekta::gateway::{
    GatewayError, PaymentGateway, RegisteredTransaction, TransactionRequest, VerifyRequest,
};
pub use kolekta::handlers;
pub use kolekta::models::*;

/// What the mock gateway should answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Registration succeeds, verification returns true.
    Normal,
    /// Registration succeeds, verification returns false.
    RejectVerification,
    /// Every call fails with a transport-level error.
    Unavailable,
}

/// Recording gateway double. Tests assert on the captured requests, e.g.
/// that a rejected donation never reached the gateway at all.
pub struct MockGateway {
    pub behavior: Mutex<MockBehavior>,
    pub register_calls: Mutex<Vec<TransactionRequest>>,
    pub verify_calls: Mutex<Vec<VerifyRequest>>,
}

impl MockGateway {
    pub fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            register_calls: Mutex::new(Vec::new()),
            verify_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn register_count(&self) -> usize {
        self.register_calls.lock().unwrap().len()
    }

    pub fn verify_count(&self) -> usize {
        self.verify_calls.lock().unwrap().len()
    }

    fn unavailable() -> GatewayError {
        GatewayError::Http {
            status: 503,
            body: "mock gateway down".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn register_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<RegisteredTransaction, GatewayError> {
        self.register_calls.lock().unwrap().push(request.clone());
        match *self.behavior.lock().unwrap() {
            MockBehavior::Unavailable => Err(Self::unavailable()),
            _ => Ok(RegisteredTransaction {
                token: format!("tok_{}", request.session_id),
                redirect_url: format!("https://gateway.test/trnRequest/tok_{}", request.session_id),
            }),
        }
    }

    async fn verify_transaction(&self, request: &VerifyRequest) -> Result<bool, GatewayError> {
        self.verify_calls.lock().unwrap().push(request.clone());
        match *self.behavior.lock().unwrap() {
            MockBehavior::Normal => Ok(true),
            MockBehavior::RejectVerification => Ok(false),
            MockBehavior::Unavailable => Err(Self::unavailable()),
        }
    }
}

pub const TEST_BASE_URL: &str = "http://localhost:3000";
pub const TEST_FRONTEND_URL: &str = "http://localhost:3001";

/// AppState over an in-memory database and the given mock gateway.
/// Pool size 1: every in-memory connection is its own database, so all
/// requests must share the single initialized one.
pub fn test_state(gateway: Arc<MockGateway>) -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        gateway,
        base_url: TEST_BASE_URL.to_string(),
        frontend_url: TEST_FRONTEND_URL.to_string(),
    }
}

pub fn create_test_app_state() -> (AppState, Arc<MockGateway>) {
    let gateway = MockGateway::new(MockBehavior::Normal);
    (test_state(gateway.clone()), gateway)
}

/// Router with the full public + webhook surface.
pub fn test_app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::public::router())
        .merge(handlers::webhooks::router())
        .with_state(state)
}

pub fn create_test_parish(conn: &Connection, slug: &str, name: &str, city: &str) -> Parish {
    queries::create_parish(
        conn,
        &CreateParish {
            slug: slug.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            description: None,
            contact_email: None,
        },
    )
    .expect("Failed to create test parish")
}

pub fn create_test_goal(conn: &Connection, parish_id: &str, title: &str) -> FundraisingGoal {
    queries::create_fundraising_goal(
        conn,
        parish_id,
        &CreateFundraisingGoal {
            title: title.to_string(),
            description: None,
            target_grosze: 1_000_000,
        },
    )
    .expect("Failed to create test goal")
}

/// Persist a pending payment the way the initiation handler would.
pub fn create_test_payment(conn: &Connection, parish_id: &str, amount_grosze: i64) -> Payment {
    queries::create_payment(
        conn,
        &NewPayment {
            session_id: kolekta::id::gen_session_id(),
            parish_id: parish_id.to_string(),
            goal_id: None,
            amount_grosze,
            donor_name: Some("Jan Kowalski".to_string()),
            donor_email: "jan@example.com".to_string(),
            message: None,
            is_anonymous: false,
            payment_method: "blik".to_string(),
            is_recurring: false,
            recurring_frequency: None,
            metadata: serde_json::json!({"p24_token": "tok_test"}),
        },
    )
    .expect("Failed to create test payment")
}

// ============ Request helpers ============

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    use tower::ServiceExt;
    app.oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> Response<Body> {
    use tower::ServiceExt;
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_form(app: Router, uri: &str, body: &str) -> Response<Body> {
    use tower::ServiceExt;
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("Response should be valid JSON")
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get("location")
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}
