//! Tests for GET /api/payments/callback - the browser redirect back from
//! the gateway. Every path must end in a redirect, never a raw error.

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_callback_without_session_redirects_to_generic_error() {
    let (state, _) = create_test_app_state();

    let response = get(test_app(state), "/api/payments/callback").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), format!("{}/wsparcie/blad", TEST_FRONTEND_URL));
}

#[tokio::test]
async fn test_callback_unknown_session_redirects_and_creates_nothing() {
    let (state, gateway) = create_test_app_state();

    let response = get(
        test_app(state.clone()),
        "/api/payments/callback?sessionId=deadbeefdeadbeefdeadbeefdeadbeef&orderId=7&status=success",
    )
    .await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), format!("{}/wsparcie/blad", TEST_FRONTEND_URL));
    assert_eq!(gateway.verify_count(), 0, "no verification for unknown sessions");

    let conn = state.db.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM payments", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0, "callback must not fabricate records");
}

#[tokio::test]
async fn test_callback_success_verified_completes_and_redirects() {
    let (state, gateway) = create_test_app_state();
    let (parish, payment) = {
        let conn = state.db.get().unwrap();
        let parish = create_test_parish(&conn, "sw-anny", "Parafia św. Anny", "Kraków");
        let payment = create_test_payment(&conn, &parish.id, 2500);
        (parish, payment)
    };

    let response = get(
        test_app(state.clone()),
        &format!(
            "/api/payments/callback?sessionId={}&orderId=777&status=success",
            payment.session_id
        ),
    )
    .await;
    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response),
        format!(
            "{}/{}/wsparcie/sukces?paymentId={}&amount=25",
            TEST_FRONTEND_URL, parish.slug, payment.id
        )
    );

    // Verification was asked with the stored amount and the passed order id
    assert_eq!(gateway.verify_count(), 1);
    let verify = gateway.verify_calls.lock().unwrap()[0].clone();
    assert_eq!(verify.order_id, 777);
    assert_eq!(verify.amount_grosze, 2500);

    let conn = state.db.get().unwrap();
    let reloaded = queries::get_payment_by_id(&conn, &payment.id).unwrap().unwrap();
    assert_eq!(reloaded.status, PaymentStatus::Completed);
    let meta = reloaded.metadata_json();
    assert_eq!(meta["verified"], true);
    assert_eq!(meta["p24_order_id"], 777);
    // Keys written at creation survive the merge
    assert_eq!(meta["p24_token"], "tok_test");
}

#[tokio::test]
async fn test_callback_success_hint_without_verification_fails() {
    let gateway = MockGateway::new(MockBehavior::RejectVerification);
    let state = test_state(gateway.clone());
    let (parish, payment) = {
        let conn = state.db.get().unwrap();
        let parish = create_test_parish(&conn, "katedra", "Katedra", "Gdańsk");
        let payment = create_test_payment(&conn, &parish.id, 1000);
        (parish, payment)
    };

    let response = get(
        test_app(state.clone()),
        &format!(
            "/api/payments/callback?sessionId={}&orderId=5&status=success",
            payment.session_id
        ),
    )
    .await;
    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response),
        format!(
            "{}/{}/wsparcie/blad?paymentId={}&error=platnosc-nieudana",
            TEST_FRONTEND_URL, parish.slug, payment.id
        )
    );

    let conn = state.db.get().unwrap();
    let reloaded = queries::get_payment_by_id(&conn, &payment.id).unwrap().unwrap();
    assert_eq!(reloaded.status, PaymentStatus::Failed, "success hint alone is not enough");
}

#[tokio::test]
async fn test_callback_success_without_order_id_fails_without_verify_call() {
    let (state, gateway) = create_test_app_state();
    let payment = {
        let conn = state.db.get().unwrap();
        let parish = create_test_parish(&conn, "p", "P", "C");
        create_test_payment(&conn, &parish.id, 1000)
    };

    let response = get(
        test_app(state.clone()),
        &format!("/api/payments/callback?sessionId={}&status=success", payment.session_id),
    )
    .await;
    assert!(response.status().is_redirection());
    assert_eq!(gateway.verify_count(), 0);

    let conn = state.db.get().unwrap();
    let reloaded = queries::get_payment_by_id(&conn, &payment.id).unwrap().unwrap();
    assert_eq!(reloaded.status, PaymentStatus::Failed);
}

#[tokio::test]
async fn test_callback_cancel_wins_regardless_of_verification() {
    // Verification would fail, but cancel takes precedence anyway
    let gateway = MockGateway::new(MockBehavior::RejectVerification);
    let state = test_state(gateway);
    let (parish, payment) = {
        let conn = state.db.get().unwrap();
        let parish = create_test_parish(&conn, "sw-jana", "Parafia św. Jana", "Toruń");
        let payment = create_test_payment(&conn, &parish.id, 1000);
        (parish, payment)
    };

    let response = get(
        test_app(state.clone()),
        &format!(
            "/api/payments/callback?sessionId={}&orderId=9&status=cancel",
            payment.session_id
        ),
    )
    .await;
    assert!(response.status().is_redirection());
    // Back to the donation form, not the error page
    assert_eq!(
        location(&response),
        format!(
            "{}/{}/wsparcie?komunikat=platnosc-anulowana",
            TEST_FRONTEND_URL, parish.slug
        )
    );

    let conn = state.db.get().unwrap();
    let reloaded = queries::get_payment_by_id(&conn, &payment.id).unwrap().unwrap();
    assert_eq!(reloaded.status, PaymentStatus::Cancelled);
}

#[tokio::test]
async fn test_callback_gateway_outage_fails_payment_but_still_redirects() {
    let gateway = MockGateway::new(MockBehavior::Unavailable);
    let state = test_state(gateway);
    let payment = {
        let conn = state.db.get().unwrap();
        let parish = create_test_parish(&conn, "p", "P", "C");
        create_test_payment(&conn, &parish.id, 1000)
    };

    let response = get(
        test_app(state.clone()),
        &format!(
            "/api/payments/callback?sessionId={}&orderId=3&status=success",
            payment.session_id
        ),
    )
    .await;
    // Transport failure is "not verified", never a 5xx to the browser
    assert!(response.status().is_redirection());

    let conn = state.db.get().unwrap();
    let reloaded = queries::get_payment_by_id(&conn, &payment.id).unwrap().unwrap();
    assert_eq!(reloaded.status, PaymentStatus::Failed);
}

#[tokio::test]
async fn test_completed_callback_touches_parish() {
    let (state, _) = create_test_app_state();
    let (parish, payment) = {
        let conn = state.db.get().unwrap();
        let parish = create_test_parish(&conn, "p", "P", "C");
        let payment = create_test_payment(&conn, &parish.id, 2500);
        // Backdate parish so the touch is observable
        conn.execute(
            "UPDATE parishes SET updated_at = updated_at - 1000 WHERE id = ?1",
            [&parish.id],
        )
        .unwrap();
        (parish, payment)
    };

    let _ = get(
        test_app(state.clone()),
        &format!(
            "/api/payments/callback?sessionId={}&orderId=1&status=success",
            payment.session_id
        ),
    )
    .await;

    let conn = state.db.get().unwrap();
    let reloaded = queries::get_parish_by_id(&conn, &parish.id).unwrap().unwrap();
    assert!(reloaded.updated_at > parish.updated_at - 1000);
}
