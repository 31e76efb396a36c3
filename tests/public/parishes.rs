//! Tests for GET /api/parishes/{slug} - goal progress is recomputed from
//! completed payments, never from a stored counter.

use axum::http::StatusCode;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_parish_profile_aggregates_completed_payments_only() {
    let (state, _) = create_test_app_state();
    let (parish, goal) = {
        let conn = state.db.get().unwrap();
        let parish = create_test_parish(&conn, "sw-anny", "Parafia św. Anny", "Kraków");
        let goal = create_test_goal(&conn, &parish.id, "Remont dachu");
        (parish, goal)
    };

    // Two completed donations toward the goal, one still pending
    {
        let mut conn = state.db.get().unwrap();
        for amount in [2500i64, 1000] {
            let payment = queries::create_payment(
                &conn,
                &NewPayment {
                    session_id: kolekta::id::gen_session_id(),
                    parish_id: parish.id.clone(),
                    goal_id: Some(goal.id.clone()),
                    amount_grosze: amount,
                    donor_name: None,
                    donor_email: "d@example.com".to_string(),
                    message: None,
                    is_anonymous: true,
                    payment_method: "card".to_string(),
                    is_recurring: false,
                    recurring_frequency: None,
                    metadata: serde_json::json!({}),
                },
            )
            .unwrap();
            queries::apply_terminal_status(
                &mut conn,
                &payment.id,
                PaymentStatus::Completed,
                &serde_json::json!({}),
                "webhook",
            )
            .unwrap();
        }
        create_test_payment(&conn, &parish.id, 9999); // stays pending
    }

    let response = get(test_app(state), "/api/parishes/sw-anny").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["slug"], "sw-anny");
    assert_eq!(body["totalRaisedGrosze"], 3500);
    assert_eq!(body["donationCount"], 2);
    assert_eq!(body["goals"][0]["id"], goal.id);
    assert_eq!(body["goals"][0]["raisedGrosze"], 3500);
    assert_eq!(body["goals"][0]["targetGrosze"], 1_000_000);
}

#[tokio::test]
async fn test_parish_profile_unknown_slug_is_404() {
    let (state, _) = create_test_app_state();
    let response = get(test_app(state), "/api/parishes/nie-ma-takiej").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
