use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::config::ApiConfig;
use crate::state::AppState;

const TEST_CONFIG: &str = r#"
    [server]
    port = 8080

    [cache]
    summary_max_capacity = 16
    summary_ttl_seconds = 60
"#;

fn app() -> (axum::Router, AppState) {
    let config = ApiConfig::from_toml(TEST_CONFIG).expect("test config");
    let state = AppState::from_config(&config);
    (super::router(state.clone()), state)
}

async fn send(router: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1 << 20).await.expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn proposition(votes_for: u32, votes_against: u32) -> Value {
    json!({
        "description": "Cybersecurity training for staff",
        "amount": 15000,
        "kind": "expense",
        "total_voters": 15,
        "expires_on": "2999-01-30",
        "votes_for": votes_for,
        "votes_against": votes_against,
    })
}

#[tokio::test]
async fn health_endpoints_respond() {
    let (router, _) = app();
    let (status, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "live");

    let (status, body) = send(&router, "GET", "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reminders_enabled"], true);
}

#[tokio::test]
async fn ballot_flow_resolves_and_rejects_duplicates() {
    let (router, _) = app();
    let (status, created) = send(&router, "POST", "/votes/propositions", Some(proposition(5, 3))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "open");
    assert_eq!(created["quorum"], 9);
    let id = created["id"].as_i64().expect("id");

    let ballot = json!({"proposition_id": id, "voter": "alice", "option": "approve"});
    let (status, cast) = send(&router, "POST", "/votes/ballots", Some(ballot.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cast["status"], "approved");
    assert_eq!(cast["result"], true);
    assert_eq!(cast["votes_for"], 6);
    assert_eq!(cast["finalized"], true);

    let late = json!({"proposition_id": id, "voter": "bob", "approve": false});
    let (status, ignored) = send(&router, "POST", "/votes/ballots", Some(late)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ignored["accepted"], false);
    assert_eq!(ignored["votes_against"], 3);

    let (_, detail) = send(&router, "GET", &format!("/votes/propositions/{id}?voter=alice"), None).await;
    assert_eq!(detail["has_voted"], true);
    assert_eq!(detail["user_vote"], true);

    let (status, stats) = send(&router, "GET", "/votes/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({"total": 1, "open": 0, "approved": 1, "rejected": 0}));

    let (_, open) = send(&router, "GET", "/votes/propositions?status=open", None).await;
    assert_eq!(open, json!([]));
}

#[tokio::test]
async fn duplicate_ballot_conflicts() {
    let (router, _) = app();
    let (_, created) = send(&router, "POST", "/votes/propositions", Some(proposition(0, 0))).await;
    let id = created["id"].as_i64().expect("id");

    let ballot = json!({"proposition_id": id, "voter": "carol", "approve": true});
    let (status, _) = send(&router, "POST", "/votes/ballots", Some(ballot.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&router, "POST", "/votes/ballots", Some(ballot)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already voted"));

    let (status, _) = send(&router, "GET", "/votes/propositions/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn voter_length_is_counted_in_characters() {
    let (router, _) = app();
    let (_, created) = send(&router, "POST", "/votes/propositions", Some(proposition(0, 0))).await;
    let id = created["id"].as_i64().expect("id");

    let accented = "é".repeat(200);
    let ballot = json!({"proposition_id": id, "voter": accented, "approve": true});
    let (status, cast) = send(&router, "POST", "/votes/ballots", Some(ballot)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cast["accepted"], true);

    let ballot = json!({"proposition_id": id, "voter": "v".repeat(257), "approve": true});
    let (status, _) = send(&router, "POST", "/votes/ballots", Some(ballot)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let ballot = json!({"proposition_id": id, "voter": "   ", "approve": true});
    let (status, _) = send(&router, "POST", "/votes/ballots", Some(ballot)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn treasury_review_updates_balance_and_dashboard() {
    let (router, _) = app();
    let (_, dashboard) = send(&router, "GET", "/dashboard", None).await;
    assert_eq!(dashboard["spent"], 0);

    let expense = json!({
        "kind": "expense",
        "amount": 25000,
        "counterparty": "TechCorp Solutions",
        "description": "IT equipment",
    });
    let (status, record) = send(&router, "POST", "/treasury/transactions", Some(expense)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["amount"], -25000);
    assert_eq!(record["status"], "pending");
    let id = record["id"].as_i64().expect("id");

    let uri = format!("/treasury/transactions/{id}/review");
    let (status, reviewed) = send(&router, "POST", &uri, Some(json!({"decision": "validate"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["transaction"]["status"], "validated");
    assert_eq!(reviewed["summary"]["balance"], -25000);

    let (status, _) = send(&router, "POST", &uri, Some(json!({"decision": "reject"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, dashboard) = send(&router, "GET", "/dashboard", None).await;
    assert_eq!(dashboard["spent"], 25000);
    assert_eq!(dashboard["remaining"], 1_975_000);
}

#[tokio::test]
async fn forecasts_crud() {
    let (router, _) = app();
    let draft = json!({
        "kind": "revenue",
        "amount": 50000,
        "planned_on": "2024-02-15",
        "description": "Annual grant",
        "category": "Grants",
    });
    let (status, created) = send(&router, "POST", "/forecasts", Some(draft.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().expect("id");

    let mut changed = draft;
    changed["amount"] = json!(60000);
    let (status, updated) = send(&router, "PUT", &format!("/forecasts/{id}"), Some(changed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "modified");

    let (_, totals) = send(&router, "GET", "/forecasts/totals", None).await;
    assert_eq!(totals, json!({"revenue": 60000, "expense": 0, "net": 60000}));

    let (status, _) = send(&router, "DELETE", &format!("/forecasts/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, listing) = send(&router, "GET", "/forecasts", None).await;
    assert_eq!(listing["forecasts"], json!([]));
}

#[tokio::test]
async fn notifications_remind_and_toggle() {
    let (router, state) = app();
    let event = json!({
        "event": "deadline_passed",
        "message": "Validation deadline passed for transaction #1234",
        "recipient": "payment_officer",
        "level": "warning",
        "awaiting_reply": true,
    });
    let (status, created) = send(&router, "POST", "/notifications/events", Some(event)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_i64().expect("id");

    let (_, reminded) = send(&router, "POST", &format!("/notifications/{id}/remind"), None).await;
    assert_eq!(reminded["reminded"], true);
    assert_eq!(reminded["notification"]["reminder_count"], 1);

    let (_, read) = send(&router, "POST", &format!("/notifications/{id}/read"), None).await;
    assert_eq!(read["status"], "read");
    let (_, skipped) = send(&router, "POST", &format!("/notifications/{id}/remind"), None).await;
    assert_eq!(skipped["reminded"], false);

    let (_, toggle) = send(&router, "PUT", "/notifications/reminders", Some(json!({"enabled": false}))).await;
    assert_eq!(toggle["enabled"], false);
    assert!(!state.reminders_enabled.load(std::sync::atomic::Ordering::SeqCst));
}

#[tokio::test]
async fn configuration_batches_are_atomic() {
    let (router, state) = app();
    let invalid = json!({"changes": [
        {"id": "vote_quorum", "value": 75},
        {"id": "validation_delay", "value": 500},
    ]});
    let (status, body) = send(&router, "PUT", "/configuration", Some(invalid)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("validation_delay"));
    assert_eq!(state.store.read().await.parameters().quorum_percent(), 60);

    let valid = json!({"changes": [{"id": "vote_quorum", "value": 80}]});
    let (status, body) = send(&router, "PUT", "/configuration", Some(valid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], json!(["vote_quorum"]));

    let (_, created) = send(&router, "POST", "/votes/propositions", Some(proposition(0, 0))).await;
    assert_eq!(created["quorum"], 12);
}

#[tokio::test]
async fn reports_are_queued_listed_and_counted() {
    let (router, state) = app();
    let request = json!({"kind": "budget", "format": "pdf", "period": "January 2024"});
    let (status, queued) = send(&router, "POST", "/reports", Some(request)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(queued["status"], "generating");
    let id = queued["id"].as_i64().expect("id");

    let csv = json!({"kind": "votes", "format": "csv"});
    let (status, _) = send(&router, "POST", "/reports", Some(csv)).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    state.store.write().await.complete_reports(chrono::Utc::now());

    let (_, report) = send(&router, "GET", &format!("/reports/{id}"), None).await;
    assert_eq!(report["status"], "generated");
    assert_eq!(report["content"], "Budget report January 2024: 0 spent of 2000000");

    let (_, listing) = send(&router, "GET", "/reports?format=csv", None).await;
    let reports = listing["reports"].as_array().expect("reports");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["status"], "error");
    assert_eq!(listing["stats"]["total"], 2);

    let (_, stats) = send(&router, "GET", "/reports/stats", None).await;
    assert_eq!(stats["budget"], 1);
    assert_eq!(stats["votes"], 1);
    assert_eq!(stats["generating"], 0);

    let (status, _) = send(&router, "GET", "/reports/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
