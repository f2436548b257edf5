mod common;

use common::{TestApp, TEST_ADMIN, TEST_CLIENT};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};

async fn create_due(app: &TestApp, client: &Client, amount: f64) -> Value {
    let response = app
        .request(client, Method::POST, "/dues", TEST_ADMIN, true)
        .json(&json!({
            "userId": TEST_CLIENT,
            "label": "GST filing",
            "amount": amount,
            "dueDate": "2030-01-15T00:00:00Z",
        }))
        .send()
        .await
        .expect("Failed to create due");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse due")
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn admin_creates_due_and_client_lists_it() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let due = create_due(&app, &client, 1500.0).await;
    assert_eq!(due["paymentStatus"], "due");
    assert_eq!(due["status"], "Pending");
    assert_eq!(due["state"], "DUE");
    assert_eq!(due["version"], 0);

    let listed: Vec<Value> = app
        .request(&client, Method::GET, "/dues", TEST_CLIENT, false)
        .send()
        .await
        .expect("Failed to list dues")
        .json()
        .await
        .expect("Failed to parse list");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], due["id"]);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn create_due_without_amount_is_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = app
        .request(&client, Method::POST, "/dues", TEST_ADMIN, true)
        .json(&json!({
            "userId": TEST_CLIENT,
            "label": "Missing amount",
            "dueDate": "2030-01-15T00:00:00Z",
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn non_admin_cannot_create_due() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = app
        .request(&client, Method::POST, "/dues", TEST_CLIENT, false)
        .json(&json!({
            "userId": TEST_CLIENT,
            "label": "Nope",
            "amount": 100.0,
            "dueDate": "2030-01-15T00:00:00Z",
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn submission_never_auto_marks_paid() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let due = create_due(&app, &client, 1000.0).await;
    let due_id = due["id"].as_str().unwrap();

    let response = app
        .request(
            &client,
            Method::POST,
            &format!("/dues/{}/submissions", due_id),
            TEST_CLIENT,
            false,
        )
        .json(&json!({
            "method": "UPI",
            "paidAmount": 1000.0,
            "reference": "AB12CD34EF56",
        }))
        .send()
        .await
        .expect("Failed to submit payment");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse submission");
    // All three checks pass, so the heuristic recommends auto-accept...
    assert_eq!(body["rules"]["score"], 3);
    assert_eq!(body["rules"]["auto"], true);
    // ...and the due still waits for a human regardless.
    assert_eq!(body["due"]["paymentStatus"], "due");
    assert_eq!(body["due"]["status"], "Under Verification");
    assert_eq!(body["due"]["state"], "UNDER_VERIFICATION");
    assert_eq!(body["due"]["verification"]["reviewRequired"], true);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn stale_version_submission_conflicts() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let due = create_due(&app, &client, 500.0).await;
    let due_id = due["id"].as_str().unwrap();
    let path = format!("/dues/{}/submissions", due_id);

    let payload = json!({
        "method": "UPI",
        "paidAmount": 500.0,
        "reference": "XY98ZW76VU54",
        "expectedVersion": 0,
    });

    let first = app
        .request(&client, Method::POST, &path, TEST_CLIENT, false)
        .json(&payload)
        .send()
        .await
        .expect("Failed first submission");
    assert_eq!(first.status(), StatusCode::CREATED);

    // Same version token again: the record has moved on.
    let second = app
        .request(&client, Method::POST, &path, TEST_CLIENT, false)
        .json(&payload)
        .send()
        .await
        .expect("Failed second submission");
    assert_eq!(second.status(), StatusCode::CONFLICT);

    // Both attempts left audit rows.
    let submissions: Vec<Value> = app
        .request(&client, Method::GET, &path, TEST_ADMIN, true)
        .send()
        .await
        .expect("Failed to list submissions")
        .json()
        .await
        .expect("Failed to parse submissions");
    assert_eq!(submissions.len(), 2);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn mark_paid_settles_the_due() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let due = create_due(&app, &client, 2500.0).await;
    let due_id = due["id"].as_str().unwrap();

    let response = app
        .request(
            &client,
            Method::POST,
            &format!("/dues/{}/paid", due_id),
            TEST_ADMIN,
            true,
        )
        .json(&json!({ "paymentMethod": "CASH" }))
        .send()
        .await
        .expect("Failed to mark paid");
    assert_eq!(response.status(), StatusCode::OK);

    let settled: Value = response.json().await.expect("Failed to parse due");
    assert_eq!(settled["paymentStatus"], "paid");
    assert_eq!(settled["status"], "verified");
    assert_eq!(settled["state"], "PAID");
    assert_eq!(settled["paidAmount"], 2500.0);

    let paid: Vec<Value> = app
        .request(&client, Method::GET, "/dues/paid", TEST_CLIENT, false)
        .send()
        .await
        .expect("Failed to list paid")
        .json()
        .await
        .expect("Failed to parse paid list");
    assert_eq!(paid.len(), 1);

    // And the open list is empty now.
    let open: Vec<Value> = app
        .request(&client, Method::GET, "/dues", TEST_CLIENT, false)
        .send()
        .await
        .expect("Failed to list dues")
        .json()
        .await
        .expect("Failed to parse open list");
    assert!(open.is_empty());

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn deleting_a_due_keeps_its_audit_trail() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let due = create_due(&app, &client, 750.0).await;
    let due_id = due["id"].as_str().unwrap();
    let submissions_path = format!("/dues/{}/submissions", due_id);

    app.request(&client, Method::POST, &submissions_path, TEST_CLIENT, false)
        .json(&json!({ "method": "CASH", "paidAmount": 750.0 }))
        .send()
        .await
        .expect("Failed to submit payment");

    let deleted = app
        .request(
            &client,
            Method::DELETE,
            &format!("/dues/{}", due_id),
            TEST_ADMIN,
            true,
        )
        .send()
        .await
        .expect("Failed to delete due");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    // Orphaned audit rows survive the hard delete.
    let submissions: Vec<Value> = app
        .request(&client, Method::GET, &submissions_path, TEST_ADMIN, true)
        .send()
        .await
        .expect("Failed to list submissions")
        .json()
        .await
        .expect("Failed to parse submissions");
    assert_eq!(submissions.len(), 1);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn snapshot_reflects_store_state() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    create_due(&app, &client, 1000.0).await;
    create_due(&app, &client, 250.5).await;

    let snapshot: Value = app
        .request(&client, Method::GET, "/snapshot", TEST_CLIENT, false)
        .send()
        .await
        .expect("Failed to fetch snapshot")
        .json()
        .await
        .expect("Failed to parse snapshot");

    assert_eq!(snapshot["totalDue"], 1250.5);
    assert_eq!(snapshot["duesCount"], 2);
    assert_eq!(snapshot["monthPaidCount"], 0);

    // No intervening writes: a second call yields identical output.
    let again: Value = app
        .request(&client, Method::GET, "/snapshot", TEST_CLIENT, false)
        .send()
        .await
        .expect("Failed to fetch snapshot")
        .json()
        .await
        .expect("Failed to parse snapshot");
    assert_eq!(snapshot, again);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn ticket_lifecycle() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let created: Value = app
        .request(&client, Method::POST, "/tickets", TEST_CLIENT, false)
        .json(&json!({
            "title": "Payment not reflecting",
            "description": "Paid yesterday via UPI, still shows due.",
            "ticketType": "Payment Issue",
        }))
        .send()
        .await
        .expect("Failed to create ticket")
        .json()
        .await
        .expect("Failed to parse ticket");

    let ticket_id = created["ticketId"].as_str().unwrap();
    assert_eq!(ticket_id.len(), 8);
    assert_eq!(created["status"], "Active");

    let closed = app
        .request(
            &client,
            Method::POST,
            &format!("/tickets/{}/close", ticket_id),
            TEST_ADMIN,
            true,
        )
        .send()
        .await
        .expect("Failed to close ticket");
    assert_eq!(closed.status(), StatusCode::NO_CONTENT);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn announcement_over_200_chars_is_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = app
        .request(&client, Method::POST, "/announcements", TEST_ADMIN, true)
        .json(&json!({ "text": "x".repeat(201) }))
        .send()
        .await
        .expect("Failed to send announcement");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    app.cleanup().await;
}
