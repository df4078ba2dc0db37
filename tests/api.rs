//! End-to-end tests against a real MongoDB.
//!
//! Set `TEST_DATABASE_URL` (default `mongodb://localhost:27017`). Each test uses
//! a throwaway database and is skipped when MongoDB is unreachable.

use diagnostic_service::config::Settings;
use diagnostic_service::database::{MongoDB, BOOKINGS, TESTS, USERS};
use diagnostic_service::services::auth_service::TokenIssuer;
use diagnostic_service::services::notification_service::{
    Mailer, NotificationDispatcher, OutgoingEmail,
};
use diagnostic_service::startup;
use diagnostic_service::utils::AppError;
use mongodb::bson::{doc, oid::ObjectId};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SECRET: &str = "integration-secret";

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

impl RecordingMailer {
    fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|e| e.to.clone()).collect()
    }
}

struct TestApp {
    address: String,
    db: MongoDB,
    client: reqwest::Client,
    mailer: Arc<RecordingMailer>,
}

impl TestApp {
    fn token(&self, email: &str) -> String {
        TokenIssuer::new(SECRET, 3600)
            .issue(json!({ "email": email }))
            .expect("token")
    }

    async fn add_user(&self, email: &str, role: &str) {
        self.db
            .documents(USERS)
            .insert_one(doc! { "email": email, "name": email, "role": role, "status": "active" })
            .await
            .expect("insert user");
    }

    async fn add_test(&self, name: &str, slots: i64) -> ObjectId {
        self.db
            .documents(TESTS)
            .insert_one(doc! { "name": name, "slots": slots, "price": 25.0 })
            .await
            .expect("insert test")
            .inserted_id
            .as_object_id()
            .expect("object id")
    }

    /// Notifications are sent from a detached task; give it a moment to land
    async fn settled_recipients(&self, expected: usize) -> Vec<String> {
        for _ in 0..50 {
            if self.mailer.recipients().len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        // Catch late duplicates too
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.mailer.recipients()
    }

    async fn cleanup(self) {
        let _ = self.db.database().drop().await;
    }
}

async fn spawn_app() -> Option<TestApp> {
    spawn_app_with(false).await
}

async fn spawn_app_with(booking_status_requires_admin: bool) -> Option<TestApp> {
    let _ = env_logger::builder().is_test(true).try_init();

    let url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let name = format!("diagnostic_test_{}", uuid::Uuid::new_v4().simple());

    let db = match MongoDB::new(&url, &name).await {
        Ok(db) => db,
        Err(err) => {
            eprintln!("Skipping test: MongoDB unavailable at {}: {}", url, err);
            return None;
        }
    };

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = Settings {
        host: "127.0.0.1".to_string(),
        port,
        database_url: url,
        database_name: name,
        token_secret: SECRET.to_string(),
        token_ttl_secs: 3600,
        stripe_secret_key: String::new(),
        stripe_api_base: "http://127.0.0.1:9".to_string(),
        payment_currency: "usd".to_string(),
        smtp: None,
        allowed_origins: vec![],
        booking_status_requires_admin,
    };

    let mailer = Arc::new(RecordingMailer::default());
    let notifier = NotificationDispatcher::new(mailer.clone());
    let server = startup::run_with(listener, db.clone(), settings, notifier)
        .expect("Failed to start server");
    let _ = tokio::spawn(server);

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        db,
        client: reqwest::Client::new(),
        mailer,
    })
}

#[tokio::test]
async fn admin_routes_require_token_then_admin_role() {
    let Some(app) = spawn_app().await else { return };
    app.add_user("admin@example.com", "admin").await;
    app.add_user("user@example.com", "user").await;

    let url = format!("{}/tests", app.address);
    let body = json!({ "name": "Complete Blood Count", "slots": 10 });

    let anonymous = app.client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let user = app
        .client
        .post(&url)
        .bearer_auth(app.token("user@example.com"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(user.status(), StatusCode::FORBIDDEN);

    let stranger = app
        .client
        .post(&url)
        .bearer_auth(app.token("nobody@example.com"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);

    let admin = app
        .client
        .post(&url)
        .bearer_auth(app.token("admin@example.com"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(admin.status(), StatusCode::OK);
    let ack: Value = admin.json().await.unwrap();
    assert_eq!(ack["acknowledged"], true);
    assert!(ack["insertedId"].is_string());

    app.cleanup().await;
}

#[tokio::test]
async fn admin_probe_only_answers_for_the_token_owner() {
    let Some(app) = spawn_app().await else { return };
    app.add_user("admin@example.com", "admin").await;

    let own: Value = app
        .client
        .get(format!("{}/user-admin/admin@example.com", app.address))
        .bearer_auth(app.token("admin@example.com"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(own, json!({ "admin": true }));

    let other = app
        .client
        .get(format!("{}/user-admin/admin@example.com", app.address))
        .bearer_auth(app.token("user@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::FORBIDDEN);

    app.cleanup().await;
}

#[tokio::test]
async fn last_slot_cannot_be_booked_twice() {
    let Some(app) = spawn_app().await else { return };
    let test_id = app.add_test("Lipid Profile", 1).await;
    let token = app.token("patient@example.com");

    let book = |n: u32| {
        let client = app.client.clone();
        let url = format!("{}/booking", app.address);
        let token = token.clone();
        async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&json!({
                    "testId": test_id.to_hex(),
                    "patientInfo": { "name": format!("Patient {}", n), "email": "patient@example.com" },
                }))
                .send()
                .await
                .unwrap()
                .status()
        }
    };

    let (first, second) = tokio::join!(book(1), book(2));
    let mut statuses = vec![first, second];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);

    let test = app
        .db
        .documents(TESTS)
        .find_one(doc! { "_id": test_id })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(test.get_i64("slots").unwrap(), 0);

    let bookings = app.db.documents(BOOKINGS).count_documents(doc! {}).await.unwrap();
    assert_eq!(bookings, 1);

    app.cleanup().await;
}

#[tokio::test]
async fn booking_unknown_test_is_not_found() {
    let Some(app) = spawn_app().await else { return };

    let response = app
        .client
        .post(format!("{}/booking", app.address))
        .bearer_auth(app.token("patient@example.com"))
        .json(&json!({ "testId": ObjectId::new().to_hex(), "patientInfo": { "email": "p@example.com" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await;
}

#[tokio::test]
async fn booking_search_is_case_insensitive_substring() {
    let Some(app) = spawn_app().await else { return };
    let bookings = app.db.documents(BOOKINGS);
    for email in ["alice@example.com", "ALICE@EXAMPLE.COM.au", "bob@example.com", "alice@exampleXcom"] {
        bookings
            .insert_one(doc! { "patientInfo": { "email": email }, "report": "Pending" })
            .await
            .unwrap();
    }

    let found: Vec<Value> = app
        .client
        .get(format!("{}/bookings", app.address))
        .query(&[("search", "alice@example.com")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let mut emails: Vec<String> = found
        .iter()
        .map(|b| b["patientInfo"]["email"].as_str().unwrap().to_string())
        .collect();
    emails.sort();
    assert_eq!(emails, vec!["ALICE@EXAMPLE.COM.au", "alice@example.com"]);

    let all: Vec<Value> = app
        .client
        .get(format!("{}/bookings", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 4);

    app.cleanup().await;
}

#[tokio::test]
async fn delivering_a_report_emails_the_patient_once() {
    let Some(app) = spawn_app().await else { return };
    let bookings = app.db.documents(BOOKINGS);
    let delivered_id = bookings
        .insert_one(doc! {
            "patientInfo": { "name": "Carol", "email": "carol@example.com" },
            "testName": "Thyroid Panel",
            "report": "Pending",
        })
        .await
        .unwrap()
        .inserted_id
        .as_object_id()
        .unwrap();
    let pending_id = bookings
        .insert_one(doc! { "patientInfo": { "email": "dave@example.com" }, "report": "Delivered" })
        .await
        .unwrap()
        .inserted_id
        .as_object_id()
        .unwrap();

    let token = app.token("staff@example.com");
    let patch = |id: ObjectId, status: &'static str| {
        app.client
            .patch(format!("{}/booking/status/{}", app.address, id.to_hex()))
            .bearer_auth(&token)
            .json(&json!({ "status": status }))
            .send()
    };

    let first: Value = patch(delivered_id, "Delivered").await.unwrap().json().await.unwrap();
    assert_eq!(first["modifiedCount"], 1);

    let second: Value = patch(delivered_id, "Delivered").await.unwrap().json().await.unwrap();
    assert_eq!(second["matchedCount"], 1);
    assert_eq!(second["modifiedCount"], 0);

    let reverted: Value = patch(pending_id, "Pending").await.unwrap().json().await.unwrap();
    assert_eq!(reverted["modifiedCount"], 1);

    assert_eq!(app.settled_recipients(1).await, vec!["carol@example.com".to_string()]);
    let sent = app.mailer.sent.lock().unwrap().clone();
    assert!(sent[0].body.contains("Thyroid Panel"));

    let delivered: Vec<Value> = app
        .client
        .get(format!("{}/bookings/delivered", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0]["_id"], json!(delivered_id.to_hex()));

    app.cleanup().await;
}

#[tokio::test]
async fn booking_status_can_be_restricted_to_admins() {
    let Some(app) = spawn_app_with(true).await else { return };
    app.add_user("admin@example.com", "admin").await;
    app.add_user("user@example.com", "user").await;
    let id = app
        .db
        .documents(BOOKINGS)
        .insert_one(doc! { "patientInfo": { "email": "erin@example.com" }, "report": "Pending" })
        .await
        .unwrap()
        .inserted_id
        .as_object_id()
        .unwrap();
    let url = format!("{}/booking/status/{}", app.address, id.to_hex());

    let user = app
        .client
        .patch(&url)
        .bearer_auth(app.token("user@example.com"))
        .json(&json!({ "status": "Delivered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(user.status(), StatusCode::FORBIDDEN);

    let admin = app
        .client
        .patch(&url)
        .bearer_auth(app.token("admin@example.com"))
        .json(&json!({ "status": "Delivered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(admin.status(), StatusCode::OK);
    assert_eq!(app.settled_recipients(1).await, vec!["erin@example.com".to_string()]);

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict() {
    let Some(app) = spawn_app().await else { return };
    let url = format!("{}/user", app.address);
    let body = json!({ "email": "frank@example.com", "name": "Frank", "role": "admin" });

    let first = app.client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let stored = app
        .db
        .documents(USERS)
        .find_one(doc! { "email": "frank@example.com" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.get_str("role").unwrap(), "user");

    app.cleanup().await;
}

#[tokio::test]
async fn failed_booking_insert_gives_the_slot_back() {
    let Some(app) = spawn_app().await else { return };
    let test_id = app.add_test("Vitamin D", 1).await;

    // The bookings collection already exists (indexes); make it refuse one patient
    app.db
        .database()
        .run_command(doc! {
            "collMod": BOOKINGS,
            "validator": { "patientInfo.email": { "$ne": "rejected@example.com" } },
            "validationAction": "error",
        })
        .await
        .expect("collMod");

    let response = app
        .client
        .post(format!("{}/booking", app.address))
        .bearer_auth(app.token("rejected@example.com"))
        .json(&json!({
            "testId": test_id.to_hex(),
            "patientInfo": { "email": "rejected@example.com" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let test = app
        .db
        .documents(TESTS)
        .find_one(doc! { "_id": test_id })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(test.get_i64("slots").unwrap(), 1);
    assert_eq!(app.db.documents(BOOKINGS).count_documents(doc! {}).await.unwrap(), 0);

    app.cleanup().await;
}

#[tokio::test]
async fn deleting_a_missing_test_reports_zero() {
    let Some(app) = spawn_app().await else { return };
    app.add_user("admin@example.com", "admin").await;

    let response = app
        .client
        .delete(format!("{}/test/delete/{}", app.address, ObjectId::new().to_hex()))
        .bearer_auth(app.token("admin@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack, json!({ "acknowledged": true, "deletedCount": 0 }));

    app.cleanup().await;
}

#[tokio::test]
async fn missing_documents_read_as_null() {
    let Some(app) = spawn_app().await else { return };

    let body = app
        .client
        .get(format!("{}/reservation/{}", app.address, ObjectId::new().to_hex()))
        .bearer_auth(app.token("patient@example.com"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "null");

    app.cleanup().await;
}
