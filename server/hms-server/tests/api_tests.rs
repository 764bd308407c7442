//! End-to-end tests of the HTTP API over the in-memory store

use std::sync::Arc;

use async_trait::async_trait;
use auth_rbac::{RecordId, Role};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use database_layer::{
    DatabaseError, DatabaseResult, NewAppointment, NewBilling, NewDoctor, NewPatient, NewUser,
    PaymentStatus, Repositories, User, UserRepository,
};
use hms_server::{create_app, AppConfig, HmsServer};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const PASSWORD: &str = "correct-horse-battery";

struct TestApp {
    server: HmsServer,
    app: Router,
    admin: User,
    doctor: User,
    receptionist: User,
}

impl TestApp {
    fn token(&self, user: &User) -> String {
        self.server.tokens.issue(user).unwrap().token
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        send(&self.app, request).await
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

async fn create_user(server: &HmsServer, name: &str, email: &str, role: Role) -> User {
    server
        .repos
        .users
        .create(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: server.passwords.hash(PASSWORD).await.unwrap(),
            role,
        })
        .await
        .unwrap()
}

fn appointment(patient_id: i64, doctor_id: i64) -> NewAppointment {
    NewAppointment {
        patient_id,
        doctor_id,
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        time: "10:30".to_string(),
        reason: Some("Checkup".to_string()),
        notes: None,
    }
}

/// Admin, doctor1 (doctor record 1) and a receptionist; doctor record 2 has no
/// account. Patient 1 has appointment 1 with doctor 1 and appointment 2 with
/// doctor 2.
async fn setup() -> TestApp {
    let server = HmsServer::new(AppConfig::default(), Repositories::in_memory());

    let admin = create_user(&server, "Admin", "admin@hospital.com", Role::Admin).await;
    let doctor = create_user(&server, "Dr. Sarah Johnson", "doctor1@hospital.com", Role::Doctor).await;
    let receptionist =
        create_user(&server, "Front Desk", "reception@hospital.com", Role::Receptionist).await;

    let repos = &server.repos;
    repos
        .doctors
        .create(NewDoctor {
            user_id: Some(doctor.id),
            name: "Dr. Sarah Johnson".to_string(),
            email: Some("doctor1@hospital.com".to_string()),
            specialty: "Cardiology".to_string(),
            phone: "+1-555-0101".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    repos
        .doctors
        .create(NewDoctor {
            name: "Dr. Michael Chen".to_string(),
            specialty: "Neurology".to_string(),
            phone: "+1-555-0102".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    repos
        .patients
        .create(NewPatient {
            name: "John Smith".to_string(),
            phone: "+1-555-0200".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    repos.appointments.create(appointment(1, 1)).await.unwrap();
    repos.appointments.create(appointment(1, 2)).await.unwrap();

    let app = create_app(server.clone());
    TestApp {
        server,
        app,
        admin,
        doctor,
        receptionist,
    }
}

#[tokio::test]
async fn health_reports_store_status() {
    let app = setup().await;
    let (status, _, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"], "healthy");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn missing_or_invalid_credentials_are_unauthorized() {
    let app = setup().await;

    let (status, _, body) = app.request(Method::GET, "/api/patients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");

    let request = Request::builder()
        .uri("/api/patients")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn unauthenticated_request_is_rejected_before_body_parsing() {
    let app = setup().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/patients")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _, _) = send(&app.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn receptionist_cannot_delete_patients() {
    let app = setup().await;

    let (status, _, body) = app
        .request(Method::DELETE, "/api/patients/1", Some(&app.receptionist), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden");

    // Role check precedes the lookup
    let (status, _, _) = app
        .request(Method::DELETE, "/api/patients/999", Some(&app.receptionist), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert!(app.server.repos.patients.find_by_id(1).await.unwrap().is_some());
}

#[tokio::test]
async fn missing_record_is_not_found() {
    let app = setup().await;
    let (status, _, body) = app
        .request(Method::GET, "/api/patients/999", Some(&app.admin), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Patient not found");
}

#[tokio::test]
async fn doctor_sees_only_own_appointments() {
    let app = setup().await;

    let (status, _, body) = app
        .request(Method::GET, "/api/appointments", Some(&app.doctor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let appointments = body.as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["doctorId"], 1);

    let (status, _, body) = app
        .request(Method::GET, "/api/appointments", Some(&app.receptionist), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _, _) = app
        .request(Method::GET, "/api/appointments/2", Some(&app.doctor), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn doctor_may_only_change_status_of_own_appointment() {
    let app = setup().await;

    let (status, _, body) = app
        .request(
            Method::PUT,
            "/api/appointments/1",
            Some(&app.doctor),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, _, _) = app
        .request(
            Method::PUT,
            "/api/appointments/1",
            Some(&app.doctor),
            Some(json!({ "date": "2024-06-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .request(
            Method::PUT,
            "/api/appointments/2",
            Some(&app.doctor),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let unchanged = app.server.repos.appointments.find_by_id(2).await.unwrap().unwrap();
    assert_eq!(unchanged.status, database_layer::AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn doctor_prescriptions_are_stamped_with_own_id() {
    let app = setup().await;
    let prescription = json!({
        "patientId": 1,
        "diagnosis": "Hypertension",
        "medications": [{ "name": "Lisinopril", "dose": "10mg" }],
        "frequency": "Once daily"
    });

    let (status, _, body) = app
        .request(
            Method::POST,
            "/api/prescriptions",
            Some(&app.doctor),
            Some(prescription.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["doctorId"], 1);

    let mut for_colleague = prescription;
    for_colleague["doctorId"] = json!(2);
    let (status, _, _) = app
        .request(
            Method::POST,
            "/api/prescriptions",
            Some(&app.doctor),
            Some(for_colleague),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .request(
            Method::POST,
            "/api/prescriptions",
            Some(&app.receptionist),
            Some(json!({ "patientId": 1, "doctorId": 1, "diagnosis": "x", "medications": [], "frequency": "daily" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn session_cookie_authenticates() {
    let app = setup().await;
    let request = Request::builder()
        .uri("/api/auth/me")
        .header(
            header::COOKIE,
            format!("hms_session={}", app.token(&app.doctor)),
        )
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "doctor1@hospital.com");
    assert_eq!(body["role"], "doctor");

    let (status, _, _) = app.request(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let app = setup().await;

    let (status, headers, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "Doctor1@Hospital.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["role"], "doctor");
    assert!(body["user"].get("passwordHash").is_none());

    let cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with("hms_session="));
    assert!(cookie.contains("HttpOnly"));

    let (status, _, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "doctor1@hospital.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn only_admins_register_accounts() {
    let app = setup().await;
    let new_account = json!({
        "name": "Dr. Emily Davis",
        "email": "doctor2@hospital.com",
        "password": "a-long-password",
        "role": "doctor"
    });

    let (status, _, _) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(&app.receptionist),
            Some(new_account.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(&app.admin),
            Some(new_account.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "doctor2@hospital.com");

    let (status, _, _) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(&app.admin),
            Some(new_account),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(&app.admin),
            Some(json!({ "name": "Nobody", "email": "nobody@hospital.com", "password": "a-long-password", "role": "janitor" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(&app.admin),
            Some(json!({ "email": "nobody@hospital.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_deletes_with_confirmation_message() {
    let app = setup().await;

    let (status, _, body) = app
        .request(Method::DELETE, "/api/appointments/2", Some(&app.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Appointment deleted successfully");

    let (status, _, _) = app
        .request(Method::GET, "/api/appointments/2", Some(&app.admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn receptionist_creates_billing_with_pending_default() {
    let app = setup().await;

    let (status, _, body) = app
        .request(
            Method::POST,
            "/api/billing",
            Some(&app.receptionist),
            Some(json!({ "patientId": 1, "amount": 150.0, "description": "Consultation" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["paymentStatus"], "pending");

    let (status, _, _) = app
        .request(
            Method::POST,
            "/api/billing",
            Some(&app.receptionist),
            Some(json!({ "patientId": 1, "amount": -5.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app
        .request(Method::GET, "/api/billing", Some(&app.doctor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn pagination_limits_list_size() {
    let app = setup().await;
    for i in 0..3 {
        app.server
            .repos
            .patients
            .create(NewPatient {
                name: format!("Patient {i}"),
                phone: "+1-555-0300".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let (status, _, body) = app
        .request(
            Method::GET,
            "/api/patients?page=2&page_size=2",
            Some(&app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 4]);
}

#[tokio::test]
async fn reads_embed_patient_and_doctor_summaries() {
    let app = setup().await;

    let (status, _, body) = app
        .request(Method::GET, "/api/appointments/1", Some(&app.receptionist), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["patient"]["name"], "John Smith");
    assert_eq!(body["doctor"]["name"], "Dr. Sarah Johnson");
    assert_eq!(body["doctor"]["specialty"], "Cardiology");
    assert!(body["patient"].get("medicalHistory").is_none());

    let (_, _, body) = app
        .request(Method::GET, "/api/appointments", Some(&app.admin), None)
        .await;
    let doctors: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["doctor"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(doctors, vec!["Dr. Sarah Johnson", "Dr. Michael Chen"]);

    app.server
        .repos
        .billing
        .create(NewBilling {
            patient_id: 1,
            amount: 120.0,
            payment_status: PaymentStatus::Pending,
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        })
        .await
        .unwrap();
    let (status, _, body) = app
        .request(Method::GET, "/api/billing", Some(&app.receptionist), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["patient"]["id"], 1);
    assert!(body[0].get("doctor").is_none());
}

/// User store that is down
struct FailingUsers;

#[async_trait]
impl UserRepository for FailingUsers {
    async fn create(&self, _user: NewUser) -> DatabaseResult<User> {
        Err(DatabaseError::QueryFailed("users unavailable".to_string()))
    }

    async fn find_by_id(&self, _id: RecordId) -> DatabaseResult<Option<User>> {
        Err(DatabaseError::QueryFailed("users unavailable".to_string()))
    }

    async fn find_by_email(&self, _email: &str) -> DatabaseResult<Option<User>> {
        Err(DatabaseError::QueryFailed("users unavailable".to_string()))
    }
}

#[tokio::test]
async fn health_answers_when_caller_lookup_fails() {
    let mut repos = Repositories::in_memory();
    repos.users = Arc::new(FailingUsers);
    let server = HmsServer::new(AppConfig::default(), repos);
    let app = create_app(server.clone());

    let user = User {
        id: 1,
        name: "Admin".to_string(),
        email: "admin@hospital.com".to_string(),
        password_hash: String::new(),
        role: Role::Admin,
        created_at: chrono::Utc::now(),
    };
    let bearer = format!("Bearer {}", server.tokens.issue(&user).unwrap().token);

    let request = Request::builder()
        .uri("/health")
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    // The handler's own extractor still reports the store failure
    let request = Request::builder()
        .uri("/api/patients")
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Database operation failed");
}
