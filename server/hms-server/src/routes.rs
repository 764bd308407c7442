use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{appointments, auth, billing, doctors, health, patients, prescriptions},
    server::HmsServer,
};

/// Create health check routes
pub fn health_routes() -> Router<HmsServer> {
    Router::new().route("/health", get(health::health_check))
}

/// Create authentication routes
pub fn auth_routes() -> Router<HmsServer> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/register", post(auth::register))
        .route("/me", get(auth::me))
}

pub fn patient_routes() -> Router<HmsServer> {
    Router::new()
        .route(
            "/patients",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            "/patients/:id",
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        )
}

pub fn doctor_routes() -> Router<HmsServer> {
    Router::new()
        .route(
            "/doctors",
            get(doctors::list_doctors).post(doctors::create_doctor),
        )
        .route(
            "/doctors/:id",
            get(doctors::get_doctor)
                .put(doctors::update_doctor)
                .delete(doctors::delete_doctor),
        )
}

pub fn appointment_routes() -> Router<HmsServer> {
    Router::new()
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/appointments/:id",
            get(appointments::get_appointment)
                .put(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
}

pub fn prescription_routes() -> Router<HmsServer> {
    Router::new()
        .route(
            "/prescriptions",
            get(prescriptions::list_prescriptions).post(prescriptions::create_prescription),
        )
        .route(
            "/prescriptions/:id",
            get(prescriptions::get_prescription)
                .put(prescriptions::update_prescription)
                .delete(prescriptions::delete_prescription),
        )
}

pub fn billing_routes() -> Router<HmsServer> {
    Router::new()
        .route("/billing", get(billing::list_billing).post(billing::create_billing))
        .route(
            "/billing/:id",
            get(billing::get_billing)
                .put(billing::update_billing)
                .delete(billing::delete_billing),
        )
}

/// All `/api` routes
pub fn api_routes() -> Router<HmsServer> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(patient_routes())
        .merge(doctor_routes())
        .merge(appointment_routes())
        .merge(prescription_routes())
        .merge(billing_routes())
}

pub fn create_routes() -> Router<HmsServer> {
    Router::new()
        // Health check routes (no authentication required)
        .merge(health_routes())
        .nest("/api", api_routes())
}
