pub mod appointments;
pub mod auth;
pub mod billing;
pub mod common;
pub mod doctors;
pub mod health;
pub mod patients;
pub mod prescriptions;
