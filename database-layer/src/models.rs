//! Stored records and the payloads that create or change them
//!
//! Records serialize as camelCase JSON. Create payloads are validated with
//! `validate()` before they reach a backend; change payloads carry only the
//! fields a caller supplied.

use auth_rbac::{RecordId, ResourceRef, Role};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{DatabaseError, DatabaseResult};

/// A stored record type and the payloads that create and change it
pub trait Entity: Clone + Send + Sync + 'static {
    type New: Send + 'static;
    type Changes: Send + 'static;

    /// Human readable name, e.g. "Patient"
    const NAME: &'static str;

    fn id(&self) -> RecordId;

    fn resource_ref(&self) -> ResourceRef;
}

/// Pagination and ownership restriction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: i64,
    pub offset: i64,
    /// Only rows assigned to this doctor. Ignored by entities without one.
    pub doctor_id: Option<RecordId>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            doctor_id: None,
        }
    }
}

impl ListQuery {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit,
            offset,
            doctor_id: None,
        }
    }

    pub fn for_doctor(mut self, doctor_id: Option<RecordId>) -> Self {
        self.doctor_id = doctor_id;
        self
    }
}

fn require(value: &str, field: &str) -> DatabaseResult<()> {
    if value.trim().is_empty() {
        return Err(DatabaseError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

fn reject_blank(value: Option<&String>, field: &str) -> DatabaseResult<()> {
    value.map_or(Ok(()), |v| require(v, field))
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn validate(&self) -> DatabaseResult<()> {
        require(&self.name, "name")?;
        require(&self.email, "email")?;
        if !self.email.contains('@') {
            return Err(DatabaseError::InvalidInput("email is invalid".to_string()));
        }
        require(&self.password_hash, "password")
    }
}

// =============================================================================
// Doctors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: RecordId,
    /// Login account this doctor record belongs to
    pub user_id: Option<RecordId>,
    pub name: String,
    pub email: Option<String>,
    pub specialty: String,
    pub phone: String,
    pub experience: Option<i32>,
    pub qualification: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub user_id: Option<RecordId>,
    pub name: String,
    pub email: Option<String>,
    pub specialty: String,
    pub phone: String,
    pub experience: Option<i32>,
    pub qualification: Option<String>,
}

impl NewDoctor {
    pub fn validate(&self) -> DatabaseResult<()> {
        require(&self.name, "name")?;
        require(&self.specialty, "specialty")?;
        require(&self.phone, "phone")?;
        if self.experience.is_some_and(|years| years < 0) {
            return Err(DatabaseError::InvalidInput(
                "experience must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DoctorChanges {
    pub user_id: Option<RecordId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub experience: Option<i32>,
    pub qualification: Option<String>,
}

impl DoctorChanges {
    pub fn validate(&self) -> DatabaseResult<()> {
        reject_blank(self.name.as_ref(), "name")?;
        reject_blank(self.specialty.as_ref(), "specialty")?;
        reject_blank(self.phone.as_ref(), "phone")
    }
}

impl Entity for Doctor {
    type New = NewDoctor;
    type Changes = DoctorChanges;
    const NAME: &'static str = "Doctor";

    fn id(&self) -> RecordId {
        self.id
    }

    fn resource_ref(&self) -> ResourceRef {
        ResourceRef::Doctor { id: self.id }
    }
}

// =============================================================================
// Patients
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: RecordId,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_history: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_history: Option<String>,
}

impl NewPatient {
    pub fn validate(&self) -> DatabaseResult<()> {
        require(&self.name, "name")?;
        require(&self.phone, "phone")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatientChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_history: Option<String>,
}

impl PatientChanges {
    pub fn validate(&self) -> DatabaseResult<()> {
        reject_blank(self.name.as_ref(), "name")?;
        reject_blank(self.phone.as_ref(), "phone")
    }
}

impl Entity for Patient {
    type New = NewPatient;
    type Changes = PatientChanges;
    const NAME: &'static str = "Patient";

    fn id(&self) -> RecordId {
        self.id
    }

    fn resource_ref(&self) -> ResourceRef {
        ResourceRef::Patient { id: self.id }
    }
}

// =============================================================================
// Appointments
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub date: NaiveDate,
    /// Wall-clock slot, `HH:MM`
    pub time: String,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub date: NaiveDate,
    pub time: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

fn validate_time(time: &str) -> DatabaseResult<()> {
    chrono::NaiveTime::parse_from_str(time, "%H:%M")
        .map(|_| ())
        .map_err(|_| DatabaseError::InvalidInput("time must be HH:MM".to_string()))
}

impl NewAppointment {
    pub fn validate(&self) -> DatabaseResult<()> {
        validate_time(&self.time)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AppointmentChanges {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl AppointmentChanges {
    /// Names of the fields this change sets
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.date.is_some() {
            fields.push("date");
        }
        if self.time.is_some() {
            fields.push("time");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.reason.is_some() {
            fields.push("reason");
        }
        if self.notes.is_some() {
            fields.push("notes");
        }
        fields
    }

    pub fn validate(&self) -> DatabaseResult<()> {
        self.time.as_deref().map_or(Ok(()), validate_time)
    }
}

impl Entity for Appointment {
    type New = NewAppointment;
    type Changes = AppointmentChanges;
    const NAME: &'static str = "Appointment";

    fn id(&self) -> RecordId {
        self.id
    }

    fn resource_ref(&self) -> ResourceRef {
        ResourceRef::Appointment {
            id: self.id,
            doctor_id: self.doctor_id,
        }
    }
}

// =============================================================================
// Prescriptions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub appointment_id: Option<RecordId>,
    pub diagnosis: String,
    /// JSON array of medication entries
    pub medications: serde_json::Value,
    pub frequency: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub appointment_id: Option<RecordId>,
    pub diagnosis: String,
    pub medications: serde_json::Value,
    pub frequency: String,
    pub notes: Option<String>,
}

fn validate_medications(medications: &serde_json::Value) -> DatabaseResult<()> {
    if !medications.is_array() {
        return Err(DatabaseError::InvalidInput(
            "medications must be an array".to_string(),
        ));
    }
    Ok(())
}

impl NewPrescription {
    pub fn validate(&self) -> DatabaseResult<()> {
        require(&self.diagnosis, "diagnosis")?;
        require(&self.frequency, "frequency")?;
        validate_medications(&self.medications)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrescriptionChanges {
    pub diagnosis: Option<String>,
    pub medications: Option<serde_json::Value>,
    pub frequency: Option<String>,
    pub notes: Option<String>,
}

impl PrescriptionChanges {
    pub fn validate(&self) -> DatabaseResult<()> {
        reject_blank(self.diagnosis.as_ref(), "diagnosis")?;
        reject_blank(self.frequency.as_ref(), "frequency")?;
        self.medications
            .as_ref()
            .map_or(Ok(()), validate_medications)
    }
}

impl Entity for Prescription {
    type New = NewPrescription;
    type Changes = PrescriptionChanges;
    const NAME: &'static str = "Prescription";

    fn id(&self) -> RecordId {
        self.id
    }

    fn resource_ref(&self) -> ResourceRef {
        ResourceRef::Prescription {
            id: self.id,
            doctor_id: self.doctor_id,
        }
    }
}

// =============================================================================
// Billing
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Partial,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub amount: f64,
    pub payment_status: PaymentStatus,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBilling {
    pub patient_id: RecordId,
    pub amount: f64,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub description: Option<String>,
    #[serde(default = "today")]
    pub date: NaiveDate,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn validate_amount(amount: f64) -> DatabaseResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(DatabaseError::InvalidInput(
            "amount must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

impl NewBilling {
    pub fn validate(&self) -> DatabaseResult<()> {
        validate_amount(self.amount)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BillingChanges {
    pub amount: Option<f64>,
    pub payment_status: Option<PaymentStatus>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl BillingChanges {
    pub fn validate(&self) -> DatabaseResult<()> {
        self.amount.map_or(Ok(()), validate_amount)
    }
}

impl Entity for Billing {
    type New = NewBilling;
    type Changes = BillingChanges;
    const NAME: &'static str = "Billing record";

    fn id(&self) -> RecordId {
        self.id
    }

    fn resource_ref(&self) -> ResourceRef {
        ResourceRef::Billing { id: self.id }
    }
}
