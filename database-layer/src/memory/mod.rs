//! In-memory backend for local development and tests
//!
//! Mirrors the Postgres schema constraints: unique emails, one doctor record
//! per login account, foreign keys checked on insert and cascading deletes.

mod table;

use async_trait::async_trait;
use auth_rbac::RecordId;
use chrono::Utc;
use dashmap::DashMap;

use crate::{
    error::{DatabaseError, DatabaseResult},
    models::*,
    repository::*,
};
use table::{claim, release, Table};

#[derive(Default)]
pub struct InMemoryStore {
    users: Table<User>,
    user_emails: DashMap<String, RecordId>,
    doctors: Table<Doctor>,
    doctor_emails: DashMap<String, RecordId>,
    doctor_users: DashMap<RecordId, RecordId>,
    patients: Table<Patient>,
    appointments: Table<Appointment>,
    prescriptions: Table<Prescription>,
    billing: Table<Billing>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_patient(&self, id: RecordId) -> DatabaseResult<()> {
        if self.patients.contains(id) {
            Ok(())
        } else {
            Err(DatabaseError::ForeignKeyViolation("patient_id".to_string()))
        }
    }

    fn require_doctor(&self, id: RecordId) -> DatabaseResult<()> {
        if self.doctors.contains(id) {
            Ok(())
        } else {
            Err(DatabaseError::ForeignKeyViolation("doctor_id".to_string()))
        }
    }

    fn require_user(&self, id: RecordId) -> DatabaseResult<()> {
        if self.users.contains(id) {
            Ok(())
        } else {
            Err(DatabaseError::ForeignKeyViolation("user_id".to_string()))
        }
    }

    /// Re-point the unique doctor indexes when a record's email or account changes
    ///
    /// Both new keys are claimed before either old key is released. A failed
    /// claim leaves both indexes as they were.
    fn relink_doctor(
        &self,
        current: &Doctor,
        email: Option<&String>,
        user_id: Option<RecordId>,
    ) -> DatabaseResult<()> {
        let new_user = user_id.filter(|uid| current.user_id != Some(*uid));
        let old_email = current.email.as_ref().map(|e| e.to_ascii_lowercase());
        let new_email = email
            .map(|e| e.to_ascii_lowercase())
            .filter(|key| old_email.as_ref() != Some(key));

        if let Some(uid) = new_user {
            self.require_user(uid)?;
            claim(&self.doctor_users, uid, current.id, "doctors_user_id_key")?;
        }

        if let Some(key) = new_email.as_ref() {
            if let Err(e) = claim(&self.doctor_emails, key.clone(), current.id, "doctors_email_key") {
                if let Some(uid) = new_user {
                    release(&self.doctor_users, &uid, current.id);
                }
                return Err(e);
            }
        }

        if new_user.is_some() {
            if let Some(old) = current.user_id {
                release(&self.doctor_users, &old, current.id);
            }
        }
        if new_email.is_some() {
            if let Some(old) = old_email {
                release(&self.doctor_emails, &old, current.id);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl HealthCheck for InMemoryStore {
    async fn ping(&self) -> DatabaseResult<()> {
        Ok(())
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: NewUser) -> DatabaseResult<User> {
        let id = self.users.next_id();
        claim(
            &self.user_emails,
            user.email.to_ascii_lowercase(),
            id,
            "users_email_key",
        )?;

        Ok(self.users.insert(
            id,
            User {
                id,
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                role: user.role,
                created_at: Utc::now(),
            },
        ))
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<User>> {
        Ok(self.users.get(id))
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let id = self
            .user_emails
            .get(&email.to_ascii_lowercase())
            .map(|entry| *entry.value());
        Ok(id.and_then(|id| self.users.get(id)))
    }
}

// =============================================================================
// Doctors
// =============================================================================

#[async_trait]
impl Repository<Doctor> for InMemoryStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Doctor>> {
        Ok(self.doctors.list(query, |_| true))
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Doctor>> {
        Ok(self.doctors.get(id))
    }

    async fn create(&self, new: NewDoctor) -> DatabaseResult<Doctor> {
        let id = self.doctors.next_id();
        let placeholder = Doctor {
            id,
            user_id: None,
            name: new.name,
            email: None,
            specialty: new.specialty,
            phone: new.phone,
            experience: new.experience,
            qualification: new.qualification,
            created_at: Utc::now(),
        };
        self.relink_doctor(&placeholder, new.email.as_ref(), new.user_id)?;

        Ok(self.doctors.insert(
            id,
            Doctor {
                user_id: new.user_id,
                email: new.email,
                ..placeholder
            },
        ))
    }

    async fn update(&self, id: RecordId, changes: DoctorChanges) -> DatabaseResult<Option<Doctor>> {
        let Some(current) = self.doctors.get(id) else {
            return Ok(None);
        };
        self.relink_doctor(&current, changes.email.as_ref(), changes.user_id)?;

        Ok(self.doctors.update(id, |doctor| {
            if changes.user_id.is_some() {
                doctor.user_id = changes.user_id;
            }
            if let Some(name) = changes.name {
                doctor.name = name;
            }
            if changes.email.is_some() {
                doctor.email = changes.email;
            }
            if let Some(specialty) = changes.specialty {
                doctor.specialty = specialty;
            }
            if let Some(phone) = changes.phone {
                doctor.phone = phone;
            }
            if changes.experience.is_some() {
                doctor.experience = changes.experience;
            }
            if changes.qualification.is_some() {
                doctor.qualification = changes.qualification;
            }
        }))
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        let Some(doctor) = self.doctors.remove(id) else {
            return Ok(false);
        };
        if let Some(uid) = doctor.user_id {
            release(&self.doctor_users, &uid, id);
        }
        if let Some(email) = doctor.email {
            release(&self.doctor_emails, &email.to_ascii_lowercase(), id);
        }
        self.appointments.retain(|_, a| a.doctor_id != id);
        self.prescriptions.retain(|_, p| p.doctor_id != id);
        Ok(true)
    }
}

#[async_trait]
impl DoctorRepository for InMemoryStore {
    async fn find_by_user_id(&self, user_id: RecordId) -> DatabaseResult<Option<Doctor>> {
        let id = self.doctor_users.get(&user_id).map(|entry| *entry.value());
        Ok(id.and_then(|id| self.doctors.get(id)))
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Doctor>> {
        let id = self
            .doctor_emails
            .get(&email.to_ascii_lowercase())
            .map(|entry| *entry.value());
        Ok(id.and_then(|id| self.doctors.get(id)))
    }
}

// =============================================================================
// Patients
// =============================================================================

#[async_trait]
impl Repository<Patient> for InMemoryStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Patient>> {
        Ok(self.patients.list(query, |_| true))
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Patient>> {
        Ok(self.patients.get(id))
    }

    async fn create(&self, new: NewPatient) -> DatabaseResult<Patient> {
        let id = self.patients.next_id();
        Ok(self.patients.insert(
            id,
            Patient {
                id,
                name: new.name,
                email: new.email,
                phone: new.phone,
                address: new.address,
                date_of_birth: new.date_of_birth,
                gender: new.gender,
                blood_group: new.blood_group,
                emergency_contact: new.emergency_contact,
                medical_history: new.medical_history,
                created_at: Utc::now(),
            },
        ))
    }

    async fn update(&self, id: RecordId, changes: PatientChanges) -> DatabaseResult<Option<Patient>> {
        Ok(self.patients.update(id, |patient| {
            if let Some(name) = changes.name {
                patient.name = name;
            }
            if let Some(phone) = changes.phone {
                patient.phone = phone;
            }
            if changes.email.is_some() {
                patient.email = changes.email;
            }
            if changes.address.is_some() {
                patient.address = changes.address;
            }
            if changes.date_of_birth.is_some() {
                patient.date_of_birth = changes.date_of_birth;
            }
            if changes.gender.is_some() {
                patient.gender = changes.gender;
            }
            if changes.blood_group.is_some() {
                patient.blood_group = changes.blood_group;
            }
            if changes.emergency_contact.is_some() {
                patient.emergency_contact = changes.emergency_contact;
            }
            if changes.medical_history.is_some() {
                patient.medical_history = changes.medical_history;
            }
        }))
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        if self.patients.remove(id).is_none() {
            return Ok(false);
        }
        self.appointments.retain(|_, a| a.patient_id != id);
        self.prescriptions.retain(|_, p| p.patient_id != id);
        self.billing.retain(|_, b| b.patient_id != id);
        Ok(true)
    }
}

// =============================================================================
// Appointments
// =============================================================================

#[async_trait]
impl Repository<Appointment> for InMemoryStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Appointment>> {
        Ok(self.appointments.list_by(
            query,
            |a| query.doctor_id.map_or(true, |d| a.doctor_id == d),
            |a, b| (a.date, &a.time).cmp(&(b.date, &b.time)),
        ))
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Appointment>> {
        Ok(self.appointments.get(id))
    }

    async fn create(&self, new: NewAppointment) -> DatabaseResult<Appointment> {
        self.require_patient(new.patient_id)?;
        self.require_doctor(new.doctor_id)?;

        let id = self.appointments.next_id();
        Ok(self.appointments.insert(
            id,
            Appointment {
                id,
                patient_id: new.patient_id,
                doctor_id: new.doctor_id,
                date: new.date,
                time: new.time,
                status: AppointmentStatus::Scheduled,
                reason: new.reason,
                notes: new.notes,
                created_at: Utc::now(),
            },
        ))
    }

    async fn update(
        &self,
        id: RecordId,
        changes: AppointmentChanges,
    ) -> DatabaseResult<Option<Appointment>> {
        Ok(self.appointments.update(id, |appointment| {
            if let Some(date) = changes.date {
                appointment.date = date;
            }
            if let Some(time) = changes.time {
                appointment.time = time;
            }
            if let Some(status) = changes.status {
                appointment.status = status;
            }
            if changes.reason.is_some() {
                appointment.reason = changes.reason;
            }
            if changes.notes.is_some() {
                appointment.notes = changes.notes;
            }
        }))
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        if self.appointments.remove(id).is_none() {
            return Ok(false);
        }
        self.prescriptions.for_each_mut(|p| {
            if p.appointment_id == Some(id) {
                p.appointment_id = None;
            }
        });
        Ok(true)
    }
}

// =============================================================================
// Prescriptions
// =============================================================================

#[async_trait]
impl Repository<Prescription> for InMemoryStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Prescription>> {
        // Newest first
        Ok(self.prescriptions.list_by(
            query,
            |p| query.doctor_id.map_or(true, |d| p.doctor_id == d),
            |a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)),
        ))
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Prescription>> {
        Ok(self.prescriptions.get(id))
    }

    async fn create(&self, new: NewPrescription) -> DatabaseResult<Prescription> {
        self.require_patient(new.patient_id)?;
        self.require_doctor(new.doctor_id)?;
        if let Some(appointment_id) = new.appointment_id {
            if !self.appointments.contains(appointment_id) {
                return Err(DatabaseError::ForeignKeyViolation(
                    "appointment_id".to_string(),
                ));
            }
        }

        let id = self.prescriptions.next_id();
        Ok(self.prescriptions.insert(
            id,
            Prescription {
                id,
                patient_id: new.patient_id,
                doctor_id: new.doctor_id,
                appointment_id: new.appointment_id,
                diagnosis: new.diagnosis,
                medications: new.medications,
                frequency: new.frequency,
                notes: new.notes,
                created_at: Utc::now(),
            },
        ))
    }

    async fn update(
        &self,
        id: RecordId,
        changes: PrescriptionChanges,
    ) -> DatabaseResult<Option<Prescription>> {
        Ok(self.prescriptions.update(id, |prescription| {
            if let Some(diagnosis) = changes.diagnosis {
                prescription.diagnosis = diagnosis;
            }
            if let Some(medications) = changes.medications {
                prescription.medications = medications;
            }
            if let Some(frequency) = changes.frequency {
                prescription.frequency = frequency;
            }
            if changes.notes.is_some() {
                prescription.notes = changes.notes;
            }
        }))
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        Ok(self.prescriptions.remove(id).is_some())
    }
}

// =============================================================================
// Billing
// =============================================================================

#[async_trait]
impl Repository<Billing> for InMemoryStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Billing>> {
        Ok(self
            .billing
            .list_by(query, |_| true, |a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id))))
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Billing>> {
        Ok(self.billing.get(id))
    }

    async fn create(&self, new: NewBilling) -> DatabaseResult<Billing> {
        self.require_patient(new.patient_id)?;

        let id = self.billing.next_id();
        Ok(self.billing.insert(
            id,
            Billing {
                id,
                patient_id: new.patient_id,
                amount: new.amount,
                payment_status: new.payment_status,
                description: new.description,
                date: new.date,
                created_at: Utc::now(),
            },
        ))
    }

    async fn update(&self, id: RecordId, changes: BillingChanges) -> DatabaseResult<Option<Billing>> {
        Ok(self.billing.update(id, |bill| {
            if let Some(amount) = changes.amount {
                bill.amount = amount;
            }
            if let Some(status) = changes.payment_status {
                bill.payment_status = status;
            }
            if changes.description.is_some() {
                bill.description = changes.description;
            }
            if let Some(date) = changes.date {
                bill.date = date;
            }
        }))
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        Ok(self.billing.remove(id).is_some())
    }
}
