use crate::{error::DatabaseResult, models::*};
use async_trait::async_trait;
use auth_rbac::RecordId;

/// CRUD operations shared by every domain entity
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Rows in the entity's list order, paginated, restricted to `query.doctor_id` where the entity has one
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<E>>;

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<E>>;

    async fn create(&self, new: E::New) -> DatabaseResult<E>;

    /// `Ok(None)` when no row has this id
    async fn update(&self, id: RecordId, changes: E::Changes) -> DatabaseResult<Option<E>>;

    /// `Ok(false)` when no row has this id
    async fn delete(&self, id: RecordId) -> DatabaseResult<bool>;
}

/// Doctor records, plus the lookups that link a login account to a doctor
#[async_trait]
pub trait DoctorRepository: Repository<Doctor> {
    async fn find_by_user_id(&self, user_id: RecordId) -> DatabaseResult<Option<Doctor>>;

    /// Case-insensitive exact match
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Doctor>>;
}

/// Credential store
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> DatabaseResult<User>;

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<User>>;

    /// Case-insensitive exact match
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> DatabaseResult<()>;
}

pub type PatientRepository = dyn Repository<Patient>;
pub type AppointmentRepository = dyn Repository<Appointment>;
pub type PrescriptionRepository = dyn Repository<Prescription>;
pub type BillingRepository = dyn Repository<Billing>;
