use async_trait::async_trait;
use auth_rbac::{Identity, OwnershipResolver, RecordId, ResolveError};
use database_layer::DoctorRepository;
use std::sync::Arc;
use tracing::debug;

/// Links a caller to their doctor record through the domain store
///
/// The `doctors.user_id` link wins. When no record is linked to the account,
/// an unlinked record with exactly the caller's email (case-insensitive) is
/// accepted. Names are never compared.
pub struct RepositoryOwnershipResolver {
    doctors: Arc<dyn DoctorRepository>,
}

impl RepositoryOwnershipResolver {
    pub fn new(doctors: Arc<dyn DoctorRepository>) -> Self {
        Self { doctors }
    }
}

#[async_trait]
impl OwnershipResolver for RepositoryOwnershipResolver {
    async fn resolve_doctor_id(
        &self,
        identity: &Identity,
    ) -> Result<Option<RecordId>, ResolveError> {
        let linked = self
            .doctors
            .find_by_user_id(identity.id)
            .await
            .map_err(|e| ResolveError::Store(e.to_string()))?;
        if let Some(doctor) = linked {
            return Ok(Some(doctor.id));
        }

        let by_email = self
            .doctors
            .find_by_email(&identity.email)
            .await
            .map_err(|e| ResolveError::Store(e.to_string()))?;

        match by_email {
            Some(doctor) if doctor.user_id.is_none() => {
                debug!(user_id = identity.id, doctor_id = doctor.id, "Doctor matched by email");
                Ok(Some(doctor.id))
            }
            Some(doctor) => Err(ResolveError::Ambiguous(format!(
                "doctor {} with this email belongs to another account",
                doctor.id
            ))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_rbac::Role;
    use database_layer::{NewDoctor, NewUser, Repositories};

    async fn account(repos: &Repositories, email: &str) -> Identity {
        let user = repos
            .users
            .create(NewUser {
                name: "Dr. Sarah Johnson".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                role: Role::Doctor,
            })
            .await
            .unwrap();
        Identity::new(user.id, user.email, user.role, user.name)
    }

    fn doctor(user_id: Option<RecordId>, email: Option<&str>) -> NewDoctor {
        NewDoctor {
            user_id,
            name: "Dr. Sarah Johnson".to_string(),
            email: email.map(str::to_string),
            specialty: "Cardiology".to_string(),
            phone: "+1-555-0101".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn linked_record_wins() {
        let repos = Repositories::in_memory();
        let identity = account(&repos, "doctor1@hospital.com").await;
        repos.doctors.create(doctor(None, Some("other@hospital.com"))).await.unwrap();
        let linked = repos
            .doctors
            .create(doctor(Some(identity.id), None))
            .await
            .unwrap();

        let resolver = RepositoryOwnershipResolver::new(repos.doctors.clone());
        assert_eq!(resolver.resolve_doctor_id(&identity).await.unwrap(), Some(linked.id));
    }

    #[tokio::test]
    async fn unlinked_record_matches_by_email_only() {
        let repos = Repositories::in_memory();
        let identity = account(&repos, "Doctor1@Hospital.com").await;
        let by_email = repos
            .doctors
            .create(doctor(None, Some("doctor1@hospital.com")))
            .await
            .unwrap();

        let resolver = RepositoryOwnershipResolver::new(repos.doctors.clone());
        assert_eq!(
            resolver.resolve_doctor_id(&identity).await.unwrap(),
            Some(by_email.id)
        );
    }

    #[tokio::test]
    async fn same_name_without_link_or_email_is_not_a_match() {
        let repos = Repositories::in_memory();
        let identity = account(&repos, "doctor1@hospital.com").await;
        repos.doctors.create(doctor(None, None)).await.unwrap();

        let resolver = RepositoryOwnershipResolver::new(repos.doctors.clone());
        assert_eq!(resolver.resolve_doctor_id(&identity).await.unwrap(), None);
    }

    #[tokio::test]
    async fn email_match_linked_to_another_account_is_ambiguous() {
        let repos = Repositories::in_memory();
        let owner = account(&repos, "owner@hospital.com").await;
        let identity = account(&repos, "doctor1@hospital.com").await;
        repos
            .doctors
            .create(doctor(Some(owner.id), Some("doctor1@hospital.com")))
            .await
            .unwrap();

        let resolver = RepositoryOwnershipResolver::new(repos.doctors.clone());
        assert!(matches!(
            resolver.resolve_doctor_id(&identity).await,
            Err(ResolveError::Ambiguous(_))
        ));
    }
}
