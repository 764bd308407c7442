use crate::{
    error::ResolveError,
    models::{Identity, RecordId},
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Resolves which doctor record, if any, belongs to a caller
#[async_trait]
pub trait OwnershipResolver: Send + Sync {
    /// `Ok(None)` when the caller has no doctor record
    async fn resolve_doctor_id(&self, identity: &Identity)
        -> Result<Option<RecordId>, ResolveError>;
}

/// In-memory resolver keyed by email, for testing and development
#[derive(Debug, Clone, Default)]
pub struct InMemoryOwnershipResolver {
    links: Arc<DashMap<String, RecordId>>,
}

impl InMemoryOwnershipResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link an account email to a doctor record
    pub fn link(&self, email: &str, doctor_id: RecordId) {
        self.links.insert(email.to_ascii_lowercase(), doctor_id);
    }

    pub fn unlink(&self, email: &str) {
        self.links.remove(&email.to_ascii_lowercase());
    }
}

#[async_trait]
impl OwnershipResolver for InMemoryOwnershipResolver {
    async fn resolve_doctor_id(
        &self,
        identity: &Identity,
    ) -> Result<Option<RecordId>, ResolveError> {
        Ok(self
            .links
            .get(&identity.email.to_ascii_lowercase())
            .map(|entry| *entry.value()))
    }
}
