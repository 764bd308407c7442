use crate::{
    models::*,
    resolver::OwnershipResolver,
    schema::{CapabilityTable, Effect},
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on a single doctor-ownership lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Request authorization engine
///
/// Stateless apart from its injected collaborators: every call re-evaluates
/// the capability table and, for owner rules, re-runs the ownership lookup.
pub struct AuthorizationEngine {
    /// Capability rules
    table: Arc<CapabilityTable>,

    /// Doctor record lookup for owner rules
    resolver: Arc<dyn OwnershipResolver>,

    lookup_timeout: Duration,
}

impl fmt::Debug for AuthorizationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationEngine")
            .field("table", &self.table)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

impl AuthorizationEngine {
    /// Create an engine using the hospital capability table
    pub fn new(resolver: Arc<dyn OwnershipResolver>) -> Self {
        Self {
            table: Arc::new(CapabilityTable::hospital()),
            resolver,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Replace the capability table
    pub fn with_table(mut self, table: CapabilityTable) -> Self {
        self.table = Arc::new(table);
        self
    }

    /// Bound the ownership lookup. An elapsed lookup denies.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }

    // =============================================================================
    // Authorization Operations
    // =============================================================================

    /// Role-only check, without ownership.
    ///
    /// Lets a handler reject by role before it loads the targeted record.
    /// Returns the effect the caller still has to satisfy.
    pub fn precheck(
        &self,
        identity: Option<&Identity>,
        operation: Operation,
        resource_type: ResourceType,
    ) -> Result<Effect, DenyReason> {
        let Some(identity) = identity else {
            return Err(DenyReason::Unauthenticated);
        };

        match self.table.effect(identity.role, resource_type, operation) {
            Effect::Deny => {
                warn!(
                    user_id = identity.id,
                    role = %identity.role,
                    resource = %resource_type,
                    operation = %operation,
                    "Capability denied"
                );
                Err(DenyReason::Forbidden)
            }
            effect => Ok(effect),
        }
    }

    /// Decide whether `identity` may perform `operation` on the resource
    pub async fn authorize(
        &self,
        identity: Option<&Identity>,
        operation: Operation,
        resource_type: ResourceType,
        resource_ref: Option<&ResourceRef>,
    ) -> Decision {
        let decision = self
            .evaluate(identity, operation, resource_type, resource_ref)
            .await;

        match (&decision, identity) {
            (Decision::Denied { reason }, Some(identity)) => warn!(
                user_id = identity.id,
                role = %identity.role,
                resource = %resource_type,
                operation = %operation,
                reason = ?reason,
                "Authorization denied"
            ),
            (Decision::Denied { .. }, None) => debug!(
                resource = %resource_type,
                operation = %operation,
                "Authorization denied: no identity"
            ),
            (decision, _) => debug!(
                resource = %resource_type,
                operation = %operation,
                decision = ?decision,
                "Authorization granted"
            ),
        }

        decision
    }

    /// Reject updates that touch fields outside the rule's field scope
    pub fn authorize_fields(
        &self,
        identity: Option<&Identity>,
        resource_type: ResourceType,
        operation: Operation,
        fields: &[&str],
    ) -> Result<(), DenyReason> {
        let Some(identity) = identity else {
            return Err(DenyReason::Unauthenticated);
        };

        let rule = self.table.rule(identity.role, resource_type, operation);
        if rule.effect == Effect::Deny {
            return Err(DenyReason::Forbidden);
        }

        if let Some(field) = fields.iter().find(|field| !rule.fields.permits(field)) {
            warn!(
                user_id = identity.id,
                role = %identity.role,
                resource = %resource_type,
                field = %field,
                "Field outside permitted scope"
            );
            return Err(DenyReason::Forbidden);
        }

        Ok(())
    }

    async fn evaluate(
        &self,
        identity: Option<&Identity>,
        operation: Operation,
        resource_type: ResourceType,
        resource_ref: Option<&ResourceRef>,
    ) -> Decision {
        let Some(identity) = identity else {
            return Decision::UNAUTHENTICATED;
        };

        if resource_ref.is_some_and(|r| r.resource_type() != resource_type) {
            return Decision::FORBIDDEN;
        }

        match self.table.effect(identity.role, resource_type, operation) {
            Effect::Deny => Decision::FORBIDDEN,
            Effect::Allow => Decision::Allowed,
            Effect::AllowIfOwner => {
                self.evaluate_ownership(identity, operation, resource_ref)
                    .await
            }
        }
    }

    async fn evaluate_ownership(
        &self,
        identity: &Identity,
        operation: Operation,
        resource_ref: Option<&ResourceRef>,
    ) -> Decision {
        let Some(doctor_id) = self.resolve_owner(identity).await else {
            return Decision::FORBIDDEN;
        };

        match operation {
            Operation::ReadList => Decision::AllowedWithFilter {
                filter: RowFilter { doctor_id },
            },
            Operation::Create => match resource_ref {
                None | Some(ResourceRef::PrescriptionDraft { doctor_id: None }) => {
                    Decision::AllowedAsOwner { doctor_id }
                }
                Some(ResourceRef::PrescriptionDraft {
                    doctor_id: Some(requested),
                }) if *requested == doctor_id => Decision::AllowedAsOwner { doctor_id },
                _ => Decision::FORBIDDEN,
            },
            Operation::Read | Operation::Update | Operation::Delete => {
                match resource_ref.and_then(ResourceRef::owner_doctor_id) {
                    Some(owner) if owner == doctor_id => Decision::Allowed,
                    _ => Decision::FORBIDDEN,
                }
            }
        }
    }

    async fn resolve_owner(&self, identity: &Identity) -> Option<RecordId> {
        let lookup = self.resolver.resolve_doctor_id(identity);

        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(Some(doctor_id))) => Some(doctor_id),
            Ok(Ok(None)) => {
                debug!(user_id = identity.id, "No doctor record linked to caller");
                None
            }
            Ok(Err(e)) => {
                warn!(
                    user_id = identity.id,
                    error = %logger_redacted::redact(&e.to_string()),
                    "Ownership lookup failed"
                );
                None
            }
            Err(_) => {
                warn!(
                    user_id = identity.id,
                    timeout_ms = u64::try_from(self.lookup_timeout.as_millis()).unwrap_or(u64::MAX),
                    "Ownership lookup timed out"
                );
                None
            }
        }
    }
}
