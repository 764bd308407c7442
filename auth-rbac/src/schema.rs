use crate::{
    error::{RbacError, RbacResult},
    models::*,
};
use serde::Serialize;
use std::collections::HashMap;

/// Outcome a capability rule prescribes before ownership is considered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    /// Allowed only for records assigned to the caller's doctor record
    AllowIfOwner,
    Deny,
}

/// Which fields an update may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldScope {
    All,
    Only(&'static [&'static str]),
}

impl FieldScope {
    pub fn permits(&self, field: &str) -> bool {
        match self {
            FieldScope::All => true,
            FieldScope::Only(fields) => fields.contains(&field),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rule {
    pub effect: Effect,
    pub fields: FieldScope,
}

impl Rule {
    pub const fn allow() -> Self {
        Self {
            effect: Effect::Allow,
            fields: FieldScope::All,
        }
    }

    pub const fn owner() -> Self {
        Self {
            effect: Effect::AllowIfOwner,
            fields: FieldScope::All,
        }
    }

    pub const fn deny() -> Self {
        Self {
            effect: Effect::Deny,
            fields: FieldScope::All,
        }
    }

    pub const fn with_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.fields = FieldScope::Only(fields);
        self
    }
}

/// Fields a doctor may change on an appointment they own
pub const DOCTOR_APPOINTMENT_FIELDS: &[&str] = &["status"];

/// Static capability table keyed by `(role, resource type, operation)`
///
/// Built once and shared read-only. Lookups for a missing triple deny.
#[derive(Debug, Clone)]
pub struct CapabilityTable {
    rules: HashMap<(Role, ResourceType, Operation), Rule>,
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::hospital()
    }
}

impl CapabilityTable {
    /// The hospital capability matrix
    pub fn hospital() -> Self {
        let mut rules = HashMap::new();
        for role in Role::ALL {
            for resource in ResourceType::ALL {
                for operation in Operation::ALL {
                    rules.insert(
                        (role, resource, operation),
                        hospital_rule(role, resource, operation),
                    );
                }
            }
        }
        Self { rules }
    }

    /// Build a table from explicit rules. Every triple must be present.
    pub fn from_rules<I>(rules: I) -> RbacResult<Self>
    where
        I: IntoIterator<Item = ((Role, ResourceType, Operation), Rule)>,
    {
        let table = Self {
            rules: rules.into_iter().collect(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Check the table is total and owner rules only target doctor-assigned records
    pub fn validate(&self) -> RbacResult<()> {
        for role in Role::ALL {
            for resource in ResourceType::ALL {
                for operation in Operation::ALL {
                    let rule = self.rules.get(&(role, resource, operation)).ok_or(
                        RbacError::MissingRule {
                            role,
                            resource,
                            operation,
                        },
                    )?;

                    if rule.effect == Effect::AllowIfOwner
                        && !supports_ownership(resource, operation)
                    {
                        return Err(RbacError::UnsupportedOwnerRule {
                            role,
                            resource,
                            operation,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn rule(&self, role: Role, resource: ResourceType, operation: Operation) -> Rule {
        self.rules
            .get(&(role, resource, operation))
            .copied()
            .unwrap_or(Rule::deny())
    }

    pub fn effect(&self, role: Role, resource: ResourceType, operation: Operation) -> Effect {
        self.rule(role, resource, operation).effect
    }
}

fn supports_ownership(resource: ResourceType, operation: Operation) -> bool {
    match resource {
        ResourceType::Appointment => operation != Operation::Create,
        ResourceType::Prescription => true,
        _ => false,
    }
}

fn hospital_rule(role: Role, resource: ResourceType, operation: Operation) -> Rule {
    use Operation::{Delete, Read, ReadList, Update};

    let is_read = matches!(operation, Read | ReadList);

    match (resource, role) {
        (_, Role::Admin) => Rule::allow(),

        (ResourceType::User, _) => Rule::deny(),

        (ResourceType::Patient | ResourceType::Billing, Role::Receptionist)
        | (ResourceType::Appointment, Role::Receptionist) => match operation {
            Delete => Rule::deny(),
            _ => Rule::allow(),
        },

        (ResourceType::Patient | ResourceType::Billing | ResourceType::Doctor, Role::Doctor)
        | (ResourceType::Doctor | ResourceType::Prescription, Role::Receptionist) => {
            if is_read {
                Rule::allow()
            } else {
                Rule::deny()
            }
        }

        (ResourceType::Appointment, Role::Doctor) => match operation {
            Read | ReadList => Rule::owner(),
            Update => Rule::owner().with_fields(DOCTOR_APPOINTMENT_FIELDS),
            _ => Rule::deny(),
        },

        (ResourceType::Prescription, Role::Doctor) => match operation {
            Delete => Rule::deny(),
            _ => Rule::owner(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hospital_table_is_valid() {
        assert!(CapabilityTable::hospital().validate().is_ok());
    }

    #[test]
    fn incomplete_table_is_rejected() {
        let result = CapabilityTable::from_rules([(
            (Role::Admin, ResourceType::Patient, Operation::Read),
            Rule::allow(),
        )]);
        assert!(matches!(result, Err(RbacError::MissingRule { .. })));
    }

    #[test]
    fn owner_rule_on_patient_is_rejected() {
        let mut rules: Vec<_> = CapabilityTable::hospital().rules.into_iter().collect();
        for (key, rule) in &mut rules {
            if *key == (Role::Doctor, ResourceType::Patient, Operation::Read) {
                *rule = Rule::owner();
            }
        }
        let result = CapabilityTable::from_rules(rules);
        assert!(matches!(
            result,
            Err(RbacError::UnsupportedOwnerRule {
                resource: ResourceType::Patient,
                ..
            })
        ));
    }

    #[test]
    fn doctor_appointment_update_is_status_only() {
        let rule = CapabilityTable::hospital().rule(
            Role::Doctor,
            ResourceType::Appointment,
            Operation::Update,
        );
        assert_eq!(rule.effect, Effect::AllowIfOwner);
        assert!(rule.fields.permits("status"));
        assert!(!rule.fields.permits("date"));
    }
}
