use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RbacError;

/// Primary key type shared by every stored record.
pub type RecordId = i64;

// =============================================================================
// Callers
// =============================================================================

/// Role attached to every user account. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::Receptionist];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "receptionist" => Ok(Role::Receptionist),
            other => Err(RbacError::InvalidRole(other.to_string())),
        }
    }
}

/// Authenticated caller, built once per request from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User account id
    pub id: RecordId,
    pub email: String,
    pub role: Role,
    pub display_name: String,
}

impl Identity {
    pub fn new(
        id: RecordId,
        email: impl Into<String>,
        role: Role,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            role,
            display_name: display_name.into(),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    ReadList,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Read,
        Operation::ReadList,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::ReadList => "read_list",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Patient,
    Doctor,
    Appointment,
    Prescription,
    Billing,
    /// User accounts, managed through registration
    User,
}

impl ResourceType {
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Patient,
        ResourceType::Doctor,
        ResourceType::Appointment,
        ResourceType::Prescription,
        ResourceType::Billing,
        ResourceType::User,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Patient => "patient",
            ResourceType::Doctor => "doctor",
            ResourceType::Appointment => "appointment",
            ResourceType::Prescription => "prescription",
            ResourceType::Billing => "billing",
            ResourceType::User => "user",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The specific record an operation targets.
///
/// Appointment and prescription references carry the assigned doctor so the
/// ownership rule can be evaluated without another lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceRef {
    Patient { id: RecordId },
    Doctor { id: RecordId },
    Appointment { id: RecordId, doctor_id: RecordId },
    Prescription { id: RecordId, doctor_id: RecordId },
    Billing { id: RecordId },
    User { id: RecordId },
    /// A prescription that does not exist yet, as described by a create request
    PrescriptionDraft { doctor_id: Option<RecordId> },
}

impl ResourceRef {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceRef::Patient { .. } => ResourceType::Patient,
            ResourceRef::Doctor { .. } => ResourceType::Doctor,
            ResourceRef::Appointment { .. } => ResourceType::Appointment,
            ResourceRef::Prescription { .. } | ResourceRef::PrescriptionDraft { .. } => {
                ResourceType::Prescription
            }
            ResourceRef::Billing { .. } => ResourceType::Billing,
            ResourceRef::User { .. } => ResourceType::User,
        }
    }

    /// Doctor assigned to an existing record, if the resource has one.
    pub fn owner_doctor_id(&self) -> Option<RecordId> {
        match self {
            ResourceRef::Appointment { doctor_id, .. }
            | ResourceRef::Prescription { doctor_id, .. } => Some(*doctor_id),
            _ => None,
        }
    }
}

// =============================================================================
// Decisions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No identity was presented
    Unauthenticated,
    /// Identity present but lacking the capability or ownership
    Forbidden,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unauthenticated => f.write_str("Unauthorized"),
            DenyReason::Forbidden => f.write_str("Forbidden"),
        }
    }
}

/// Restriction a list query must apply: only rows assigned to `doctor_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowFilter {
    pub doctor_id: RecordId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Denied { reason: DenyReason },
    Allowed,
    AllowedWithFilter { filter: RowFilter },
    /// Create allowed for a doctor; the new record must be stamped with `doctor_id`
    AllowedAsOwner { doctor_id: RecordId },
}

impl Decision {
    pub const UNAUTHENTICATED: Decision = Decision::Denied {
        reason: DenyReason::Unauthenticated,
    };
    pub const FORBIDDEN: Decision = Decision::Denied {
        reason: DenyReason::Forbidden,
    };

    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Denied { .. })
    }

    /// Converts a denial into an error, passing allowed decisions through.
    pub fn into_result(self) -> Result<Decision, DenyReason> {
        match self {
            Decision::Denied { reason } => Err(reason),
            allowed => Ok(allowed),
        }
    }

    pub fn row_filter(&self) -> Option<RowFilter> {
        match self {
            Decision::AllowedWithFilter { filter } => Some(*filter),
            _ => None,
        }
    }
}

impl From<DenyReason> for Decision {
    fn from(reason: DenyReason) -> Self {
        Decision::Denied { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("Doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("nurse".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Receptionist).unwrap();
        assert_eq!(json, "\"receptionist\"");
    }

    #[test]
    fn draft_reference_maps_to_prescription() {
        let draft = ResourceRef::PrescriptionDraft { doctor_id: None };
        assert_eq!(draft.resource_type(), ResourceType::Prescription);
        assert_eq!(draft.owner_doctor_id(), None);

        let appointment = ResourceRef::Appointment { id: 1, doctor_id: 3 };
        assert_eq!(appointment.owner_doctor_id(), Some(3));
    }

    #[test]
    fn denied_decisions_convert_to_errors() {
        assert_eq!(Decision::FORBIDDEN.into_result(), Err(DenyReason::Forbidden));
        assert_eq!(Decision::Allowed.into_result(), Ok(Decision::Allowed));
        assert!(!Decision::UNAUTHENTICATED.is_allowed());
    }
}
