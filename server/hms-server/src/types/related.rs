use auth_rbac::RecordId;
use database_layer::{Appointment, Billing, Doctor, Patient, Prescription};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: RecordId,
    pub name: String,
    pub phone: String,
}

impl From<Patient> for PatientSummary {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            phone: patient.phone,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub id: RecordId,
    pub name: String,
    pub specialty: String,
}

impl From<Doctor> for DoctorSummary {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name,
            specialty: doctor.specialty,
        }
    }
}

/// Records that point at a patient and, for some, a doctor
pub trait Related {
    fn patient_id(&self) -> RecordId;

    fn doctor_id(&self) -> Option<RecordId> {
        None
    }
}

impl Related for Appointment {
    fn patient_id(&self) -> RecordId {
        self.patient_id
    }

    fn doctor_id(&self) -> Option<RecordId> {
        Some(self.doctor_id)
    }
}

impl Related for Prescription {
    fn patient_id(&self) -> RecordId {
        self.patient_id
    }

    fn doctor_id(&self) -> Option<RecordId> {
        Some(self.doctor_id)
    }
}

impl Related for Billing {
    fn patient_id(&self) -> RecordId {
        self.patient_id
    }
}

/// A record read with summaries of the rows it references
///
/// `patient` is null when the referenced row has gone. Billing has no doctor,
/// so `doctor` is left out of its body.
#[derive(Debug, Clone, Serialize)]
pub struct WithRelated<T> {
    #[serde(flatten)]
    pub record: T,
    pub patient: Option<PatientSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorSummary>,
}
