pub mod pagination;
pub mod related;

pub use pagination::PaginationParams;
pub use related::{DoctorSummary, PatientSummary, Related, WithRelated};
