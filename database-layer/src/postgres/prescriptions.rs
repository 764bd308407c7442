use async_trait::async_trait;
use auth_rbac::RecordId;

use super::PgStore;
use crate::{
    error::DatabaseResult,
    models::{ListQuery, NewPrescription, Prescription, PrescriptionChanges},
    repository::Repository,
};

#[async_trait]
impl Repository<Prescription> for PgStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Prescription>> {
        let prescriptions = sqlx::query_as::<_, Prescription>(
            r#"
            SELECT id, patient_id, doctor_id, appointment_id, diagnosis, medications, frequency,
                   notes, created_at
            FROM prescriptions
            WHERE ($1::BIGINT IS NULL OR doctor_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.doctor_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(prescriptions)
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Prescription>> {
        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            SELECT id, patient_id, doctor_id, appointment_id, diagnosis, medications, frequency,
                   notes, created_at
            FROM prescriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(prescription)
    }

    async fn create(&self, new: NewPrescription) -> DatabaseResult<Prescription> {
        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            INSERT INTO prescriptions (patient_id, doctor_id, appointment_id, diagnosis,
                                       medications, frequency, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, patient_id, doctor_id, appointment_id, diagnosis, medications, frequency,
                      notes, created_at
            "#,
        )
        .bind(new.patient_id)
        .bind(new.doctor_id)
        .bind(new.appointment_id)
        .bind(&new.diagnosis)
        .bind(&new.medications)
        .bind(&new.frequency)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(prescription)
    }

    async fn update(
        &self,
        id: RecordId,
        changes: PrescriptionChanges,
    ) -> DatabaseResult<Option<Prescription>> {
        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            UPDATE prescriptions SET
                diagnosis = COALESCE($2, diagnosis),
                medications = COALESCE($3, medications),
                frequency = COALESCE($4, frequency),
                notes = COALESCE($5, notes)
            WHERE id = $1
            RETURNING id, patient_id, doctor_id, appointment_id, diagnosis, medications, frequency,
                      notes, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.diagnosis)
        .bind(&changes.medications)
        .bind(&changes.frequency)
        .bind(&changes.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(prescription)
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM prescriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
