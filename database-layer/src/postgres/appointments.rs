use async_trait::async_trait;
use auth_rbac::RecordId;

use super::PgStore;
use crate::{
    error::DatabaseResult,
    models::{Appointment, AppointmentChanges, ListQuery, NewAppointment},
    repository::Repository,
};

#[async_trait]
impl Repository<Appointment> for PgStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Appointment>> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, patient_id, doctor_id, date, time, status, reason, notes, created_at
            FROM appointments
            WHERE ($1::BIGINT IS NULL OR doctor_id = $1)
            ORDER BY date, time, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.doctor_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Appointment>> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, patient_id, doctor_id, date, time, status, reason, notes, created_at
            FROM appointments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn create(&self, new: NewAppointment) -> DatabaseResult<Appointment> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (patient_id, doctor_id, date, time, reason, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, patient_id, doctor_id, date, time, status, reason, notes, created_at
            "#,
        )
        .bind(new.patient_id)
        .bind(new.doctor_id)
        .bind(new.date)
        .bind(&new.time)
        .bind(&new.reason)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn update(
        &self,
        id: RecordId,
        changes: AppointmentChanges,
    ) -> DatabaseResult<Option<Appointment>> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments SET
                date = COALESCE($2, date),
                time = COALESCE($3, time),
                status = COALESCE($4, status),
                reason = COALESCE($5, reason),
                notes = COALESCE($6, notes)
            WHERE id = $1
            RETURNING id, patient_id, doctor_id, date, time, status, reason, notes, created_at
            "#,
        )
        .bind(id)
        .bind(changes.date)
        .bind(&changes.time)
        .bind(changes.status)
        .bind(&changes.reason)
        .bind(&changes.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
