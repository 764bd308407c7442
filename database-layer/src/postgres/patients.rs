use async_trait::async_trait;
use auth_rbac::RecordId;

use super::PgStore;
use crate::{
    error::DatabaseResult,
    models::{ListQuery, NewPatient, Patient, PatientChanges},
    repository::Repository,
};

#[async_trait]
impl Repository<Patient> for PgStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Patient>> {
        let patients = sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, name, email, phone, address, date_of_birth, gender, blood_group,
                   emergency_contact, medical_history, created_at
            FROM patients
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(patients)
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, name, email, phone, address, date_of_birth, gender, blood_group,
                   emergency_contact, medical_history, created_at
            FROM patients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(patient)
    }

    async fn create(&self, new: NewPatient) -> DatabaseResult<Patient> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (name, email, phone, address, date_of_birth, gender, blood_group,
                                  emergency_contact, medical_history)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, email, phone, address, date_of_birth, gender, blood_group,
                      emergency_contact, medical_history, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(new.date_of_birth)
        .bind(&new.gender)
        .bind(&new.blood_group)
        .bind(&new.emergency_contact)
        .bind(&new.medical_history)
        .fetch_one(&self.pool)
        .await?;

        Ok(patient)
    }

    async fn update(&self, id: RecordId, changes: PatientChanges) -> DatabaseResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                date_of_birth = COALESCE($6, date_of_birth),
                gender = COALESCE($7, gender),
                blood_group = COALESCE($8, blood_group),
                emergency_contact = COALESCE($9, emergency_contact),
                medical_history = COALESCE($10, medical_history)
            WHERE id = $1
            RETURNING id, name, email, phone, address, date_of_birth, gender, blood_group,
                      emergency_contact, medical_history, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(&changes.address)
        .bind(changes.date_of_birth)
        .bind(&changes.gender)
        .bind(&changes.blood_group)
        .bind(&changes.emergency_contact)
        .bind(&changes.medical_history)
        .fetch_optional(&self.pool)
        .await?;

        Ok(patient)
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
