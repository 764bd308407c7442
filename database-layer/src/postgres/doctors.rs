use async_trait::async_trait;
use auth_rbac::RecordId;

use super::PgStore;
use crate::{
    error::DatabaseResult,
    models::{Doctor, DoctorChanges, ListQuery, NewDoctor},
    repository::{DoctorRepository, Repository},
};

#[async_trait]
impl Repository<Doctor> for PgStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Doctor>> {
        let doctors = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT id, user_id, name, email, specialty, phone, experience, qualification, created_at
            FROM doctors
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(doctors)
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Doctor>> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT id, user_id, name, email, specialty, phone, experience, qualification, created_at
            FROM doctors
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }

    async fn create(&self, new: NewDoctor) -> DatabaseResult<Doctor> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            INSERT INTO doctors (user_id, name, email, specialty, phone, experience, qualification)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, name, email, specialty, phone, experience, qualification, created_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.specialty)
        .bind(&new.phone)
        .bind(new.experience)
        .bind(&new.qualification)
        .fetch_one(&self.pool)
        .await?;

        Ok(doctor)
    }

    async fn update(&self, id: RecordId, changes: DoctorChanges) -> DatabaseResult<Option<Doctor>> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            UPDATE doctors SET
                user_id = COALESCE($2, user_id),
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                specialty = COALESCE($5, specialty),
                phone = COALESCE($6, phone),
                experience = COALESCE($7, experience),
                qualification = COALESCE($8, qualification)
            WHERE id = $1
            RETURNING id, user_id, name, email, specialty, phone, experience, qualification, created_at
            "#,
        )
        .bind(id)
        .bind(changes.user_id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.specialty)
        .bind(&changes.phone)
        .bind(changes.experience)
        .bind(&changes.qualification)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM doctors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DoctorRepository for PgStore {
    async fn find_by_user_id(&self, user_id: RecordId) -> DatabaseResult<Option<Doctor>> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT id, user_id, name, email, specialty, phone, experience, qualification, created_at
            FROM doctors
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Doctor>> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT id, user_id, name, email, specialty, phone, experience, qualification, created_at
            FROM doctors
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }
}
