use async_trait::async_trait;
use auth_rbac::RecordId;

use super::PgStore;
use crate::{
    error::DatabaseResult,
    models::{Billing, BillingChanges, ListQuery, NewBilling},
    repository::Repository,
};

#[async_trait]
impl Repository<Billing> for PgStore {
    async fn list(&self, query: &ListQuery) -> DatabaseResult<Vec<Billing>> {
        let bills = sqlx::query_as::<_, Billing>(
            r#"
            SELECT id, patient_id, amount, payment_status, description, date, created_at
            FROM billing
            ORDER BY date DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    async fn find_by_id(&self, id: RecordId) -> DatabaseResult<Option<Billing>> {
        let bill = sqlx::query_as::<_, Billing>(
            r#"
            SELECT id, patient_id, amount, payment_status, description, date, created_at
            FROM billing
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }

    async fn create(&self, new: NewBilling) -> DatabaseResult<Billing> {
        let bill = sqlx::query_as::<_, Billing>(
            r#"
            INSERT INTO billing (patient_id, amount, payment_status, description, date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, patient_id, amount, payment_status, description, date, created_at
            "#,
        )
        .bind(new.patient_id)
        .bind(new.amount)
        .bind(new.payment_status)
        .bind(&new.description)
        .bind(new.date)
        .fetch_one(&self.pool)
        .await?;

        Ok(bill)
    }

    async fn update(&self, id: RecordId, changes: BillingChanges) -> DatabaseResult<Option<Billing>> {
        let bill = sqlx::query_as::<_, Billing>(
            r#"
            UPDATE billing SET
                amount = COALESCE($2, amount),
                payment_status = COALESCE($3, payment_status),
                description = COALESCE($4, description),
                date = COALESCE($5, date)
            WHERE id = $1
            RETURNING id, patient_id, amount, payment_status, description, date, created_at
            "#,
        )
        .bind(id)
        .bind(changes.amount)
        .bind(changes.payment_status)
        .bind(&changes.description)
        .bind(changes.date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }

    async fn delete(&self, id: RecordId) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM billing WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
