// src/db/appointment_repo.rs

use chrono::{NaiveDate, NaiveTime};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::appointments::{Appointment, AppointmentStatus},
};

#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        display_number: &str,
        customer_id: Uuid,
        vehicle_id: Uuid,
        site_id: Uuid,
        mechanic_id: Option<Uuid>,
        scheduled_date: NaiveDate,
        scheduled_time: NaiveTime,
        duration_minutes: i32,
        notes: &str,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (
                display_number, customer_id, vehicle_id, site_id, mechanic_id,
                scheduled_date, scheduled_time, duration_minutes, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(display_number)
        .bind(customer_id)
        .bind(vehicle_id)
        .bind(site_id)
        .bind(mechanic_id)
        .bind(scheduled_date)
        .bind(scheduled_time)
        .bind(duration_minutes)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(appointment)
    }

    pub async fn list(&self, scope_site: Option<Uuid>) -> Result<Vec<Appointment>, AppError> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE ($1::uuid IS NULL OR site_id = $1)
            ORDER BY scheduled_date ASC, scheduled_time ASC
            "#,
        )
        .bind(scope_site)
        .fetch_all(&self.pool)
        .await?;
        Ok(appointments)
    }

    pub async fn find_scoped<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        scope_site: Option<Uuid>,
    ) -> Result<Option<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE id = $1 AND ($2::uuid IS NULL OR site_id = $2)
            "#,
        )
        .bind(id)
        .bind(scope_site)
        .fetch_optional(executor)
        .await?;
        Ok(appointment)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(appointment)
    }

    /// Vincula a OS criada a partir deste agendamento.
    pub async fn link_service_request<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        service_request_id: Uuid,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET service_request_id = $2, status = 'IN_PROGRESS', updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(service_request_id)
        .fetch_one(executor)
        .await?;
        Ok(appointment)
    }
}
