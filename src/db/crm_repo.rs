// src/db/crm_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{Customer, Vehicle},
};

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Clientes
    // ---
    // Clientes são globais (um cliente pode ser atendido em qualquer filial).
    // Leituras de listagem são simples e usam a pool principal; buscas que
    // participam de transação recebem o executor do chamador.

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers ORDER BY first_name ASC, last_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn find_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
        phone_number: &str,
        receive_service_reminders: bool,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (first_name, last_name, email, phone_number, receive_service_reminders)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(phone_number)
        .bind(receive_service_reminders)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    // ---
    // Veículos
    // ---
    // Veículos pertencem à filial onde foram cadastrados.

    pub async fn list_vehicles(&self, scope_site: Option<Uuid>) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::uuid IS NULL OR site_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope_site)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    pub async fn find_vehicle<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        scope_site: Option<Uuid>,
    ) -> Result<Option<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE id = $1 AND ($2::uuid IS NULL OR site_id = $2)
            "#,
        )
        .bind(id)
        .bind(scope_site)
        .fetch_optional(executor)
        .await?;
        Ok(vehicle)
    }

    pub async fn create_vehicle<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        site_id: Uuid,
        make: &str,
        model: &str,
        year: i32,
        license_plate: &str,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (customer_id, site_id, make, model, year, license_plate)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(site_id)
        .bind(make)
        .bind(model)
        .bind(year)
        .bind(license_plate)
        .fetch_one(executor)
        .await?;
        Ok(vehicle)
    }

    /// Carimba a data da última revisão do veículo (usada pelo colaborador
    /// externo de lembretes de serviço).
    pub async fn stamp_last_serviced<'e, E>(
        &self,
        executor: E,
        vehicle_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE vehicles SET last_serviced = CURRENT_DATE WHERE id = $1")
            .bind(vehicle_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
