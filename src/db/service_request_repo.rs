// src/db/service_request_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::service_requests::{
        ProductUsage, ServiceRequest, ServiceStatus, ServiceType, TransactionType, UsageLine,
    },
};

#[derive(Clone)]
pub struct ServiceRequestRepository {
    pool: PgPool,
}

impl ServiceRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Tipos de serviço (catálogo de classificação)
    // ---

    pub async fn list_service_types(&self) -> Result<Vec<ServiceType>, AppError> {
        let types = sqlx::query_as::<_, ServiceType>(
            "SELECT * FROM service_types ORDER BY category ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    pub async fn find_service_type<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ServiceType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let st = sqlx::query_as::<_, ServiceType>("SELECT * FROM service_types WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(st)
    }

    pub async fn create_service_type<'e, E>(
        &self,
        executor: E,
        category: &str,
        name: &str,
    ) -> Result<ServiceType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let st = sqlx::query_as::<_, ServiceType>(
            r#"
            INSERT INTO service_types (category, name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(category)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(st)
    }

    // ---
    // Ordens de Serviço / Vendas
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        display_number: &str,
        transaction_type: TransactionType,
        customer_id: Uuid,
        vehicle_id: Option<Uuid>,
        site_id: Uuid,
        service_type_id: Option<Uuid>,
        description: &str,
        assigned_mechanic_id: Option<Uuid>,
        status: ServiceStatus,
        labor_cost: Decimal,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (
                display_number, transaction_type, customer_id, vehicle_id, site_id,
                service_type_id, description, assigned_mechanic_id, status, labor_cost
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(display_number)
        .bind(transaction_type)
        .bind(customer_id)
        .bind(vehicle_id)
        .bind(site_id)
        .bind(service_type_id)
        .bind(description)
        .bind(assigned_mechanic_id)
        .bind(status)
        .bind(labor_cost)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    /// Lista dentro do escopo de filial; `parts_only` mantém só as vendas
    /// balcão (sem veículo).
    pub async fn list(
        &self,
        scope_site: Option<Uuid>,
        parts_only: bool,
    ) -> Result<Vec<ServiceRequest>, AppError> {
        let records = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT * FROM service_requests
            WHERE ($1::uuid IS NULL OR site_id = $1)
              AND (NOT $2 OR vehicle_id IS NULL)
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope_site)
        .bind(parts_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn find_scoped<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        scope_site: Option<Uuid>,
    ) -> Result<Option<ServiceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT * FROM service_requests
            WHERE id = $1 AND ($2::uuid IS NULL OR site_id = $2)
            "#,
        )
        .bind(id)
        .bind(scope_site)
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    /// Variante com FOR UPDATE, usada pelo orquestrador de conclusão: duas
    /// conclusões concorrentes da mesma OS serializam aqui, e a segunda
    /// enxerga o status COMPLETED da primeira.
    pub async fn find_scoped_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        scope_site: Option<Uuid>,
    ) -> Result<Option<ServiceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT * FROM service_requests
            WHERE id = $1 AND ($2::uuid IS NULL OR site_id = $2)
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(scope_site)
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    /// Atualização dos campos mutáveis. O service já validou as regras
    /// (imutabilidade, discriminador venda/serviço, troca de filial).
    pub async fn update<'e, E>(
        &self,
        executor: E,
        record: &ServiceRequest,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET site_id = $2,
                service_type_id = $3,
                description = $4,
                assigned_mechanic_id = $5,
                status = $6,
                labor_cost = $7,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.site_id)
        .bind(record.service_type_id)
        .bind(record.description.as_str())
        .bind(record.assigned_mechanic_id)
        .bind(record.status)
        .bind(record.labor_cost)
        .fetch_one(executor)
        .await?;
        Ok(updated)
    }

    pub async fn set_labor_cost<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        labor_cost: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE service_requests SET labor_cost = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(labor_cost)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ServiceStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE service_requests SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM service_requests WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // Itens de produto (product usage)
    // ---

    pub async fn add_usage<'e, E>(
        &self,
        executor: E,
        service_request_id: Uuid,
        product_id: Uuid,
        quantity_used: i32,
    ) -> Result<ProductUsage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let usage = sqlx::query_as::<_, ProductUsage>(
            r#"
            INSERT INTO product_usages (service_request_id, product_id, quantity_used)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(service_request_id)
        .bind(product_id)
        .bind(quantity_used)
        .fetch_one(executor)
        .await?;
        Ok(usage)
    }

    pub async fn list_usages(
        &self,
        service_request_id: Uuid,
    ) -> Result<Vec<ProductUsage>, AppError> {
        let usages = sqlx::query_as::<_, ProductUsage>(
            r#"
            SELECT * FROM product_usages
            WHERE service_request_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(service_request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(usages)
    }

    /// Itens já resolvidos com nome e preço do catálogo, na ordem de criação.
    /// É o que o orquestrador de conclusão percorre para debitar o estoque e
    /// calcular o subtotal.
    pub async fn list_usage_lines<'e, E>(
        &self,
        executor: E,
        service_request_id: Uuid,
    ) -> Result<Vec<UsageLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, UsageLine>(
            r#"
            SELECT
                pu.id,
                pu.product_id,
                p.name AS product_name,
                p.unit_price,
                pu.quantity_used
            FROM product_usages pu
            JOIN products p ON p.id = pu.product_id
            WHERE pu.service_request_id = $1
            ORDER BY pu.created_at ASC
            "#,
        )
        .bind(service_request_id)
        .fetch_all(executor)
        .await?;
        Ok(lines)
    }
}
