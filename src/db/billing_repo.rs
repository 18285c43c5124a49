// src/db/billing_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::billing::{Invoice, InvoiceListEntry, PaymentMethod, Promotion},
};

#[derive(Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Faturas
    // ---

    /// Insere a fatura da conclusão. O índice único em service_request_id é a
    /// garantia final de "uma fatura por OS": se dois fluxos chegarem aqui
    /// para a mesma OS, o segundo falha e a transação dele aborta.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_invoice<'e, E>(
        &self,
        executor: E,
        display_number: &str,
        service_request_id: Uuid,
        subtotal: Decimal,
        discount_amount: Decimal,
        total_cost: Decimal,
        promotion_id: Option<Uuid>,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                display_number, service_request_id, subtotal, discount_amount,
                total_cost, promotion_id
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(display_number)
        .bind(service_request_id)
        .bind(subtotal)
        .bind(discount_amount)
        .bind(total_cost)
        .bind(promotion_id)
        .fetch_one(executor)
        .await?;
        Ok(invoice)
    }

    /// Busca uma fatura visível ao escopo (a filial vem da OS de origem).
    pub async fn find_invoice_scoped<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        scope_site: Option<Uuid>,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT i.* FROM invoices i
            JOIN service_requests sr ON sr.id = i.service_request_id
            WHERE i.id = $1 AND ($2::uuid IS NULL OR sr.site_id = $2)
            "#,
        )
        .bind(id)
        .bind(scope_site)
        .fetch_optional(executor)
        .await?;
        Ok(invoice)
    }

    /// Listagem com os campos de exibição (cliente, veículo, filial) já
    /// resolvidos em um único JOIN. Leitura simples: usa a pool principal.
    pub async fn list_invoices_scoped(
        &self,
        scope_site: Option<Uuid>,
    ) -> Result<Vec<InvoiceListEntry>, AppError> {
        let entries = sqlx::query_as::<_, InvoiceListEntry>(
            r#"
            SELECT
                i.id,
                i.display_number,
                i.service_request_id,
                sr.display_number AS service_request_display,
                i.subtotal,
                i.discount_amount,
                i.total_cost,
                i.paid,
                i.payment_method,
                c.first_name || ' ' || c.last_name AS customer_name,
                CASE WHEN v.id IS NULL THEN NULL
                     ELSE v.make || ' ' || v.model || ' (' || v.license_plate || ')'
                END AS vehicle_display,
                s.name AS site_name,
                i.created_at
            FROM invoices i
            JOIN service_requests sr ON sr.id = i.service_request_id
            JOIN customers c ON c.id = sr.customer_id
            JOIN sites s ON s.id = sr.site_id
            LEFT JOIN vehicles v ON v.id = sr.vehicle_id
            WHERE ($1::uuid IS NULL OR sr.site_id = $1)
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(scope_site)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Registra (ou desfaz) o pagamento.
    pub async fn set_paid<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        paid: bool,
        payment_method: Option<PaymentMethod>,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET paid = $2, payment_method = $3, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(paid)
        .bind(payment_method)
        .fetch_one(executor)
        .await?;
        Ok(invoice)
    }

    // ---
    // Promoções
    // ---

    pub async fn list_promotions(&self) -> Result<Vec<Promotion>, AppError> {
        let promotions =
            sqlx::query_as::<_, Promotion>("SELECT * FROM promotions ORDER BY start_date DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(promotions)
    }

    pub async fn find_promotion<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Promotion>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let promotion = sqlx::query_as::<_, Promotion>("SELECT * FROM promotions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(promotion)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_promotion<'e, E>(
        &self,
        executor: E,
        title: &str,
        description: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        discount_percent: Option<Decimal>,
        discount_amount: Option<Decimal>,
    ) -> Result<Promotion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let promotion = sqlx::query_as::<_, Promotion>(
            r#"
            INSERT INTO promotions (
                title, description, start_date, end_date, discount_percent, discount_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(start_date)
        .bind(end_date)
        .bind(discount_percent)
        .bind(discount_amount)
        .fetch_one(executor)
        .await?;
        Ok(promotion)
    }
}
