// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        Inventory, InventoryTransaction, Product, ProductCategory, TransactionKind, UnitOfMeasure,
    },
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Catálogo de Produtos
    // ---
    // Listagens usam a pool principal; o resto roda no executor do chamador
    // para poder participar das transações de conclusão.

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        name: &str,
        sku: Option<&str>,
        category: ProductCategory,
        description: &str,
        brand: &str,
        part_number: &str,
        unit_price: Decimal,
        cost_price: Option<Decimal>,
        unit_of_measure: UnitOfMeasure,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, sku, category, description, brand, part_number,
                unit_price, cost_price, unit_of_measure
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(sku)
        .bind(category)
        .bind(description)
        .bind(brand)
        .bind(part_number)
        .bind(unit_price)
        .bind(cost_price)
        .bind(unit_of_measure)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::SkuAlreadyExists;
                }
            }
            e.into()
        })
    }

    // ---
    // Saldos de Estoque
    // ---

    pub async fn list_inventories(
        &self,
        scope_site: Option<Uuid>,
    ) -> Result<Vec<Inventory>, AppError> {
        let inventories = sqlx::query_as::<_, Inventory>(
            r#"
            SELECT * FROM inventories
            WHERE ($1::uuid IS NULL OR site_id = $1)
            ORDER BY updated_at DESC
            "#,
        )
        .bind(scope_site)
        .fetch_all(&self.pool)
        .await?;
        Ok(inventories)
    }

    pub async fn find_inventory<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        scope_site: Option<Uuid>,
    ) -> Result<Option<Inventory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let inventory = sqlx::query_as::<_, Inventory>(
            r#"
            SELECT * FROM inventories
            WHERE id = $1 AND ($2::uuid IS NULL OR site_id = $2)
            "#,
        )
        .bind(id)
        .bind(scope_site)
        .fetch_optional(executor)
        .await?;
        Ok(inventory)
    }

    pub async fn create_inventory<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        site_id: Uuid,
        reorder_level: i32,
        reorder_quantity: i32,
        bin_location: &str,
    ) -> Result<Inventory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Inventory>(
            r#"
            INSERT INTO inventories (product_id, site_id, reorder_level, reorder_quantity, bin_location)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(site_id)
        .bind(reorder_level)
        .bind(reorder_quantity)
        .bind(bin_location)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::InventoryAlreadyExists;
                }
            }
            e.into()
        })
    }

    /// Busca o saldo de (produto, filial) COM LOCK DE LINHA (FOR UPDATE).
    ///
    /// É o ponto de serialização do livro-razão: quem chega segundo espera o
    /// primeiro terminar, então o débito nunca lê um saldo obsoleto. Só faz
    /// sentido dentro de uma transação do chamador.
    pub async fn get_for_update<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        site_id: Uuid,
    ) -> Result<Option<Inventory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let inventory = sqlx::query_as::<_, Inventory>(
            r#"
            SELECT * FROM inventories
            WHERE product_id = $1 AND site_id = $2
            FOR UPDATE
            "#,
        )
        .bind(product_id)
        .bind(site_id)
        .fetch_optional(executor)
        .await?;
        Ok(inventory)
    }

    /// Aplica um delta no saldo físico. O CHECK (quantity_on_hand >= 0) do
    /// banco é a última linha de defesa; a validação de negócio acontece no
    /// service, sob o lock de get_for_update.
    pub async fn apply_on_hand_delta<'e, E>(
        &self,
        executor: E,
        inventory_id: Uuid,
        delta: i32,
        stamp_restocked: bool,
    ) -> Result<Inventory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let inventory = sqlx::query_as::<_, Inventory>(
            r#"
            UPDATE inventories
            SET quantity_on_hand = quantity_on_hand + $2,
                last_restocked_at = CASE WHEN $3 THEN now() ELSE last_restocked_at END,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(inventory_id)
        .bind(delta)
        .bind(stamp_restocked)
        .fetch_one(executor)
        .await?;
        Ok(inventory)
    }

    /// Registra uma movimentação no livro-razão (auditoria imutável).
    #[allow(clippy::too_many_arguments)]
    pub async fn record_transaction<'e, E>(
        &self,
        executor: E,
        inventory_id: Uuid,
        kind: TransactionKind,
        quantity: i32,
        reference_type: &str,
        reference_id: Option<Uuid>,
        notes: &str,
        created_by: Option<Uuid>,
    ) -> Result<InventoryTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            INSERT INTO inventory_transactions (
                inventory_id, kind, quantity, reference_type, reference_id, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(inventory_id)
        .bind(kind)
        .bind(quantity)
        .bind(reference_type)
        .bind(reference_id)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }

    pub async fn list_transactions(
        &self,
        inventory_id: Uuid,
    ) -> Result<Vec<InventoryTransaction>, AppError> {
        let movements = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT * FROM inventory_transactions
            WHERE inventory_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(inventory_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movements)
    }
}
