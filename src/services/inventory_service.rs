// src/services/inventory_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::InventoryRepository,
    middleware::site::SiteScope,
    models::inventory::{
        Inventory, InventoryTransaction, Product, ProductCategory, TransactionKind, UnitOfMeasure,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository) -> Self {
        Self { inventory_repo }
    }

    // ---
    // Catálogo
    // ---

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.inventory_repo.list_products().await
    }

    pub async fn get_product<'e, E>(&self, executor: E, id: Uuid) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .find_product(executor, id)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
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
        // Catálogo é global: exige alguma permissão de escrita.
        if !scope.can_write() {
            return Err(AppError::SiteWriteForbidden);
        }
        self.inventory_repo
            .create_product(
                executor,
                name,
                sku,
                category,
                description,
                brand,
                part_number,
                unit_price,
                cost_price,
                unit_of_measure,
            )
            .await
    }

    // ---
    // Saldos
    // ---

    pub async fn list_inventories(&self, scope: &SiteScope) -> Result<Vec<Inventory>, AppError> {
        self.inventory_repo
            .list_inventories(scope.visible_site())
            .await
    }

    pub async fn get_inventory<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
    ) -> Result<Inventory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .find_inventory(executor, id, scope.visible_site())
            .await?
            .ok_or(AppError::InventoryNotFound)
    }

    pub async fn create_inventory<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        product_id: Uuid,
        site_id: Uuid,
        reorder_level: i32,
        reorder_quantity: i32,
        bin_location: &str,
    ) -> Result<Inventory, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if !scope.can_write_site(site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        let mut tx = executor.begin().await?;

        self.inventory_repo
            .find_product(&mut *tx, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let inventory = self
            .inventory_repo
            .create_inventory(
                &mut *tx,
                product_id,
                site_id,
                reorder_level,
                reorder_quantity,
                bin_location,
            )
            .await?;

        tx.commit().await?;
        Ok(inventory)
    }

    pub async fn list_transactions<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        inventory_id: Uuid,
    ) -> Result<Vec<InventoryTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Visibilidade primeiro: registro de outra filial é como se não existisse.
        self.inventory_repo
            .find_inventory(executor, inventory_id, scope.visible_site())
            .await?
            .ok_or(AppError::InventoryNotFound)?;

        self.inventory_repo.list_transactions(inventory_id).await
    }

    // --- DÉBITO (o coração do livro-razão) ---
    //
    // Confere disponibilidade e baixa o saldo de forma atômica, sob lock da
    // linha (SELECT ... FOR UPDATE): dois débitos concorrentes no mesmo
    // (produto, filial) serializam aqui e o segundo nunca lê saldo obsoleto.
    //
    // Chamado dentro da transação do orquestrador de conclusão: o `begin`
    // abaixo vira um savepoint e a falha de UMA linha derruba o conjunto todo.
    #[allow(clippy::too_many_arguments)]
    pub async fn debit<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        site_id: Uuid,
        quantity: i32,
        product_name: &str,
        site_name: &str,
        reference_type: &str,
        reference_id: Option<Uuid>,
        actor: Option<Uuid>,
        notes: &str,
    ) -> Result<InventoryTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Lock da linha de saldo
        let inventory = self
            .inventory_repo
            .get_for_update(&mut *tx, product_id, site_id)
            .await?
            .ok_or_else(|| AppError::NoStockRecord {
                product: product_name.to_string(),
                site: site_name.to_string(),
            })?;

        // 2. Disponibilidade (ainda sob o lock)
        if inventory.quantity_on_hand < quantity {
            return Err(AppError::InsufficientStock {
                product: product_name.to_string(),
                have: inventory.quantity_on_hand,
                need: quantity,
            });
        }

        // 3. Baixa do saldo
        self.inventory_repo
            .apply_on_hand_delta(&mut *tx, inventory.id, -quantity, false)
            .await?;

        // 4. Movimentação de saída no livro-razão
        let movement = self
            .inventory_repo
            .record_transaction(
                &mut *tx,
                inventory.id,
                TransactionKind::Out,
                -quantity,
                reference_type,
                reference_id,
                notes,
                actor,
            )
            .await?;

        tx.commit().await?;
        Ok(movement)
    }

    // --- ENTRADA (reposição / compra) ---
    pub async fn restock<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        inventory_id: Uuid,
        quantity: i32,
        notes: &str,
    ) -> Result<Inventory, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let inventory = self
            .inventory_repo
            .find_inventory(&mut *tx, inventory_id, scope.visible_site())
            .await?
            .ok_or(AppError::InventoryNotFound)?;

        if !scope.can_write_site(inventory.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        // O incremento é um UPDATE += atômico; o lock explícito só é
        // necessário no débito, que valida antes de escrever.
        let updated = self
            .inventory_repo
            .apply_on_hand_delta(&mut *tx, inventory.id, quantity, true)
            .await?;

        self.inventory_repo
            .record_transaction(
                &mut *tx,
                inventory.id,
                TransactionKind::In,
                quantity,
                "stock_entry",
                None,
                notes,
                Some(scope.user_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // --- AJUSTE MANUAL (correção de saldo, com sinal) ---
    pub async fn adjust<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        inventory_id: Uuid,
        delta: i32,
        notes: &str,
    ) -> Result<Inventory, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let inventory = self
            .inventory_repo
            .find_inventory(&mut *tx, inventory_id, scope.visible_site())
            .await?
            .ok_or(AppError::InventoryNotFound)?;

        if !scope.can_write_site(inventory.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        // Relê sob lock antes de validar: o saldo pode ter mudado entre as
        // duas queries.
        let locked = self
            .inventory_repo
            .get_for_update(&mut *tx, inventory.product_id, inventory.site_id)
            .await?
            .ok_or(AppError::InventoryNotFound)?;

        if locked.quantity_on_hand + delta < 0 {
            let product = self
                .inventory_repo
                .find_product(&mut *tx, locked.product_id)
                .await?
                .ok_or(AppError::ProductNotFound)?;
            return Err(AppError::InsufficientStock {
                product: product.name,
                have: locked.quantity_on_hand,
                need: -delta,
            });
        }

        let updated = self
            .inventory_repo
            .apply_on_hand_delta(&mut *tx, locked.id, delta, false)
            .await?;

        self.inventory_repo
            .record_transaction(
                &mut *tx,
                locked.id,
                TransactionKind::Adjust,
                delta,
                "manual_adjustment",
                None,
                notes,
                Some(scope.user_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    use crate::test_support::setup_workshop;

    #[sqlx::test]
    async fn debito_baixa_o_saldo_e_registra_saida(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let service = &f.state.inventory_service;

        let movement = service
            .debit(
                &pool,
                f.product.id,
                f.site_a.id,
                3,
                &f.product.name,
                &f.site_a.name,
                "product_usage",
                None,
                Some(f.superuser.user_id),
                "teste",
            )
            .await
            .unwrap();

        assert_eq!(movement.kind, TransactionKind::Out);
        assert_eq!(movement.quantity, -3);
        assert_eq!(movement.created_by, Some(f.superuser.user_id));

        let inventory = service
            .get_inventory(&pool, &f.superuser, f.inventory.id)
            .await
            .unwrap();
        assert_eq!(inventory.quantity_on_hand, 7);
    }

    #[sqlx::test]
    async fn debito_sem_saldo_preserva_o_registro(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let service = &f.state.inventory_service;

        let err = service
            .debit(
                &pool,
                f.product.id,
                f.site_a.id,
                99,
                &f.product.name,
                &f.site_a.name,
                "product_usage",
                None,
                None,
                "",
            )
            .await
            .unwrap_err();

        match err {
            AppError::InsufficientStock { have, need, .. } => {
                assert_eq!(have, 10);
                assert_eq!(need, 99);
            }
            other => panic!("erro inesperado: {:?}", other),
        }

        let inventory = service
            .get_inventory(&pool, &f.superuser, f.inventory.id)
            .await
            .unwrap();
        assert_eq!(inventory.quantity_on_hand, 10);
    }

    #[sqlx::test]
    async fn debito_em_filial_sem_registro_falha(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        let err = f
            .state
            .inventory_service
            .debit(
                &pool,
                f.product.id,
                f.site_b.id,
                1,
                &f.product.name,
                &f.site_b.name,
                "product_usage",
                None,
                None,
                "",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoStockRecord { .. }));
    }

    #[sqlx::test]
    async fn entrada_soma_e_carimba_reposicao(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        let updated = f
            .state
            .inventory_service
            .restock(&pool, &f.site_a_user, f.inventory.id, 15, "Compra NF 123")
            .await
            .unwrap();

        assert_eq!(updated.quantity_on_hand, 25);
        assert!(updated.last_restocked_at.is_some());
    }

    #[sqlx::test]
    async fn ajuste_nao_deixa_o_saldo_negativo(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        let err = f
            .state
            .inventory_service
            .adjust(&pool, &f.superuser, f.inventory.id, -11, "Contagem")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));

        let updated = f
            .state
            .inventory_service
            .adjust(&pool, &f.superuser, f.inventory.id, -4, "Contagem")
            .await
            .unwrap();
        assert_eq!(updated.quantity_on_hand, 6);
    }

    #[sqlx::test]
    async fn usuario_de_matriz_nao_repoe_estoque(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        let err = f
            .state
            .inventory_service
            .restock(&pool, &f.hq_user, f.inventory.id, 5, "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SiteWriteForbidden));
    }
}
