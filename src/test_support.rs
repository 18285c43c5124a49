// src/test_support.rs
//
// Fixtures compartilhadas pelos testes de banco (#[sqlx::test] cria um
// banco novo por teste e aplica as migrações de ./migrations).

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::AppState;
use crate::db::{CrmRepository, InventoryRepository, SiteRepository, UserRepository};
use crate::middleware::site::SiteScope;
use crate::models::crm::{Customer, Vehicle};
use crate::models::inventory::{Inventory, Product, ProductCategory, UnitOfMeasure};
use crate::models::site::Site;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// O cenário padrão da oficina: duas filiais, um superuser, um usuário da
// filial A, cliente com veículo e um produto com estoque 10 na filial A.
pub struct WorkshopFixture {
    pub state: AppState,
    pub superuser: SiteScope,
    pub site_a_user: SiteScope,
    pub hq_user: SiteScope,
    pub site_a: Site,
    pub site_b: Site,
    pub customer: Customer,
    pub vehicle: Vehicle,
    pub product: Product,
    pub inventory: Inventory,
}

pub async fn setup_workshop(pool: &PgPool) -> WorkshopFixture {
    let state = AppState::with_pool(pool.clone(), "segredo-de-teste".to_string());

    let user_repo = UserRepository::new(pool.clone());
    let site_repo = SiteRepository::new(pool.clone());
    let crm_repo = CrmRepository::new(pool.clone());
    let inventory_repo = InventoryRepository::new(pool.clone());

    let site_a = site_repo
        .create_site(pool, "Oficina Accra Central", "12 Ring Road, Accra", "+233201234567")
        .await
        .unwrap();
    let site_b = site_repo
        .create_site(pool, "Oficina Kumasi", "45 Harper Road, Kumasi", "+233312345678")
        .await
        .unwrap();

    // O hash não importa nos testes que não fazem login.
    let admin = user_repo
        .create_user(pool, "admin@oficina.com", "hash", "Admin", None)
        .await
        .unwrap();
    sqlx::query("UPDATE users SET is_superuser = true WHERE id = $1")
        .bind(admin.id)
        .execute(pool)
        .await
        .unwrap();

    let site_user = user_repo
        .create_user(pool, "gerente.a@oficina.com", "hash", "Gerente A", Some(site_a.id))
        .await
        .unwrap();

    let hq = user_repo
        .create_user(pool, "ceo@oficina.com", "hash", "CEO", None)
        .await
        .unwrap();

    let customer = crm_repo
        .create_customer(pool, "Ama", "Owusu", Some("ama@example.com"), "+233244112233", true)
        .await
        .unwrap();

    let vehicle = crm_repo
        .create_vehicle(pool, customer.id, site_a.id, "Toyota", "Corolla", 2019, "GR-1234-20")
        .await
        .unwrap();

    let product = inventory_repo
        .create_product(
            pool,
            "Pastilha de freio dianteira",
            Some("BRK-PAD-044"),
            ProductCategory::SparePart,
            "",
            "Bosch",
            "0986AB1234",
            dec("150.00"),
            Some(dec("95.00")),
            UnitOfMeasure::Each,
        )
        .await
        .unwrap();

    let inventory = inventory_repo
        .create_inventory(pool, product.id, site_a.id, 2, 20, "A3-12")
        .await
        .unwrap();
    let inventory = inventory_repo
        .apply_on_hand_delta(pool, inventory.id, 10, true)
        .await
        .unwrap();

    WorkshopFixture {
        superuser: SiteScope {
            user_id: admin.id,
            is_superuser: true,
            site_id: None,
        },
        site_a_user: SiteScope {
            user_id: site_user.id,
            is_superuser: false,
            site_id: Some(site_a.id),
        },
        hq_user: SiteScope {
            user_id: hq.id,
            is_superuser: false,
            site_id: None,
        },
        state,
        site_a,
        site_b,
        customer,
        vehicle,
        product,
        inventory,
    }
}

/// Produto extra com estoque próprio na filial indicada.
pub async fn seed_product_with_stock(
    pool: &PgPool,
    site_id: Uuid,
    name: &str,
    unit_price: &str,
    on_hand: i32,
) -> (Product, Inventory) {
    let inventory_repo = InventoryRepository::new(pool.clone());

    let product = inventory_repo
        .create_product(
            pool,
            name,
            None,
            ProductCategory::SparePart,
            "",
            "",
            "",
            dec(unit_price),
            None,
            UnitOfMeasure::Each,
        )
        .await
        .unwrap();

    let inventory = inventory_repo
        .create_inventory(pool, product.id, site_id, 0, 0, "")
        .await
        .unwrap();
    let inventory = if on_hand > 0 {
        inventory_repo
            .apply_on_hand_delta(pool, inventory.id, on_hand, true)
            .await
            .unwrap()
    } else {
        inventory
    };

    (product, inventory)
}
