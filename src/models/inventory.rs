// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Catálogo de Produtos ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "product_category", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum ProductCategory {
    SparePart, // Vira "SPARE_PART"
    Accessory,
    Consumable,
    Fluid,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "unit_of_measure", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitOfMeasure {
    Each,
    Litre,
    Kg,
    Metre,
    Box,
    Set,
    Pair,
}

// O produto é apenas o "catálogo": preço e identificação.
// O saldo físico fica em `Inventory`, por filial.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    #[schema(example = "Pastilha de freio dianteira")]
    pub name: String,

    #[schema(example = "BRK-PAD-044")]
    pub sku: Option<String>,

    pub category: ProductCategory,
    pub description: String,

    #[schema(example = "Bosch")]
    pub brand: String,

    #[schema(example = "0986AB1234")]
    pub part_number: String,

    #[schema(example = "150.00")]
    pub unit_price: Decimal,

    #[schema(example = "95.00")]
    pub cost_price: Option<Decimal>,

    pub unit_of_measure: UnitOfMeasure,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// --- 2. Saldo de Estoque (por produto + filial) ---
// Identidade: (product_id, site_id), único. Mutado APENAS através de
// movimentações (InventoryTransaction), nunca por edição direta de campo.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub id: Uuid,
    pub product_id: Uuid,
    pub site_id: Uuid,

    #[schema(example = 10)]
    pub quantity_on_hand: i32,

    #[schema(example = 0)]
    pub quantity_reserved: i32,

    // Abaixo de reorder_level, o painel sugere comprar reorder_quantity.
    pub reorder_level: i32,
    pub reorder_quantity: i32,

    #[schema(example = "A3-12")]
    pub bin_location: String,

    pub last_counted_at: Option<DateTime<Utc>>,
    pub last_restocked_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

// --- 3. Movimentações de Estoque (livro-razão, imutável) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    In,             // Entrada (compra / reposição)
    Out,            // Saída (venda / uso em OS)
    Adjust,         // Ajuste manual
    Return,         // Devolução
    Reserve,        // Reserva para OS
    ReleaseReserve, // Vira "RELEASE_RESERVE"
    Count,          // Contagem de inventário
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub kind: TransactionKind,

    // Delta com sinal: -2 para saída de 2 unidades.
    pub quantity: i32,

    // Referência de volta à entidade causadora (ex: "product_usage" + id).
    #[schema(example = "product_usage")]
    pub reference_type: String,
    pub reference_id: Option<Uuid>,

    pub notes: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
