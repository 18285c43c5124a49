// src/handlers/inventory.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, site::SiteScope},
    models::inventory::{
        Inventory, InventoryTransaction, Product, ProductCategory, UnitOfMeasure,
    },
};

// ---
// Validação customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: CreateProductPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Pastilha de freio dianteira")]
    pub name: String,

    pub sku: Option<String>,

    pub category: ProductCategory,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    #[schema(example = "Bosch")]
    pub brand: String,

    #[serde(default)]
    pub part_number: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "150.00")]
    pub unit_price: Decimal,

    pub cost_price: Option<Decimal>,

    pub unit_of_measure: UnitOfMeasure,
}

// GET /api/products/
#[utoipa::path(
    get,
    path = "/api/products/",
    tag = "Inventory",
    responses((status = 200, description = "Catálogo de produtos", body = [Product])),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .list_products()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

// POST /api/products/
#[utoipa::path(
    post,
    path = "/api/products/",
    tag = "Inventory",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 409, description = "SKU duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .create_product(
            &app_state.db_pool,
            &scope,
            &payload.name,
            payload.sku.as_deref(),
            payload.category,
            &payload.description,
            &payload.brand,
            &payload.part_number,
            payload.unit_price,
            payload.cost_price,
            payload.unit_of_measure,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// ---
// Payload: CreateInventoryPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryPayload {
    pub product_id: Uuid,
    pub site_id: Uuid,

    #[validate(range(min = 0, message = "O valor não pode ser negativo."))]
    #[serde(default)]
    pub reorder_level: i32,

    #[validate(range(min = 0, message = "O valor não pode ser negativo."))]
    #[serde(default)]
    pub reorder_quantity: i32,

    #[serde(default)]
    #[schema(example = "A3-12")]
    pub bin_location: String,
}

// GET /api/inventory/
#[utoipa::path(
    get,
    path = "/api/inventory/",
    tag = "Inventory",
    responses((status = 200, description = "Saldos visíveis ao chamador", body = [Inventory])),
    security(("api_jwt" = []))
)]
pub async fn list_inventory(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let inventories = app_state
        .inventory_service
        .list_inventories(&scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(inventories)))
}

// POST /api/inventory/
#[utoipa::path(
    post,
    path = "/api/inventory/",
    tag = "Inventory",
    request_body = CreateInventoryPayload,
    responses(
        (status = 201, description = "Registro de estoque criado", body = Inventory),
        (status = 409, description = "Produto já tem estoque nesta filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_inventory(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreateInventoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let inventory = app_state
        .inventory_service
        .create_inventory(
            &app_state.db_pool,
            &scope,
            payload.product_id,
            payload.site_id,
            payload.reorder_level,
            payload.reorder_quantity,
            &payload.bin_location,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(inventory)))
}

// GET /api/inventory/{id}/
#[utoipa::path(
    get,
    path = "/api/inventory/{id}/",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do registro de estoque")),
    responses(
        (status = 200, description = "Saldo", body = Inventory),
        (status = 404, description = "Não encontrado ou fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_inventory(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let inventory = app_state
        .inventory_service
        .get_inventory(&app_state.db_pool, &scope, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(inventory)))
}

// GET /api/inventory/{id}/transactions/
#[utoipa::path(
    get,
    path = "/api/inventory/{id}/transactions/",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do registro de estoque")),
    responses((status = 200, description = "Histórico de movimentações", body = [InventoryTransaction])),
    security(("api_jwt" = []))
)]
pub async fn list_inventory_transactions(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .inventory_service
        .list_transactions(&app_state.db_pool, &scope, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(movements)))
}

// ---
// Payload: StockEntryPayload (entrada de estoque)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockEntryPayload {
    pub inventory_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    #[schema(example = 25)]
    pub quantity: i32,

    pub notes: Option<String>,
}

// POST /api/inventory/stock-entry/
#[utoipa::path(
    post,
    path = "/api/inventory/stock-entry/",
    tag = "Inventory",
    request_body = StockEntryPayload,
    responses((status = 200, description = "Saldo após a entrada", body = Inventory)),
    security(("api_jwt" = []))
)]
pub async fn stock_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<StockEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .inventory_service
        .restock(
            &app_state.db_pool,
            &scope,
            payload.inventory_id,
            payload.quantity,
            payload.notes.as_deref().unwrap_or("Entrada via API"),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Retorna o novo saldo total para o frontend atualizar a tela
    Ok((StatusCode::OK, Json(updated)))
}

// ---
// Payload: AdjustStockPayload (ajuste manual, delta com sinal)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    // Delta com sinal: negativo corrige para baixo.
    pub quantity_delta: i32,

    #[validate(length(min = 1, message = "Ajuste manual exige justificativa."))]
    #[schema(example = "Contagem física divergente")]
    pub notes: String,
}

// POST /api/inventory/{id}/adjust/
#[utoipa::path(
    post,
    path = "/api/inventory/{id}/adjust/",
    tag = "Inventory",
    request_body = AdjustStockPayload,
    params(("id" = Uuid, Path, description = "ID do registro de estoque")),
    responses(
        (status = 200, description = "Saldo após o ajuste", body = Inventory),
        (status = 400, description = "Ajuste deixaria o saldo negativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .inventory_service
        .adjust(
            &app_state.db_pool,
            &scope,
            id,
            payload.quantity_delta,
            &payload.notes,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}
