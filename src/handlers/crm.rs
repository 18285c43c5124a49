// src/handlers/crm.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, site::SiteScope},
    models::crm::{Customer, Vehicle},
};

// ---
// Payload: CreateCustomerPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Ama")]
    pub first_name: String,

    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    #[schema(example = "Owusu")]
    pub last_name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    #[validate(length(min = 5, message = "O telefone é obrigatório."))]
    #[schema(example = "+233244112233")]
    pub phone_number: String,

    // Default: cliente aceita lembretes de revisão.
    #[serde(default = "default_true")]
    pub receive_service_reminders: bool,
}

fn default_true() -> bool {
    true
}

// GET /api/customers/
#[utoipa::path(
    get,
    path = "/api/customers/",
    tag = "CRM",
    responses((status = 200, description = "Lista de clientes", body = [Customer])),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    _scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .crm_service
        .list_customers()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customers)))
}

// POST /api/customers/
#[utoipa::path(
    post,
    path = "/api/customers/",
    tag = "CRM",
    request_body = CreateCustomerPayload,
    responses((status = 201, description = "Cliente criado", body = Customer)),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .crm_service
        .create_customer(
            &app_state.db_pool,
            &scope,
            &payload.first_name,
            &payload.last_name,
            payload.email.as_deref(),
            &payload.phone_number,
            payload.receive_service_reminders,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers/{id}/
#[utoipa::path(
    get,
    path = "/api/customers/{id}/",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _scope: SiteScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .crm_service
        .get_customer(&app_state.db_pool, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// ---
// Payload: CreateVehiclePayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehiclePayload {
    pub customer_id: Uuid,
    pub site_id: Uuid,

    #[validate(length(min = 1, message = "A marca é obrigatória."))]
    #[schema(example = "Toyota")]
    pub make: String,

    #[validate(length(min = 1, message = "O modelo é obrigatório."))]
    #[schema(example = "Corolla")]
    pub model: String,

    #[validate(range(min = 1950, max = 2100, message = "Ano inválido."))]
    #[schema(example = 2019)]
    pub year: i32,

    #[validate(length(min = 1, message = "A placa é obrigatória."))]
    #[schema(example = "GR-1234-20")]
    pub license_plate: String,
}

// GET /api/vehicles/
#[utoipa::path(
    get,
    path = "/api/vehicles/",
    tag = "CRM",
    responses((status = 200, description = "Veículos visíveis ao chamador", body = [Vehicle])),
    security(("api_jwt" = []))
)]
pub async fn list_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let vehicles = app_state
        .crm_service
        .list_vehicles(&scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicles)))
}

// POST /api/vehicles/
#[utoipa::path(
    post,
    path = "/api/vehicles/",
    tag = "CRM",
    request_body = CreateVehiclePayload,
    responses((status = 201, description = "Veículo criado", body = Vehicle)),
    security(("api_jwt" = []))
)]
pub async fn create_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreateVehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .crm_service
        .create_vehicle(
            &app_state.db_pool,
            &scope,
            payload.customer_id,
            payload.site_id,
            &payload.make,
            &payload.model,
            payload.year,
            &payload.license_plate,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

// GET /api/vehicles/{id}/
#[utoipa::path(
    get,
    path = "/api/vehicles/{id}/",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do veículo")),
    responses(
        (status = 200, description = "Veículo", body = Vehicle),
        (status = 404, description = "Não encontrado ou fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = app_state
        .crm_service
        .get_vehicle(&app_state.db_pool, &scope, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicle)))
}
