// src/handlers/sites.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, site::SiteScope},
    models::site::{Mechanic, Site},
};

// ---
// Payload: CreateSitePayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSitePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Oficina Kumasi")]
    pub name: String,

    #[validate(length(min = 1, message = "A localização é obrigatória."))]
    #[schema(example = "45 Harper Road, Kumasi")]
    pub location: String,

    #[validate(length(min = 5, message = "O telefone é obrigatório."))]
    #[schema(example = "+233312345678")]
    pub contact_number: String,
}

// GET /api/sites/
#[utoipa::path(
    get,
    path = "/api/sites/",
    tag = "Sites",
    responses((status = 200, description = "Lista de filiais", body = [Site])),
    security(("api_jwt" = []))
)]
pub async fn list_sites(
    State(app_state): State<AppState>,
    locale: Locale,
    _scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let sites = app_state
        .site_service
        .list_sites()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sites)))
}

// POST /api/sites/
#[utoipa::path(
    post,
    path = "/api/sites/",
    tag = "Sites",
    request_body = CreateSitePayload,
    responses((status = 201, description = "Filial criada", body = Site)),
    security(("api_jwt" = []))
)]
pub async fn create_site(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreateSitePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let site = app_state
        .site_service
        .create_site(
            &app_state.db_pool,
            &scope,
            &payload.name,
            &payload.location,
            &payload.contact_number,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(site)))
}

// ---
// Payload: CreateMechanicPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMechanicPayload {
    pub site_id: Uuid,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Yaw Boateng")]
    pub name: String,

    #[validate(length(min = 5, message = "O telefone é obrigatório."))]
    #[schema(example = "+233209876543")]
    pub phone_number: String,
}

// GET /api/mechanics/
#[utoipa::path(
    get,
    path = "/api/mechanics/",
    tag = "Sites",
    responses((status = 200, description = "Mecânicos visíveis ao chamador", body = [Mechanic])),
    security(("api_jwt" = []))
)]
pub async fn list_mechanics(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let mechanics = app_state
        .site_service
        .list_mechanics(&scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mechanics)))
}

// POST /api/mechanics/
#[utoipa::path(
    post,
    path = "/api/mechanics/",
    tag = "Sites",
    request_body = CreateMechanicPayload,
    responses((status = 201, description = "Mecânico criado", body = Mechanic)),
    security(("api_jwt" = []))
)]
pub async fn create_mechanic(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreateMechanicPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mechanic = app_state
        .site_service
        .create_mechanic(
            &app_state.db_pool,
            &scope,
            payload.site_id,
            &payload.name,
            &payload.phone_number,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(mechanic)))
}
