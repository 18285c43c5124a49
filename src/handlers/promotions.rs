// src/handlers/promotions.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, site::SiteScope},
    models::billing::Promotion,
};

fn validate_percent_range(val: &Decimal) -> Result<(), ValidationError> {
    if *val < Decimal::ZERO || *val > Decimal::from(100) {
        let mut err = ValidationError::new("range");
        err.message = Some("O percentual deve estar entre 0 e 100.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: CreatePromotionPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotionPayload {
    #[validate(length(min = 1, message = "O título é obrigatório."))]
    #[schema(example = "Semana do freio")]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[schema(value_type = String, format = Date, example = "2025-06-01")]
    pub start_date: NaiveDate,

    #[schema(value_type = String, format = Date, example = "2025-06-30")]
    pub end_date: NaiveDate,

    // Percentual OU valor fixo: os dois juntos são rejeitados.
    #[validate(custom(function = "validate_percent_range"))]
    #[schema(example = "10.00")]
    pub discount_percent: Option<Decimal>,

    #[schema(example = "25.00")]
    pub discount_amount: Option<Decimal>,
}

impl CreatePromotionPayload {
    fn validate_consistency(&self) -> Result<(), ValidationError> {
        if self.end_date < self.start_date {
            return Err(ValidationError::new("EndBeforeStart"));
        }
        Ok(())
    }
}

// GET /api/promotions/
#[utoipa::path(
    get,
    path = "/api/promotions/",
    tag = "Promotions",
    responses((status = 200, description = "Promoções cadastradas", body = [Promotion])),
    security(("api_jwt" = []))
)]
pub async fn list_promotions(
    State(app_state): State<AppState>,
    locale: Locale,
    _scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let promotions = app_state
        .billing_service
        .list_promotions()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(promotions)))
}

// POST /api/promotions/
#[utoipa::path(
    post,
    path = "/api/promotions/",
    tag = "Promotions",
    request_body = CreatePromotionPayload,
    responses(
        (status = 201, description = "Promoção criada", body = Promotion),
        (status = 400, description = "Percentual e valor fixo ao mesmo tempo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_promotion(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreatePromotionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    payload.validate_consistency().map_err(|e| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("endDate", e);
        AppError::ValidationError(errors).to_api_error(&locale, &app_state.i18n_store)
    })?;

    let promotion = app_state
        .billing_service
        .create_promotion(
            &app_state.db_pool,
            &scope,
            &payload.title,
            &payload.description,
            payload.start_date,
            payload.end_date,
            payload.discount_percent,
            payload.discount_amount,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(promotion)))
}

// GET /api/promotions/{id}/
#[utoipa::path(
    get,
    path = "/api/promotions/{id}/",
    tag = "Promotions",
    params(("id" = Uuid, Path, description = "ID da promoção")),
    responses(
        (status = 200, description = "Promoção", body = Promotion),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_promotion(
    State(app_state): State<AppState>,
    locale: Locale,
    _scope: SiteScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let promotion = app_state
        .billing_service
        .get_promotion(&app_state.db_pool, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(promotion)))
}
