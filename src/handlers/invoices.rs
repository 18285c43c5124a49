// src/handlers/invoices.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, site::SiteScope},
    models::billing::{Invoice, InvoiceListEntry, PaymentMethod},
};

// GET /api/invoices/
#[utoipa::path(
    get,
    path = "/api/invoices/",
    tag = "Invoices",
    responses((status = 200, description = "Faturas visíveis ao chamador", body = [InvoiceListEntry])),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = app_state
        .billing_service
        .list_invoices(&scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(invoices)))
}

// GET /api/invoices/{id}/
#[utoipa::path(
    get,
    path = "/api/invoices/{id}/",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura", body = Invoice),
        (status = 404, description = "Não encontrada ou fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .billing_service
        .get_invoice(&app_state.db_pool, &scope, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(invoice)))
}

// ---
// Payload: UpdateInvoicePayload (pagamento)
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoicePayload {
    pub paid: bool,
    pub payment_method: Option<PaymentMethod>,
}

// PATCH /api/invoices/{id}/
#[utoipa::path(
    patch,
    path = "/api/invoices/{id}/",
    tag = "Invoices",
    request_body = UpdateInvoicePayload,
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura atualizada; recibo notificado só na transição para paga", body = Invoice),
        (status = 404, description = "Não encontrada ou fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let (invoice, events) = app_state
        .billing_service
        .mark_paid(
            &app_state.db_pool,
            &scope,
            id,
            payload.paid,
            payload.payment_method,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Recibo (se houve transição) sai depois do commit.
    app_state.notification_service.dispatch_after_commit(events);

    Ok((StatusCode::OK, Json(invoice)))
}
