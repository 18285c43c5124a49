// src/handlers/service_requests.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, site::SiteScope},
    models::{
        billing::Invoice,
        service_requests::{
            ProductUsage, ServiceRequest, ServiceStatus, ServiceType, TransactionType,
        },
    },
    services::service_request_service::{
        CompleteOptions, CreateServiceRequest, UpdateServiceRequest,
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
// Payload: CreateServiceRequestPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequestPayload {
    pub customer_id: Uuid,

    // Ausente = venda balcão (SALE-...); presente = OS (SR-...).
    pub vehicle_id: Option<Uuid>,

    // Declaração explícita do tipo (opcional); precisa bater com o veículo.
    pub transaction_type: Option<TransactionType>,

    pub site_id: Uuid,

    pub service_type_id: Option<Uuid>,

    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    #[schema(example = "Troca de óleo e revisão dos freios")]
    pub description: String,

    pub assigned_mechanic_id: Option<Uuid>,

    // DRAFT ou PENDING; default PENDING.
    pub status: Option<ServiceStatus>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub labor_cost: Decimal,
}

// Filtros da listagem (?parts_only=true mantém só vendas balcão)
#[derive(Debug, Deserialize)]
pub struct ListServiceRequestParams {
    #[serde(default)]
    pub parts_only: bool,
}

// GET /api/service_request/
#[utoipa::path(
    get,
    path = "/api/service_request/",
    tag = "ServiceRequests",
    params(("parts_only" = Option<bool>, Query, description = "Somente vendas balcão (sem veículo)")),
    responses((status = 200, description = "OSs/vendas visíveis ao chamador", body = [ServiceRequest])),
    security(("api_jwt" = []))
)]
pub async fn list_service_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Query(params): Query<ListServiceRequestParams>,
) -> Result<impl IntoResponse, ApiError> {
    let records = app_state
        .service_request_service
        .list(&scope, params.parts_only)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(records)))
}

// POST /api/service_request/
#[utoipa::path(
    post,
    path = "/api/service_request/",
    tag = "ServiceRequests",
    request_body = CreateServiceRequestPayload,
    responses(
        (status = 201, description = "OS/venda criada com número legível", body = ServiceRequest),
        (status = 400, description = "Violação do discriminador venda/serviço"),
        (status = 403, description = "Sem permissão de escrita na filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_service_request(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreateServiceRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let record = app_state
        .service_request_service
        .create(
            &app_state.db_pool,
            &scope,
            CreateServiceRequest {
                customer_id: payload.customer_id,
                vehicle_id: payload.vehicle_id,
                site_id: payload.site_id,
                service_type_id: payload.service_type_id,
                description: payload.description,
                assigned_mechanic_id: payload.assigned_mechanic_id,
                status: payload.status,
                labor_cost: payload.labor_cost,
                transaction_type: payload.transaction_type,
            },
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(record)))
}

// GET /api/service_request/{id}/
#[utoipa::path(
    get,
    path = "/api/service_request/{id}/",
    tag = "ServiceRequests",
    params(("id" = Uuid, Path, description = "ID da OS/venda")),
    responses(
        (status = 200, description = "OS/venda", body = ServiceRequest),
        (status = 404, description = "Não encontrada ou fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_service_request(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .service_request_service
        .get(&app_state.db_pool, &scope, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(record)))
}

// ---
// Payload: UpdateServiceRequestPayload (PATCH, tudo opcional)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequestPayload {
    pub site_id: Option<Uuid>,
    pub service_type_id: Option<Uuid>,

    pub description: Option<String>,

    pub assigned_mechanic_id: Option<Uuid>,

    pub status: Option<ServiceStatus>,

    pub labor_cost: Option<Decimal>,
}

// PATCH /api/service_request/{id}/
#[utoipa::path(
    patch,
    path = "/api/service_request/{id}/",
    tag = "ServiceRequests",
    request_body = UpdateServiceRequestPayload,
    params(("id" = Uuid, Path, description = "ID da OS/venda")),
    responses(
        (status = 200, description = "OS/venda atualizada", body = ServiceRequest),
        (status = 400, description = "Registro concluído é imutável"),
        (status = 403, description = "Troca de filial exige superuser")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_service_request(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (record, events) = app_state
        .service_request_service
        .update(
            &app_state.db_pool,
            &scope,
            id,
            UpdateServiceRequest {
                site_id: payload.site_id,
                service_type_id: payload.service_type_id,
                description: payload.description,
                assigned_mechanic_id: payload.assigned_mechanic_id,
                status: payload.status,
                labor_cost: payload.labor_cost,
            },
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Atribuição de mecânico notifica depois do commit.
    app_state.notification_service.dispatch_after_commit(events);

    Ok((StatusCode::OK, Json(record)))
}

// DELETE /api/service_request/{id}/
#[utoipa::path(
    delete,
    path = "/api/service_request/{id}/",
    tag = "ServiceRequests",
    params(("id" = Uuid, Path, description = "ID da OS/venda")),
    responses(
        (status = 204, description = "Excluída"),
        (status = 400, description = "Registro concluído é imutável")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_service_request(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .service_request_service
        .delete(&app_state.db_pool, &scope, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Payload: CompleteServiceRequestPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteServiceRequestPayload {
    pub promotion_id: Option<Uuid>,

    // Desconto manual: sobrepõe a promoção quando presente.
    #[schema(example = "20.00")]
    pub discount_amount: Option<Decimal>,

    // Override de mão de obra; negativo é clampado a zero.
    #[schema(example = "50.00")]
    pub labor_cost: Option<Decimal>,
}

// Resposta da conclusão: o registro terminal + a fatura emitida.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub service_request: ServiceRequest,
    pub invoice: Invoice,
}

// POST /api/service_request/{id}/complete/
#[utoipa::path(
    post,
    path = "/api/service_request/{id}/complete/",
    tag = "ServiceRequests",
    request_body = CompleteServiceRequestPayload,
    params(("id" = Uuid, Path, description = "ID da OS/venda")),
    responses(
        (status = 200, description = "Concluída: estoque baixado, fatura emitida", body = CompletionResponse),
        (status = 400, description = "Já concluída / estoque insuficiente / sem registro de estoque"),
        (status = 404, description = "Não encontrada ou fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_service_request(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteServiceRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .service_request_service
        .complete(
            &app_state.db_pool,
            &scope,
            id,
            CompleteOptions {
                promotion_id: payload.promotion_id,
                discount_amount: payload.discount_amount,
                labor_cost: payload.labor_cost,
            },
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Notificações saem DEPOIS do commit; falha delas não desfaz nada.
    app_state
        .notification_service
        .dispatch_after_commit(outcome.events);

    Ok((
        StatusCode::OK,
        Json(CompletionResponse {
            service_request: outcome.record,
            invoice: outcome.invoice,
        }),
    ))
}

// ---
// Payload: AddProductUsagePayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddProductUsagePayload {
    pub service_request_id: Uuid,
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser um inteiro positivo."))]
    #[schema(example = 2)]
    pub quantity_used: i32,
}

// POST /api/product-usage/
#[utoipa::path(
    post,
    path = "/api/product-usage/",
    tag = "ServiceRequests",
    request_body = AddProductUsagePayload,
    responses(
        (status = 201, description = "Item adicionado", body = ProductUsage),
        (status = 400, description = "OS concluída não aceita itens")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_product_usage(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<AddProductUsagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let usage = app_state
        .service_request_service
        .add_usage(
            &app_state.db_pool,
            &scope,
            payload.service_request_id,
            payload.product_id,
            payload.quantity_used,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(usage)))
}

// GET /api/product-usage/{service_request_id}/
#[utoipa::path(
    get,
    path = "/api/product-usage/{service_request_id}/",
    tag = "ServiceRequests",
    params(("service_request_id" = Uuid, Path, description = "ID da OS/venda")),
    responses((status = 200, description = "Itens da OS/venda", body = [ProductUsage])),
    security(("api_jwt" = []))
)]
pub async fn list_product_usages(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(service_request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let usages = app_state
        .service_request_service
        .list_usages(&app_state.db_pool, &scope, service_request_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(usages)))
}

// ---
// Payload: CreateServiceTypePayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceTypePayload {
    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    #[schema(example = "Mecânica")]
    pub category: String,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Troca de freios")]
    pub name: String,
}

// GET /api/service-types/
#[utoipa::path(
    get,
    path = "/api/service-types/",
    tag = "ServiceRequests",
    responses((status = 200, description = "Classificações de serviço", body = [ServiceType])),
    security(("api_jwt" = []))
)]
pub async fn list_service_types(
    State(app_state): State<AppState>,
    locale: Locale,
    _scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let types = app_state
        .service_request_service
        .list_service_types()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(types)))
}

// POST /api/service-types/
#[utoipa::path(
    post,
    path = "/api/service-types/",
    tag = "ServiceRequests",
    request_body = CreateServiceTypePayload,
    responses((status = 201, description = "Classificação criada", body = ServiceType)),
    security(("api_jwt" = []))
)]
pub async fn create_service_type(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreateServiceTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service_type = app_state
        .service_request_service
        .create_service_type(&app_state.db_pool, &scope, &payload.category, &payload.name)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(service_type)))
}
