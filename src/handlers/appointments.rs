// src/handlers/appointments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, site::SiteScope},
    models::appointments::{Appointment, AppointmentStatus},
};

// ---
// Payload: CreateAppointmentPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentPayload {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub site_id: Uuid,
    pub mechanic_id: Option<Uuid>,

    #[schema(value_type = String, format = Date, example = "2025-07-02")]
    pub scheduled_date: NaiveDate,

    #[schema(value_type = String, example = "09:30:00")]
    pub scheduled_time: NaiveTime,

    #[validate(range(min = 15, max = 480, message = "Duração entre 15 e 480 minutos."))]
    #[serde(default = "default_duration")]
    pub duration_minutes: i32,

    #[serde(default)]
    pub notes: String,
}

fn default_duration() -> i32 {
    60
}

// GET /api/appointments/
#[utoipa::path(
    get,
    path = "/api/appointments/",
    tag = "Appointments",
    responses((status = 200, description = "Agendamentos visíveis ao chamador", body = [Appointment])),
    security(("api_jwt" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
) -> Result<impl IntoResponse, ApiError> {
    let appointments = app_state
        .appointment_service
        .list(&scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(appointments)))
}

// POST /api/appointments/
#[utoipa::path(
    post,
    path = "/api/appointments/",
    tag = "Appointments",
    request_body = CreateAppointmentPayload,
    responses((status = 201, description = "Agendamento criado", body = Appointment)),
    security(("api_jwt" = []))
)]
pub async fn create_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Json(payload): Json<CreateAppointmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let appointment = app_state
        .appointment_service
        .create(
            &app_state.db_pool,
            &scope,
            payload.customer_id,
            payload.vehicle_id,
            payload.site_id,
            payload.mechanic_id,
            payload.scheduled_date,
            payload.scheduled_time,
            payload.duration_minutes,
            &payload.notes,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

// GET /api/appointments/{id}/
#[utoipa::path(
    get,
    path = "/api/appointments/{id}/",
    tag = "Appointments",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento", body = Appointment),
        (status = 404, description = "Não encontrado ou fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = app_state
        .appointment_service
        .get(&app_state.db_pool, &scope, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(appointment)))
}

// ---
// Payload: UpdateAppointmentStatusPayload
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentStatusPayload {
    #[schema(example = "CONFIRMED")]
    pub status: AppointmentStatus,
}

// PATCH /api/appointments/{id}/
#[utoipa::path(
    patch,
    path = "/api/appointments/{id}/",
    tag = "Appointments",
    request_body = UpdateAppointmentStatusPayload,
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Status atualizado", body = Appointment),
        (status = 400, description = "Estado terminal não muda")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_appointment_status(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = app_state
        .appointment_service
        .set_status(&app_state.db_pool, &scope, id, payload.status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(appointment)))
}

// ---
// Payload: ConvertAppointmentPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertAppointmentPayload {
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    #[schema(example = "Revisão de 10.000 km")]
    pub description: String,

    pub service_type_id: Option<Uuid>,
}

// POST /api/appointments/{id}/convert/
#[utoipa::path(
    post,
    path = "/api/appointments/{id}/convert/",
    tag = "Appointments",
    request_body = ConvertAppointmentPayload,
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Convertido em OS (vínculo gravado)", body = Appointment),
        (status = 400, description = "Já convertido ou em estado terminal")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: SiteScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConvertAppointmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let appointment = app_state
        .appointment_service
        .convert(
            &app_state.db_pool,
            &scope,
            id,
            &payload.description,
            payload.service_type_id,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(appointment)))
}
