// src/models/appointments.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow, // Vira "NO_SHOW"
}

impl AppointmentStatus {
    /// Estados terminais: o agendamento não aceita mais alterações.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::NoShow
        )
    }
}

// Reserva de horário na agenda da filial, com mecânico opcional.
// Quando convertido em OS, guarda o vínculo em service_request_id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,

    #[schema(example = "APT-2025-0011")]
    pub display_number: String,

    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub site_id: Uuid,
    pub mechanic_id: Option<Uuid>,

    #[schema(value_type = String, format = Date, example = "2025-07-02")]
    pub scheduled_date: NaiveDate,

    #[schema(value_type = String, example = "09:30:00")]
    pub scheduled_time: NaiveTime,

    #[schema(example = 60)]
    pub duration_minutes: i32,

    pub status: AppointmentStatus,
    pub notes: String,
    pub service_request_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
