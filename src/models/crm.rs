// src/models/crm.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Cliente ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,

    #[schema(example = "Ama")]
    pub first_name: String,

    #[schema(example = "Owusu")]
    pub last_name: String,

    #[schema(example = "ama.owusu@example.com")]
    pub email: Option<String>,

    #[schema(example = "+233244112233")]
    pub phone_number: String,

    // Se false, o cliente não recebe lembretes automáticos de revisão.
    pub receive_service_reminders: bool,

    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// --- Veículo ---
// Pertence à filial onde foi cadastrado; `last_serviced` é carimbado pelo
// fluxo de conclusão e consumido pelo colaborador externo de lembretes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub site_id: Uuid,

    #[schema(example = "Toyota")]
    pub make: String,

    #[schema(example = "Corolla")]
    pub model: String,

    #[schema(example = 2019)]
    pub year: i32,

    #[schema(example = "GR-1234-20")]
    pub license_plate: String,

    #[schema(value_type = String, format = Date, example = "2025-03-14")]
    pub last_serviced: Option<NaiveDate>,

    #[schema(example = 180)]
    pub service_interval_days: i32,

    #[schema(value_type = String, format = Date)]
    pub last_reminder_sent: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Descrição curta usada em notificações: "Toyota Corolla (GR-1234-20)".
    pub fn display(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.license_plate)
    }
}
