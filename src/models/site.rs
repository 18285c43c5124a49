// src/models/site.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Filial (site) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "Oficina Accra Central")]
    pub name: String,

    #[schema(example = "12 Ring Road, Accra")]
    pub location: String,

    #[schema(example = "+233201234567")]
    pub contact_number: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Mecânico (pertence a uma filial) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Mechanic {
    pub id: Uuid,

    pub site_id: Uuid,

    #[schema(example = "Yaw Boateng")]
    pub name: String,

    #[schema(example = "+233209876543")]
    pub phone_number: String,

    pub created_at: DateTime<Utc>,
}
