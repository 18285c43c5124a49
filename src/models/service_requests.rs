// src/models/service_requests.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

// Venda balcão (sem veículo) x ordem de serviço (com veículo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Sale,
    Service,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "service_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Draft,      // Em montagem, pode ser excluída
    Pending,    // Aguardando execução/pagamento
    InProgress, // Vira "IN_PROGRESS"
    Completed,  // Terminal: registro imutável
}

// --- Classificação de serviço (ex: "Mecânica / Freios") ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceType {
    pub id: Uuid,

    #[schema(example = "Mecânica")]
    pub category: String,

    #[schema(example = "Troca de freios")]
    pub name: String,
}

// --- Ordem de Serviço / Venda ---
// A entidade mutável sobre a qual o fluxo de conclusão opera. Depois de
// COMPLETED, nem ela nem seus itens aceitam alteração.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,

    // Número legível, permanente, gerado na criação:
    // SR-2025-0042 (com veículo) ou SALE-2025-0007 (venda balcão).
    #[schema(example = "SR-2025-0042")]
    pub display_number: String,

    pub transaction_type: TransactionType,
    pub customer_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub site_id: Uuid,
    pub service_type_id: Option<Uuid>,

    #[schema(example = "Troca de óleo e revisão dos freios")]
    pub description: String,

    pub assigned_mechanic_id: Option<Uuid>,
    pub status: ServiceStatus,

    // Mão de obra. Sempre zero em vendas balcão.
    #[schema(example = "50.00")]
    pub labor_cost: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    pub fn is_completed(&self) -> bool {
        self.status == ServiceStatus::Completed
    }
}

// --- Item de produto usado na OS/venda ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductUsage {
    pub id: Uuid,
    pub service_request_id: Uuid,
    pub product_id: Uuid,

    #[schema(example = 2)]
    pub quantity_used: i32,

    pub created_at: DateTime<Utc>,
}

// Item já "resolvido" com os dados do catálogo, como o orquestrador de
// conclusão precisa: nome para mensagens de erro, preço para o subtotal.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,

    #[schema(example = "150.00")]
    pub unit_price: Decimal,

    #[schema(example = 2)]
    pub quantity_used: i32,
}
