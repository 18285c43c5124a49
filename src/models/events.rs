// src/models/events.rs

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::billing::PaymentMethod;

// Eventos pós-commit produzidos pelos services e consumidos pelo
// despachante de notificações DEPOIS da transação confirmar.
//
// Substituem os "gatilhos implícitos" (signals/hooks de pós-save): o service
// devolve a lista do que aconteceu e quem reage fica de fora da transação.
// Cada evento carrega todos os dados que a mensagem precisa, para o
// despachante não voltar ao banco.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// Fatura emitida na conclusão de uma OS/venda.
    InvoiceIssued {
        invoice_id: Uuid,
        display_number: String,
        customer_name: String,
        customer_phone: String,
        customer_email: Option<String>,
        // None em venda balcão.
        vehicle_display: Option<String>,
        total_cost: Decimal,
    },

    /// OS concluída: o cliente pode buscar o veículo (ou retirar as peças).
    ReadyForPickup {
        service_request_id: Uuid,
        display_number: String,
        customer_name: String,
        customer_phone: String,
        vehicle_display: Option<String>,
    },

    /// Pagamento registrado (transição false -> true de `paid`).
    PaymentReceived {
        invoice_id: Uuid,
        display_number: String,
        customer_name: String,
        customer_phone: String,
        customer_email: Option<String>,
        total_cost: Decimal,
        payment_method: Option<PaymentMethod>,
    },

    /// Mecânico atribuído a uma OS.
    MechanicAssigned {
        service_request_id: Uuid,
        display_number: String,
        mechanic_name: String,
        mechanic_phone: String,
        customer_name: String,
        vehicle_display: Option<String>,
        description: String,
    },
}

impl DomainEvent {
    /// Rótulo curto para logs do despachante.
    pub fn context_label(&self) -> &'static str {
        match self {
            DomainEvent::InvoiceIssued { .. } => "invoice",
            DomainEvent::ReadyForPickup { .. } => "job_complete",
            DomainEvent::PaymentReceived { .. } => "receipt",
            DomainEvent::MechanicAssigned { .. } => "mechanic_assignment",
        }
    }

    /// ID da entidade de origem (para correlacionar nos logs).
    pub fn entity_id(&self) -> Uuid {
        match self {
            DomainEvent::InvoiceIssued { invoice_id, .. } => *invoice_id,
            DomainEvent::ReadyForPickup {
                service_request_id, ..
            } => *service_request_id,
            DomainEvent::PaymentReceived { invoice_id, .. } => *invoice_id,
            DomainEvent::MechanicAssigned {
                service_request_id, ..
            } => *service_request_id,
        }
    }
}
