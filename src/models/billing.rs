// src/models/billing.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney, // Vira "MOBILE_MONEY"
    BankTransfer,
}

impl PaymentMethod {
    /// Rótulo usado nas mensagens de recibo.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::MobileMoney => "Mobile Money",
            PaymentMethod::BankTransfer => "Bank Transfer",
        }
    }
}

// --- Promoção ---
// Percentual OU valor fixo. A API rejeita cadastrar os dois juntos; para
// linhas antigas com ambos, o percentual vence (comportamento herdado).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: Uuid,

    #[schema(example = "Semana do freio")]
    pub title: String,

    pub description: String,

    // Janela de validade, datas inclusivas.
    #[schema(value_type = String, format = Date, example = "2025-06-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2025-06-30")]
    pub end_date: NaiveDate,

    #[schema(example = "10.00")]
    pub discount_percent: Option<Decimal>,

    #[schema(example = "25.00")]
    pub discount_amount: Option<Decimal>,

    pub created_at: DateTime<Utc>,
}

impl Promotion {
    /// Desconto para um dado subtotal. Percentual arredondado em 2 casas;
    /// valor fixo limitado ao subtotal (nunca negativo, nunca maior).
    pub fn compute_discount(&self, subtotal: Decimal) -> Decimal {
        if let Some(percent) = self.discount_percent {
            if percent > Decimal::ZERO {
                return (subtotal * percent / Decimal::from(100)).round_dp(2);
            }
        }
        if let Some(amount) = self.discount_amount {
            if amount > Decimal::ZERO {
                return amount.min(subtotal);
            }
        }
        Decimal::ZERO
    }
}

// --- Fatura ---
// Criada exatamente uma vez, na conclusão, pelo orquestrador. Depois disso
// só muda para registrar o pagamento (paid + payment_method).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,

    // Número legível permanente, sequencial: INV-2025-00001.
    #[schema(example = "INV-2025-00001")]
    pub display_number: String,

    pub service_request_id: Uuid,

    #[schema(example = "350.00")]
    pub subtotal: Decimal,

    #[schema(example = "35.00")]
    pub discount_amount: Decimal,

    // total_cost = max(0, subtotal - discount_amount), sempre.
    #[schema(example = "315.00")]
    pub total_cost: Decimal,

    pub promotion_id: Option<Uuid>,
    pub paid: bool,
    pub payment_method: Option<PaymentMethod>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Fatura com os campos de exibição que a listagem precisa, sem obrigar o
// frontend a buscar cliente/veículo/filial um a um.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListEntry {
    pub id: Uuid,
    pub display_number: String,
    pub service_request_id: Uuid,

    #[schema(example = "SR-2025-0042")]
    pub service_request_display: String,

    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total_cost: Decimal,
    pub paid: bool,
    pub payment_method: Option<PaymentMethod>,

    #[schema(example = "Ama Owusu")]
    pub customer_name: String,

    // None em vendas balcão.
    #[schema(example = "Toyota Corolla (GR-1234-20)")]
    pub vehicle_display: Option<String>,

    #[schema(example = "Oficina Accra Central")]
    pub site_name: String,

    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn promo(percent: Option<&str>, amount: Option<&str>) -> Promotion {
        Promotion {
            id: Uuid::new_v4(),
            title: "Teste".into(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            discount_percent: percent.map(|p| Decimal::from_str(p).unwrap()),
            discount_amount: amount.map(|a| Decimal::from_str(a).unwrap()),
            created_at: Utc::now(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn desconto_percentual_arredonda_em_duas_casas() {
        let p = promo(Some("10.00"), None);
        assert_eq!(p.compute_discount(dec("350.00")), dec("35.00"));
        // 33.335 arredonda (banker's) para 33.34
        let p = promo(Some("10.00"), None);
        assert_eq!(p.compute_discount(dec("333.35")), dec("33.34"));
    }

    #[test]
    fn desconto_fixo_nunca_excede_o_subtotal() {
        let p = promo(None, Some("500.00"));
        assert_eq!(p.compute_discount(dec("350.00")), dec("350.00"));
        let p = promo(None, Some("25.00"));
        assert_eq!(p.compute_discount(dec("350.00")), dec("25.00"));
    }

    #[test]
    fn percentual_vence_quando_ambos_preenchidos() {
        // Linhas antigas podem ter os dois campos; o percentual prevalece.
        let p = promo(Some("10.00"), Some("5.00"));
        assert_eq!(p.compute_discount(dec("100.00")), dec("10.00"));
    }

    #[test]
    fn sem_campos_preenchidos_desconto_zero() {
        let p = promo(None, None);
        assert_eq!(p.compute_discount(dec("100.00")), Decimal::ZERO);
        // Percentual zero cai para o valor fixo (se houver)
        let p = promo(Some("0.00"), Some("7.00"));
        assert_eq!(p.compute_discount(dec("100.00")), dec("7.00"));
    }
}
