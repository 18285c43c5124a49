// src/services/billing_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BillingRepository, CrmRepository, ServiceRequestRepository},
    middleware::site::SiteScope,
    models::{
        billing::{Invoice, InvoiceListEntry, PaymentMethod, Promotion},
        events::DomainEvent,
        service_requests::UsageLine,
    },
};

// ---
// Resolvedor de preço e desconto (puro, sem I/O)
// ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingOutcome {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Calcula (subtotal, desconto, total) de uma conclusão.
///
/// subtotal = soma(preço unitário x quantidade) + mão de obra.
/// Desconto manual, quando informado, SOBREPÕE a promoção: min(manual,
/// subtotal), negativo tratado como zero. Sem manual, vale o desconto da
/// promoção (percentual arredondado em 2 casas, ou valor fixo limitado ao
/// subtotal). total = max(0, subtotal - desconto).
///
/// Tudo em Decimal: dinheiro nunca passa por ponto flutuante.
pub fn price(
    lines: &[UsageLine],
    labor_cost: Decimal,
    promotion: Option<&Promotion>,
    manual_discount: Option<Decimal>,
) -> PricingOutcome {
    let subtotal = lines.iter().fold(Decimal::ZERO, |acc, line| {
        acc + line.unit_price * Decimal::from(line.quantity_used)
    }) + labor_cost;

    let discount = match manual_discount {
        Some(manual) => manual.max(Decimal::ZERO).min(subtotal),
        None => promotion
            .map(|p| p.compute_discount(subtotal))
            .unwrap_or(Decimal::ZERO),
    };

    let total = (subtotal - discount).max(Decimal::ZERO);

    PricingOutcome {
        subtotal,
        discount,
        total,
    }
}

// ---
// Serviço de faturamento
// ---

#[derive(Clone)]
pub struct BillingService {
    billing_repo: BillingRepository,
    service_request_repo: ServiceRequestRepository,
    crm_repo: CrmRepository,
}

impl BillingService {
    pub fn new(
        billing_repo: BillingRepository,
        service_request_repo: ServiceRequestRepository,
        crm_repo: CrmRepository,
    ) -> Self {
        Self {
            billing_repo,
            service_request_repo,
            crm_repo,
        }
    }

    pub async fn list_invoices(
        &self,
        scope: &SiteScope,
    ) -> Result<Vec<InvoiceListEntry>, AppError> {
        self.billing_repo
            .list_invoices_scoped(scope.visible_site())
            .await
    }

    pub async fn get_invoice<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.billing_repo
            .find_invoice_scoped(executor, id, scope.visible_site())
            .await?
            .ok_or(AppError::InvoiceNotFound)
    }

    /// Registra (ou desfaz) o pagamento de uma fatura.
    ///
    /// O evento de recibo sai APENAS na transição false -> true de `paid`:
    /// re-salvar uma fatura já paga não dispara recibo de novo.
    pub async fn mark_paid<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
        paid: bool,
        payment_method: Option<PaymentMethod>,
    ) -> Result<(Invoice, Vec<DomainEvent>), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let before = self
            .billing_repo
            .find_invoice_scoped(&mut *tx, id, scope.visible_site())
            .await?
            .ok_or(AppError::InvoiceNotFound)?;

        let record = self
            .service_request_repo
            .find_scoped(&mut *tx, before.service_request_id, None)
            .await?
            .ok_or(AppError::ServiceRequestNotFound)?;

        if !scope.can_write_site(record.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        let updated = self
            .billing_repo
            .set_paid(&mut *tx, before.id, paid, payment_method)
            .await?;

        // Dados do recibo lidos ainda na transação (snapshot consistente).
        let mut events = Vec::new();
        if !before.paid && updated.paid {
            let customer = self
                .crm_repo
                .find_customer(&mut *tx, record.customer_id)
                .await?
                .ok_or(AppError::CustomerNotFound)?;

            events.push(DomainEvent::PaymentReceived {
                invoice_id: updated.id,
                display_number: updated.display_number.clone(),
                customer_name: customer.full_name(),
                customer_phone: customer.phone_number.clone(),
                customer_email: customer.email.clone(),
                total_cost: updated.total_cost,
                payment_method: updated.payment_method,
            });
        }

        tx.commit().await?;
        Ok((updated, events))
    }

    // ---
    // Promoções
    // ---

    pub async fn list_promotions(&self) -> Result<Vec<Promotion>, AppError> {
        self.billing_repo.list_promotions().await
    }

    pub async fn get_promotion<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Promotion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.billing_repo
            .find_promotion(executor, id)
            .await?
            .ok_or(AppError::PromotionNotFound)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_promotion<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        title: &str,
        description: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        discount_percent: Option<Decimal>,
        discount_amount: Option<Decimal>,
    ) -> Result<Promotion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !scope.can_write() {
            return Err(AppError::SiteWriteForbidden);
        }

        // Decisão de política: o legado permitia os dois campos juntos (e o
        // percentual vencia em silêncio). Daqui em diante, cadastro com os
        // dois preenchidos é rejeitado.
        if discount_percent.is_some() && discount_amount.is_some() {
            return Err(AppError::PromotionConflict);
        }

        self.billing_repo
            .create_promotion(
                executor,
                title,
                description,
                start_date,
                end_date,
                discount_percent,
                discount_amount,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(unit_price: &str, quantity: i32) -> UsageLine {
        UsageLine {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Pastilha de freio".into(),
            unit_price: dec(unit_price),
            quantity_used: quantity,
        }
    }

    fn percent_promo(percent: &str) -> Promotion {
        Promotion {
            id: Uuid::new_v4(),
            title: "Promo".into(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            discount_percent: Some(dec(percent)),
            discount_amount: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cenario_sem_desconto() {
        // [(150.00 x 2)] + 50.00 de mão de obra = 350.00
        let outcome = price(&[line("150.00", 2)], dec("50.00"), None, None);
        assert_eq!(outcome.subtotal, dec("350.00"));
        assert_eq!(outcome.discount, dec("0"));
        assert_eq!(outcome.total, dec("350.00"));
    }

    #[test]
    fn cenario_promocao_dez_por_cento() {
        let promo = percent_promo("10.00");
        let outcome = price(&[line("150.00", 2)], dec("50.00"), Some(&promo), None);
        assert_eq!(outcome.subtotal, dec("350.00"));
        assert_eq!(outcome.discount, dec("35.00"));
        assert_eq!(outcome.total, dec("315.00"));
    }

    #[test]
    fn desconto_manual_sobrepoe_promocao() {
        let promo = percent_promo("10.00");
        let outcome = price(
            &[line("150.00", 2)],
            dec("50.00"),
            Some(&promo),
            Some(dec("20.00")),
        );
        assert_eq!(outcome.discount, dec("20.00"));
        assert_eq!(outcome.total, dec("330.00"));
    }

    #[test]
    fn desconto_manual_maior_que_subtotal_zera_o_total() {
        let outcome = price(&[line("10.00", 1)], Decimal::ZERO, None, Some(dec("999.00")));
        assert_eq!(outcome.discount, dec("10.00"));
        assert_eq!(outcome.total, dec("0"));
    }

    #[test]
    fn desconto_manual_negativo_vira_zero() {
        let outcome = price(&[line("10.00", 1)], Decimal::ZERO, None, Some(dec("-5.00")));
        assert_eq!(outcome.discount, dec("0"));
        assert_eq!(outcome.total, dec("10.00"));
    }

    #[test]
    fn sem_itens_o_subtotal_e_a_mao_de_obra() {
        let outcome = price(&[], dec("80.00"), None, None);
        assert_eq!(outcome.subtotal, dec("80.00"));
        assert_eq!(outcome.total, dec("80.00"));
    }

    use crate::models::events::DomainEvent;
    use crate::services::service_request_service::{CompleteOptions, CreateServiceRequest};
    use crate::test_support::setup_workshop;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn recibo_sai_apenas_na_transicao_para_paga(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        // Fatura real via conclusão (sem itens: total = mão de obra).
        let record = f
            .state
            .service_request_service
            .create(
                &pool,
                &f.superuser,
                CreateServiceRequest {
                    customer_id: f.customer.id,
                    vehicle_id: Some(f.vehicle.id),
                    site_id: f.site_a.id,
                    service_type_id: None,
                    description: "Revisão".into(),
                    assigned_mechanic_id: None,
                    status: None,
                    labor_cost: dec("80.00"),
                    transaction_type: None,
                },
            )
            .await
            .unwrap();
        let outcome = f
            .state
            .service_request_service
            .complete(&pool, &f.superuser, record.id, CompleteOptions::default())
            .await
            .unwrap();
        let invoice_id = outcome.invoice.id;

        // 1ª marcação como paga: recibo.
        let (invoice, events) = f
            .state
            .billing_service
            .mark_paid(&pool, &f.superuser, invoice_id, true, Some(PaymentMethod::Cash))
            .await
            .unwrap();
        assert!(invoice.paid);
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::PaymentReceived {
                total_cost,
                payment_method,
                ..
            } => {
                assert_eq!(*total_cost, dec("80.00"));
                assert_eq!(*payment_method, Some(PaymentMethod::Cash));
            }
            other => panic!("evento inesperado: {:?}", other),
        }

        // Re-salvar paga não dispara recibo de novo.
        let (_, events) = f
            .state
            .billing_service
            .mark_paid(&pool, &f.superuser, invoice_id, true, Some(PaymentMethod::Cash))
            .await
            .unwrap();
        assert!(events.is_empty());

        // Estorno e novo pagamento: a transição volta a valer.
        let (_, events) = f
            .state
            .billing_service
            .mark_paid(&pool, &f.superuser, invoice_id, false, None)
            .await
            .unwrap();
        assert!(events.is_empty());
        let (_, events) = f
            .state
            .billing_service
            .mark_paid(&pool, &f.superuser, invoice_id, true, Some(PaymentMethod::MobileMoney))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[sqlx::test]
    async fn promocao_nao_cadastra_percentual_e_valor_juntos(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        let err = f
            .state
            .billing_service
            .create_promotion(
                &pool,
                &f.superuser,
                "Dupla",
                "",
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
                Some(dec("10.00")),
                Some(dec("5.00")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PromotionConflict));
    }

    #[test]
    fn total_e_sempre_subtotal_menos_desconto() {
        // Propriedade: para 0 <= D <= S, total == S - D, exato em Decimal.
        for (price_str, qty, labor, percent) in [
            ("19.99", 3, "0.00", "5.00"),
            ("33.33", 1, "12.50", "33.00"),
            ("0.01", 7, "0.07", "99.99"),
        ] {
            let promo = percent_promo(percent);
            let outcome = price(&[line(price_str, qty)], dec(labor), Some(&promo), None);
            assert_eq!(outcome.total, outcome.subtotal - outcome.discount);
            assert!(outcome.discount >= Decimal::ZERO);
            assert!(outcome.discount <= outcome.subtotal);
        }
    }
}
