// src/services/notification_service.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::events::DomainEvent;

// ---
// O "sink" de notificação (colaborador externo)
// ---
// Contrato fire-and-forget: o orquestrador nunca depende do retorno. Em
// desenvolvimento o sink é o console (via tracing); em produção entra um
// provedor de SMS/e-mail por trás do mesmo trait.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str, context: &str) -> anyhow::Result<()>;
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        context: &str,
    ) -> anyhow::Result<()>;
}

// Sink de desenvolvimento: loga no console para confirmar os fluxos.
pub struct ConsoleSink;

#[async_trait]
impl NotificationSink for ConsoleSink {
    async fn send_sms(&self, to: &str, body: &str, context: &str) -> anyhow::Result<()> {
        tracing::info!("[SMS] contexto={} para={} corpo={:?}", context, to, body);
        Ok(())
    }

    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        context: &str,
    ) -> anyhow::Result<()> {
        tracing::info!(
            "[EMAIL] contexto={} para={} assunto={:?} corpo={:?}",
            context,
            to,
            subject,
            body
        );
        Ok(())
    }
}

// ---
// Despachante de eventos pós-commit
// ---

#[derive(Clone)]
pub struct NotificationService {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationService {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Despacha os eventos DEPOIS do commit, em uma task separada.
    ///
    /// Falhas de entrega são logadas e engolidas: a transação financeira já
    /// foi confirmada e não pode ser desfeita por erro de mensageria. Não há
    /// retry síncrono; o contrato com o sink é at-least-once de melhor
    /// esforço.
    pub fn dispatch_after_commit(&self, events: Vec<DomainEvent>) {
        if events.is_empty() {
            return;
        }
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            for event in events {
                if let Err(e) = deliver(sink.as_ref(), &event).await {
                    tracing::warn!(
                        "Falha ao entregar notificação (contexto={}, origem={}): {}",
                        event.context_label(),
                        event.entity_id(),
                        e
                    );
                }
            }
        });
    }
}

// Monta e envia as mensagens de cada evento.
async fn deliver(sink: &dyn NotificationSink, event: &DomainEvent) -> anyhow::Result<()> {
    let context = event.context_label();
    match event {
        DomainEvent::InvoiceIssued {
            display_number,
            customer_name,
            customer_phone,
            customer_email,
            vehicle_display,
            total_cost,
            ..
        } => {
            let sms = format!(
                "Dear {}, your service is complete. The total cost is GH₵{}. Please proceed to payment.",
                customer_name, total_cost
            );
            sink.send_sms(customer_phone, &sms, context).await?;

            if let Some(email) = customer_email {
                let (subject, body) = match vehicle_display {
                    Some(vehicle) => (
                        format!("Invoice {} - {}", display_number, vehicle),
                        format!(
                            "Dear {},\n\nYour service for {} is complete.\nTotal amount: GH₵{}\n\nPlease proceed to payment at your earliest convenience.\n\nThank you.",
                            customer_name, vehicle, total_cost
                        ),
                    ),
                    None => (
                        format!("Invoice {} - Parts sale", display_number),
                        format!(
                            "Dear {},\n\nYour parts order is complete.\nTotal amount: GH₵{}\n\nPlease proceed to payment at your earliest convenience.\n\nThank you.",
                            customer_name, total_cost
                        ),
                    ),
                };
                sink.send_email(email, &subject, &body, context).await?;
            }
        }

        DomainEvent::ReadyForPickup {
            display_number,
            customer_name,
            customer_phone,
            vehicle_display,
            ..
        } => {
            let sms = match vehicle_display {
                Some(vehicle) => format!(
                    "Dear {}, {} is ready for pickup (job {}).",
                    customer_name, vehicle, display_number
                ),
                None => format!(
                    "Dear {}, your order {} is ready for pickup.",
                    customer_name, display_number
                ),
            };
            sink.send_sms(customer_phone, &sms, context).await?;
        }

        DomainEvent::PaymentReceived {
            display_number,
            customer_name,
            customer_phone,
            customer_email,
            total_cost,
            payment_method,
            ..
        } => {
            let method_label = payment_method.map(|m| m.label()).unwrap_or("—");
            let sms = format!(
                "Dear {}, we have received your payment of GH₵{} ({}). Thank you!",
                customer_name, total_cost, method_label
            );
            sink.send_sms(customer_phone, &sms, context).await?;

            if let Some(email) = customer_email {
                let subject = format!("Receipt {} - Payment received", display_number);
                let body = format!(
                    "Dear {},\n\nWe have received your payment.\nAmount paid: GH₵{}\nPayment method: {}\n\nThank you for your business!",
                    customer_name, total_cost, method_label
                );
                sink.send_email(email, &subject, &body, context).await?;
            }
        }

        DomainEvent::MechanicAssigned {
            display_number,
            mechanic_name,
            mechanic_phone,
            customer_name,
            vehicle_display,
            description,
            ..
        } => {
            let vehicle = vehicle_display.as_deref().unwrap_or("—");
            let sms = format!(
                "Hello {}, you have been assigned job {}.\nCustomer: {}\nVehicle: {}\nDescription: {}",
                mechanic_name, display_number, customer_name, vehicle, description
            );
            sink.send_sms(mechanic_phone, &sms, context).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Mutex;
    use uuid::Uuid;

    // Sink de teste que grava tudo o que recebeu.
    #[derive(Default)]
    struct RecordingSink {
        sms: Mutex<Vec<(String, String, String)>>,
        emails: Mutex<Vec<(String, String)>>,
        fail_sms: bool,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn send_sms(&self, to: &str, body: &str, context: &str) -> anyhow::Result<()> {
            if self.fail_sms {
                anyhow::bail!("provedor fora do ar");
            }
            self.sms
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string(), context.to_string()));
            Ok(())
        }

        async fn send_email(
            &self,
            to: &str,
            subject: &str,
            _body: &str,
            _context: &str,
        ) -> anyhow::Result<()> {
            self.emails
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    fn invoice_event() -> DomainEvent {
        DomainEvent::InvoiceIssued {
            invoice_id: Uuid::new_v4(),
            display_number: "INV-2025-00001".into(),
            customer_name: "Ama Owusu".into(),
            customer_phone: "+233244112233".into(),
            customer_email: Some("ama@example.com".into()),
            vehicle_display: Some("Toyota Corolla (GR-1234-20)".into()),
            total_cost: Decimal::from_str("315.00").unwrap(),
        }
    }

    #[tokio::test]
    async fn entrega_sms_e_email_da_fatura() {
        let sink = RecordingSink::default();
        deliver(&sink, &invoice_event()).await.unwrap();

        let sms = sink.sms.lock().unwrap();
        assert_eq!(sms.len(), 1);
        assert_eq!(sms[0].0, "+233244112233");
        assert!(sms[0].1.contains("GH₵315.00"));
        assert_eq!(sms[0].2, "invoice");

        let emails = sink.emails.lock().unwrap();
        assert_eq!(emails.len(), 1);
        assert!(emails[0].1.contains("INV-2025-00001"));
    }

    #[tokio::test]
    async fn falha_de_entrega_nao_propaga_pelo_despachante() {
        // O dispatch engole o erro do sink: só loga. Se isso mudar um dia,
        // a transação financeira passaria a depender da mensageria.
        let sink = Arc::new(RecordingSink {
            fail_sms: true,
            ..Default::default()
        });
        let service = NotificationService::new(sink.clone());
        service.dispatch_after_commit(vec![invoice_event()]);

        // A task em background não tem como derrubar o chamador; aqui só
        // garantimos que nada foi gravado e que não houve panic.
        tokio::task::yield_now().await;
        assert!(sink.sms.lock().unwrap().is_empty());
    }
}
