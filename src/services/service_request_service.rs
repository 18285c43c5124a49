// src/services/service_request_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BillingRepository, CrmRepository, ServiceRequestRepository, SiteRepository},
    middleware::site::SiteScope,
    models::{
        billing::Invoice,
        events::DomainEvent,
        service_requests::{
            ProductUsage, ServiceRequest, ServiceStatus, TransactionType, UsageLine,
        },
    },
    services::{
        billing_service,
        inventory_service::InventoryService,
        sequence_service::{
            SequenceService, INVOICE_WIDTH, PREFIX_INVOICE, PREFIX_SALE, PREFIX_SERVICE,
            SHORT_WIDTH,
        },
    },
};

// Campos aceitos na criação de uma OS/venda.
#[derive(Debug, Clone)]
pub struct CreateServiceRequest {
    pub customer_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub site_id: Uuid,
    pub service_type_id: Option<Uuid>,
    pub description: String,
    pub assigned_mechanic_id: Option<Uuid>,
    pub status: Option<ServiceStatus>,
    pub labor_cost: Decimal,
    // Tipo declarado pelo cliente (opcional). Quando presente, precisa bater
    // com o discriminador real (presença de veículo).
    pub transaction_type: Option<TransactionType>,
}

// Campos aceitos no PATCH. Ausente (None) = não mexe.
#[derive(Debug, Clone, Default)]
pub struct UpdateServiceRequest {
    pub site_id: Option<Uuid>,
    pub service_type_id: Option<Uuid>,
    pub description: Option<String>,
    pub assigned_mechanic_id: Option<Uuid>,
    pub status: Option<ServiceStatus>,
    pub labor_cost: Option<Decimal>,
}

// Opções do endpoint de conclusão.
#[derive(Debug, Clone, Default)]
pub struct CompleteOptions {
    pub promotion_id: Option<Uuid>,
    pub discount_amount: Option<Decimal>,
    pub labor_cost: Option<Decimal>,
}

// O que a conclusão devolve: registro terminal, fatura e os eventos que o
// despachante de notificações consome depois do commit.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub record: ServiceRequest,
    pub invoice: Invoice,
    pub events: Vec<DomainEvent>,
}

#[derive(Clone)]
pub struct ServiceRequestService {
    repo: ServiceRequestRepository,
    crm_repo: CrmRepository,
    site_repo: SiteRepository,
    billing_repo: BillingRepository,
    inventory_service: InventoryService,
    sequence_service: SequenceService,
}

impl ServiceRequestService {
    pub fn new(
        repo: ServiceRequestRepository,
        crm_repo: CrmRepository,
        site_repo: SiteRepository,
        billing_repo: BillingRepository,
        inventory_service: InventoryService,
        sequence_service: SequenceService,
    ) -> Self {
        Self {
            repo,
            crm_repo,
            site_repo,
            billing_repo,
            inventory_service,
            sequence_service,
        }
    }

    // ---
    // Invariante venda x serviço
    // ---
    // Sem veículo = venda balcão: não pode ter tipo de serviço, mecânico nem
    // mão de obra. A regra mora AQUI, na API de mutação, e não só na
    // validação HTTP: PATCH parcial nenhum contrabandeia mão de obra para
    // dentro de uma venda.
    fn enforce_discriminator(
        declared: Option<TransactionType>,
        vehicle_id: Option<Uuid>,
        service_type_id: Option<Uuid>,
        assigned_mechanic_id: Option<Uuid>,
        labor_cost: Decimal,
    ) -> Result<TransactionType, AppError> {
        // Tipo declarado tem que bater com a presença de veículo.
        match (declared, vehicle_id) {
            (Some(TransactionType::Service), None) => {
                return Err(AppError::ServiceRequiresVehicle)
            }
            (Some(TransactionType::Sale), Some(_)) => {
                return Err(AppError::SaleFieldNotAllowed("vehicleId"))
            }
            _ => {}
        }

        match vehicle_id {
            Some(_) => Ok(TransactionType::Service),
            None => {
                if service_type_id.is_some() {
                    return Err(AppError::SaleFieldNotAllowed("serviceType"));
                }
                if assigned_mechanic_id.is_some() {
                    return Err(AppError::SaleFieldNotAllowed("assignedMechanic"));
                }
                if labor_cost > Decimal::ZERO {
                    return Err(AppError::SaleFieldNotAllowed("laborCost"));
                }
                Ok(TransactionType::Sale)
            }
        }
    }

    // ---
    // Tipos de serviço
    // ---

    pub async fn list_service_types(
        &self,
    ) -> Result<Vec<crate::models::service_requests::ServiceType>, AppError> {
        self.repo.list_service_types().await
    }

    pub async fn create_service_type<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        category: &str,
        name: &str,
    ) -> Result<crate::models::service_requests::ServiceType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !scope.can_write() {
            return Err(AppError::SiteWriteForbidden);
        }
        self.repo.create_service_type(executor, category, name).await
    }

    // ---
    // CRUD
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        payload: CreateServiceRequest,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if !scope.can_write_site(payload.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        let transaction_type = Self::enforce_discriminator(
            payload.transaction_type,
            payload.vehicle_id,
            payload.service_type_id,
            payload.assigned_mechanic_id,
            payload.labor_cost,
        )?;

        let mut tx = executor.begin().await?;

        // Referências precisam existir (e estar visíveis ao chamador).
        self.site_repo
            .find_site(&mut *tx, payload.site_id)
            .await?
            .ok_or(AppError::SiteNotFound)?;
        self.crm_repo
            .find_customer(&mut *tx, payload.customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;
        if let Some(vehicle_id) = payload.vehicle_id {
            self.crm_repo
                .find_vehicle(&mut *tx, vehicle_id, scope.visible_site())
                .await?
                .ok_or(AppError::VehicleNotFound)?;
        }
        if let Some(service_type_id) = payload.service_type_id {
            self.repo
                .find_service_type(&mut *tx, service_type_id)
                .await?
                .ok_or(AppError::ServiceTypeNotFound)?;
        }
        if let Some(mechanic_id) = payload.assigned_mechanic_id {
            let mechanic = self
                .site_repo
                .find_mechanic(&mut *tx, mechanic_id, scope.visible_site())
                .await?
                .ok_or(AppError::MechanicNotFound)?;
            // Mecânico de outra filial não atende esta OS.
            if mechanic.site_id != payload.site_id {
                return Err(AppError::MechanicNotFound);
            }
        }

        // Número legível conforme o tipo: SR-AAAA-0042 ou SALE-AAAA-0007.
        // Alocado na mesma transação do INSERT: rollback devolve o número.
        let prefix = match transaction_type {
            TransactionType::Sale => PREFIX_SALE,
            TransactionType::Service => PREFIX_SERVICE,
        };
        let display_number = self
            .sequence_service
            .next_display_number(&mut *tx, prefix, SHORT_WIDTH)
            .await?;

        let record = self
            .repo
            .create(
                &mut *tx,
                &display_number,
                transaction_type,
                payload.customer_id,
                payload.vehicle_id,
                payload.site_id,
                payload.service_type_id,
                &payload.description,
                payload.assigned_mechanic_id,
                payload.status.unwrap_or(ServiceStatus::Pending),
                payload.labor_cost,
            )
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    pub async fn list(
        &self,
        scope: &SiteScope,
        parts_only: bool,
    ) -> Result<Vec<ServiceRequest>, AppError> {
        self.repo.list(scope.visible_site(), parts_only).await
    }

    pub async fn get<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_scoped(executor, id, scope.visible_site())
            .await?
            .ok_or(AppError::ServiceRequestNotFound)
    }

    /// PATCH dos campos mutáveis. Devolve também os eventos pós-commit
    /// (atribuição de mecânico dispara notificação).
    pub async fn update<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
        patch: UpdateServiceRequest,
    ) -> Result<(ServiceRequest, Vec<DomainEvent>), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut record = self
            .repo
            .find_scoped_for_update(&mut *tx, id, scope.visible_site())
            .await?
            .ok_or(AppError::ServiceRequestNotFound)?;

        // Registro terminal é imutável.
        if record.is_completed() {
            return Err(AppError::CompletedImmutable);
        }
        if !scope.can_write_site(record.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        // Troca de filial: só superuser, e a filial precisa existir.
        if let Some(new_site) = patch.site_id {
            if new_site != record.site_id {
                if !scope.is_superuser {
                    return Err(AppError::CrossSiteForbidden);
                }
                self.site_repo
                    .find_site(&mut *tx, new_site)
                    .await?
                    .ok_or(AppError::SiteNotFound)?;
                record.site_id = new_site;
            }
        }

        // Status COMPLETED só pelo endpoint de conclusão.
        if let Some(status) = patch.status {
            if status == ServiceStatus::Completed {
                return Err(AppError::ManualCompletionForbidden);
            }
            record.status = status;
        }

        if let Some(description) = patch.description {
            record.description = description;
        }
        if let Some(labor_cost) = patch.labor_cost {
            record.labor_cost = labor_cost.max(Decimal::ZERO);
        }
        if let Some(service_type_id) = patch.service_type_id {
            self.repo
                .find_service_type(&mut *tx, service_type_id)
                .await?
                .ok_or(AppError::ServiceTypeNotFound)?;
            record.service_type_id = Some(service_type_id);
        }

        let mechanic_changed = match patch.assigned_mechanic_id {
            Some(mechanic_id) if record.assigned_mechanic_id != Some(mechanic_id) => {
                let mechanic = self
                    .site_repo
                    .find_mechanic(&mut *tx, mechanic_id, scope.visible_site())
                    .await?
                    .ok_or(AppError::MechanicNotFound)?;
                if mechanic.site_id != record.site_id {
                    return Err(AppError::MechanicNotFound);
                }
                record.assigned_mechanic_id = Some(mechanic_id);
                Some(mechanic)
            }
            _ => None,
        };

        // Revalida o discriminador sobre o estado final (não o parcial).
        Self::enforce_discriminator(
            None,
            record.vehicle_id,
            record.service_type_id,
            record.assigned_mechanic_id,
            record.labor_cost,
        )?;

        let updated = self.repo.update(&mut *tx, &record).await?;

        // Evento de atribuição montado ainda na transação.
        let mut events = Vec::new();
        if let Some(mechanic) = mechanic_changed {
            let customer = self
                .crm_repo
                .find_customer(&mut *tx, updated.customer_id)
                .await?
                .ok_or(AppError::CustomerNotFound)?;
            let vehicle_display = match updated.vehicle_id {
                Some(vehicle_id) => self
                    .crm_repo
                    .find_vehicle(&mut *tx, vehicle_id, None)
                    .await?
                    .map(|v| v.display()),
                None => None,
            };
            events.push(DomainEvent::MechanicAssigned {
                service_request_id: updated.id,
                display_number: updated.display_number.clone(),
                mechanic_name: mechanic.name,
                mechanic_phone: mechanic.phone_number,
                customer_name: customer.full_name(),
                vehicle_display,
                description: updated.description.clone(),
            });
        }

        tx.commit().await?;
        Ok((updated, events))
    }

    pub async fn delete<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let record = self
            .repo
            .find_scoped_for_update(&mut *tx, id, scope.visible_site())
            .await?
            .ok_or(AppError::ServiceRequestNotFound)?;

        if record.is_completed() {
            return Err(AppError::CompletedImmutable);
        }
        if !scope.can_write_site(record.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        self.repo.delete(&mut *tx, record.id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ---
    // Itens de produto
    // ---

    pub async fn add_usage<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        service_request_id: Uuid,
        product_id: Uuid,
        quantity_used: i32,
    ) -> Result<ProductUsage, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let record = self
            .repo
            .find_scoped_for_update(&mut *tx, service_request_id, scope.visible_site())
            .await?
            .ok_or(AppError::ServiceRequestNotFound)?;

        // OS concluída não ganha itens novos.
        if record.is_completed() {
            return Err(AppError::CompletedImmutable);
        }
        if !scope.can_write_site(record.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        let product = self.inventory_service.get_product(&mut *tx, product_id).await?;

        let usage = self
            .repo
            .add_usage(&mut *tx, record.id, product.id, quantity_used)
            .await?;

        tx.commit().await?;
        Ok(usage)
    }

    pub async fn list_usages<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        service_request_id: Uuid,
    ) -> Result<Vec<ProductUsage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_scoped(executor, service_request_id, scope.visible_site())
            .await?
            .ok_or(AppError::ServiceRequestNotFound)?;

        self.repo.list_usages(service_request_id).await
    }

    // ---
    // CONCLUSÃO (o orquestrador)
    // ---
    //
    // Transição terminal de uma OS/venda: débito de estoque linha a linha,
    // preço, fatura com número INV e status COMPLETED, tudo em UMA transação.
    // Qualquer falha no meio (estoque insuficiente, promoção inexistente,
    // sequência indisponível) aborta o conjunto: nenhuma baixa parcial,
    // nenhuma fatura órfã, nenhum status trocado.
    //
    // As notificações NÃO participam da transação: saem como eventos na
    // resposta e o despachante roda depois do commit.
    pub async fn complete<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
        options: CompleteOptions,
    ) -> Result<CompletionOutcome, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Carrega a OS sob lock de linha. Duas conclusões concorrentes da
        //    mesma OS serializam aqui; a perdedora enxerga COMPLETED e sai
        //    com AlreadyCompleted, sem efeito nenhum.
        let record = self
            .repo
            .find_scoped_for_update(&mut *tx, id, scope.visible_site())
            .await?
            .ok_or(AppError::ServiceRequestNotFound)?;

        if record.is_completed() {
            return Err(AppError::AlreadyCompleted);
        }
        if !scope.can_write_site(record.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        // 2. Override de mão de obra: negativo é CLAMPADO a zero (não é
        //    erro), persistido antes do cálculo de preço.
        let labor_cost = match options.labor_cost {
            Some(value) => {
                let clamped = value.max(Decimal::ZERO);
                if record.transaction_type == TransactionType::Sale && clamped > Decimal::ZERO {
                    return Err(AppError::SaleFieldNotAllowed("laborCost"));
                }
                self.repo.set_labor_cost(&mut *tx, record.id, clamped).await?;
                clamped
            }
            None => record.labor_cost,
        };

        // 3. Débito do estoque, linha a linha, na MESMA transação. A primeira
        //    falha (sem registro / saldo insuficiente) propaga e desfaz as
        //    baixas já feitas nesta chamada.
        let site = self
            .site_repo
            .find_site(&mut *tx, record.site_id)
            .await?
            .ok_or(AppError::SiteNotFound)?;

        let lines: Vec<UsageLine> = self.repo.list_usage_lines(&mut *tx, record.id).await?;
        for line in &lines {
            let notes = format!("Baixa por conclusão de {}", record.display_number);
            self.inventory_service
                .debit(
                    &mut *tx,
                    line.product_id,
                    record.site_id,
                    line.quantity_used,
                    &line.product_name,
                    &site.name,
                    "product_usage",
                    Some(line.id),
                    Some(scope.user_id),
                    &notes,
                )
                .await?;
        }

        // 4. Preço: promoção (se informada, precisa existir) ou desconto
        //    manual, que sobrepõe.
        let promotion = match options.promotion_id {
            Some(promotion_id) => Some(
                self.billing_repo
                    .find_promotion(&mut *tx, promotion_id)
                    .await?
                    .ok_or(AppError::PromotionNotFound)?,
            ),
            None => None,
        };
        let pricing = billing_service::price(
            &lines,
            labor_cost,
            promotion.as_ref(),
            options.discount_amount,
        );

        // 5. Fatura com número INV-AAAA-00001 alocado nesta transação.
        let invoice_number = self
            .sequence_service
            .next_display_number(&mut *tx, PREFIX_INVOICE, INVOICE_WIDTH)
            .await?;
        let invoice = self
            .billing_repo
            .create_invoice(
                &mut *tx,
                &invoice_number,
                record.id,
                pricing.subtotal,
                pricing.discount,
                pricing.total,
                promotion.as_ref().map(|p| p.id),
            )
            .await?;

        // 6. Status terminal + carimbo de última revisão no veículo (o
        //    colaborador de lembretes lê essa data).
        self.repo
            .set_status(&mut *tx, record.id, ServiceStatus::Completed)
            .await?;
        if let Some(vehicle_id) = record.vehicle_id {
            self.crm_repo.stamp_last_serviced(&mut *tx, vehicle_id).await?;
        }

        // Dados das notificações, lidos ainda dentro da transação.
        let customer = self
            .crm_repo
            .find_customer(&mut *tx, record.customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;
        let vehicle_display = match record.vehicle_id {
            Some(vehicle_id) => self
                .crm_repo
                .find_vehicle(&mut *tx, vehicle_id, None)
                .await?
                .map(|v| v.display()),
            None => None,
        };
        let record = self
            .repo
            .find_scoped(&mut *tx, record.id, None)
            .await?
            .ok_or(AppError::ServiceRequestNotFound)?;

        // 7. Commit. Só a partir daqui a conclusão existe para o mundo.
        tx.commit().await?;

        // 8. Eventos pós-commit: fatura emitida + pronto para retirada.
        //    Falha de entrega é problema do despachante (loga e segue);
        //    a transação financeira JÁ aconteceu e não volta atrás.
        let events = vec![
            DomainEvent::InvoiceIssued {
                invoice_id: invoice.id,
                display_number: invoice.display_number.clone(),
                customer_name: customer.full_name(),
                customer_phone: customer.phone_number.clone(),
                customer_email: customer.email.clone(),
                vehicle_display: vehicle_display.clone(),
                total_cost: invoice.total_cost,
            },
            DomainEvent::ReadyForPickup {
                service_request_id: record.id,
                display_number: record.display_number.clone(),
                customer_name: customer.full_name(),
                customer_phone: customer.phone_number,
                vehicle_display,
            },
        ];

        Ok(CompletionOutcome {
            record,
            invoice,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use sqlx::PgPool;

    use crate::db::InventoryRepository;
    use crate::models::events::DomainEvent;
    use crate::models::inventory::TransactionKind;
    use crate::test_support::{dec, seed_product_with_stock, setup_workshop, WorkshopFixture};

    async fn create_service_record(
        f: &WorkshopFixture,
        pool: &PgPool,
    ) -> ServiceRequest {
        f.state
            .service_request_service
            .create(
                pool,
                &f.superuser,
                CreateServiceRequest {
                    customer_id: f.customer.id,
                    vehicle_id: Some(f.vehicle.id),
                    site_id: f.site_a.id,
                    service_type_id: None,
                    description: "Troca de pastilhas".into(),
                    assigned_mechanic_id: None,
                    status: None,
                    labor_cost: dec("0"),
                    transaction_type: None,
                },
            )
            .await
            .unwrap()
    }

    async fn invoice_count(pool: &PgPool, service_request_id: uuid::Uuid) -> i64 {
        sqlx::query_scalar("SELECT count(*) FROM invoices WHERE service_request_id = $1")
            .bind(service_request_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn criacao_gera_numero_legivel_por_tipo(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let year = chrono::Utc::now().year();

        let service = create_service_record(&f, &pool).await;
        assert_eq!(service.display_number, format!("SR-{}-0001", year));
        assert_eq!(service.transaction_type, TransactionType::Service);
        assert_eq!(service.status, ServiceStatus::Pending);

        let sale = f
            .state
            .service_request_service
            .create(
                &pool,
                &f.superuser,
                CreateServiceRequest {
                    customer_id: f.customer.id,
                    vehicle_id: None,
                    site_id: f.site_a.id,
                    service_type_id: None,
                    description: "Venda de pastilhas".into(),
                    assigned_mechanic_id: None,
                    status: None,
                    labor_cost: dec("0"),
                    transaction_type: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(sale.display_number, format!("SALE-{}-0001", year));
        assert_eq!(sale.transaction_type, TransactionType::Sale);
    }

    #[sqlx::test]
    async fn venda_balcao_nao_aceita_mao_de_obra(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        let err = f
            .state
            .service_request_service
            .create(
                &pool,
                &f.superuser,
                CreateServiceRequest {
                    customer_id: f.customer.id,
                    vehicle_id: None,
                    site_id: f.site_a.id,
                    service_type_id: None,
                    description: "Venda".into(),
                    assigned_mechanic_id: None,
                    status: None,
                    labor_cost: dec("10.00"),
                    transaction_type: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SaleFieldNotAllowed("laborCost")));
    }

    #[sqlx::test]
    async fn tipo_declarado_precisa_bater_com_o_veiculo(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        // SERVICE declarado sem veículo: rejeitado.
        let err = f
            .state
            .service_request_service
            .create(
                &pool,
                &f.superuser,
                CreateServiceRequest {
                    customer_id: f.customer.id,
                    vehicle_id: None,
                    site_id: f.site_a.id,
                    service_type_id: None,
                    description: "Serviço sem veículo".into(),
                    assigned_mechanic_id: None,
                    status: None,
                    labor_cost: dec("0"),
                    transaction_type: Some(TransactionType::Service),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceRequiresVehicle));

        // SALE declarado com veículo: também rejeitado.
        let err = f
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
                    description: "Venda com veículo".into(),
                    assigned_mechanic_id: None,
                    status: None,
                    labor_cost: dec("0"),
                    transaction_type: Some(TransactionType::Sale),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SaleFieldNotAllowed("vehicleId")));
    }

    #[sqlx::test]
    async fn usuario_de_matriz_nao_cria_os(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        let err = f
            .state
            .service_request_service
            .create(
                &pool,
                &f.hq_user,
                CreateServiceRequest {
                    customer_id: f.customer.id,
                    vehicle_id: Some(f.vehicle.id),
                    site_id: f.site_a.id,
                    service_type_id: None,
                    description: "Teste".into(),
                    assigned_mechanic_id: None,
                    status: None,
                    labor_cost: dec("0"),
                    transaction_type: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SiteWriteForbidden));
    }

    #[sqlx::test]
    async fn conclusao_baixa_estoque_emite_fatura_e_fecha(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;
        let year = chrono::Utc::now().year();

        f.state
            .service_request_service
            .add_usage(&pool, &f.superuser, record.id, f.product.id, 2)
            .await
            .unwrap();

        let outcome = f
            .state
            .service_request_service
            .complete(
                &pool,
                &f.superuser,
                record.id,
                CompleteOptions {
                    labor_cost: Some(dec("50.00")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Cenário do contrato: 150.00 x 2 + 50.00 = 350.00, sem desconto.
        assert_eq!(outcome.invoice.subtotal, dec("350.00"));
        assert_eq!(outcome.invoice.discount_amount, dec("0"));
        assert_eq!(outcome.invoice.total_cost, dec("350.00"));
        assert_eq!(
            outcome.invoice.display_number,
            format!("INV-{}-00001", year)
        );
        assert!(!outcome.invoice.paid);
        assert_eq!(outcome.record.status, ServiceStatus::Completed);
        assert_eq!(outcome.record.labor_cost, dec("50.00"));

        // Estoque: 10 - 2 = 8, com UMA movimentação de saída de -2.
        let inventory_repo = InventoryRepository::new(pool.clone());
        let inventory = inventory_repo
            .find_inventory(&pool, f.inventory.id, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory.quantity_on_hand, 8);

        let movements = inventory_repo.list_transactions(f.inventory.id).await.unwrap();
        let outs: Vec<_> = movements
            .iter()
            .filter(|m| m.kind == TransactionKind::Out)
            .collect();
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].quantity, -2);
        assert_eq!(outs[0].reference_type, "product_usage");

        // Veículo carimbado para o colaborador de lembretes.
        let vehicle = f
            .state
            .crm_service
            .get_vehicle(&pool, &f.superuser, f.vehicle.id)
            .await
            .unwrap();
        assert!(vehicle.last_serviced.is_some());

        // Eventos pós-commit: fatura emitida + pronto para retirada.
        assert_eq!(outcome.events.len(), 2);
        assert!(matches!(outcome.events[0], DomainEvent::InvoiceIssued { .. }));
        assert!(matches!(outcome.events[1], DomainEvent::ReadyForPickup { .. }));
    }

    #[sqlx::test]
    async fn conclusao_com_promocao_de_dez_por_cento(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        f.state
            .service_request_service
            .add_usage(&pool, &f.superuser, record.id, f.product.id, 2)
            .await
            .unwrap();

        let promotion = f
            .state
            .billing_service
            .create_promotion(
                &pool,
                &f.superuser,
                "Semana do freio",
                "",
                chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
                Some(dec("10.00")),
                None,
            )
            .await
            .unwrap();

        let outcome = f
            .state
            .service_request_service
            .complete(
                &pool,
                &f.superuser,
                record.id,
                CompleteOptions {
                    promotion_id: Some(promotion.id),
                    labor_cost: Some(dec("50.00")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.invoice.subtotal, dec("350.00"));
        assert_eq!(outcome.invoice.discount_amount, dec("35.00"));
        assert_eq!(outcome.invoice.total_cost, dec("315.00"));
        assert_eq!(outcome.invoice.promotion_id, Some(promotion.id));
    }

    #[sqlx::test]
    async fn estoque_insuficiente_aborta_sem_efeitos(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        // Produto B com 1 em estoque, pedido de 5.
        let (product_b, inventory_b) =
            seed_product_with_stock(&pool, f.site_a.id, "Filtro de óleo", "40.00", 1).await;

        f.state
            .service_request_service
            .add_usage(&pool, &f.superuser, record.id, product_b.id, 5)
            .await
            .unwrap();

        let err = f
            .state
            .service_request_service
            .complete(&pool, &f.superuser, record.id, CompleteOptions::default())
            .await
            .unwrap_err();

        match err {
            AppError::InsufficientStock {
                product,
                have,
                need,
            } => {
                assert_eq!(product, "Filtro de óleo");
                assert_eq!(have, 1);
                assert_eq!(need, 5);
            }
            other => panic!("erro inesperado: {:?}", other),
        }

        // Nada mudou: saldo intacto, nenhuma fatura, status não-terminal.
        let inventory_repo = InventoryRepository::new(pool.clone());
        let inventory = inventory_repo
            .find_inventory(&pool, inventory_b.id, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory.quantity_on_hand, 1);
        assert_eq!(invoice_count(&pool, record.id).await, 0);

        let reloaded = f
            .state
            .service_request_service
            .get(&pool, &f.superuser, record.id)
            .await
            .unwrap();
        assert_eq!(reloaded.status, ServiceStatus::Pending);
    }

    #[sqlx::test]
    async fn falha_na_segunda_linha_nao_debita_a_primeira(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        // Linha 1 tem saldo de sobra; linha 2 não tem.
        let (product_b, _) =
            seed_product_with_stock(&pool, f.site_a.id, "Correia dentada", "90.00", 1).await;

        f.state
            .service_request_service
            .add_usage(&pool, &f.superuser, record.id, f.product.id, 2)
            .await
            .unwrap();
        f.state
            .service_request_service
            .add_usage(&pool, &f.superuser, record.id, product_b.id, 5)
            .await
            .unwrap();

        let err = f
            .state
            .service_request_service
            .complete(&pool, &f.superuser, record.id, CompleteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));

        // A primeira linha NÃO pode ter ficado debitada pela metade.
        let inventory_repo = InventoryRepository::new(pool.clone());
        let inventory_a = inventory_repo
            .find_inventory(&pool, f.inventory.id, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory_a.quantity_on_hand, 10);
        assert!(inventory_repo
            .list_transactions(f.inventory.id)
            .await
            .unwrap()
            .iter()
            .all(|m| m.kind != TransactionKind::Out));
        assert_eq!(invoice_count(&pool, record.id).await, 0);
    }

    #[sqlx::test]
    async fn produto_sem_registro_de_estoque_na_filial(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        // Produto existe no catálogo, mas sem registro na filial A.
        let (product_c, _) =
            seed_product_with_stock(&pool, f.site_b.id, "Vela de ignição", "30.00", 4).await;

        f.state
            .service_request_service
            .add_usage(&pool, &f.superuser, record.id, product_c.id, 1)
            .await
            .unwrap();

        let err = f
            .state
            .service_request_service
            .complete(&pool, &f.superuser, record.id, CompleteOptions::default())
            .await
            .unwrap_err();

        match err {
            AppError::NoStockRecord { product, site } => {
                assert_eq!(product, "Vela de ignição");
                assert_eq!(site, f.site_a.name);
            }
            other => panic!("erro inesperado: {:?}", other),
        }
        assert_eq!(invoice_count(&pool, record.id).await, 0);
    }

    #[sqlx::test]
    async fn segunda_conclusao_e_sinal_de_idempotencia(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        f.state
            .service_request_service
            .add_usage(&pool, &f.superuser, record.id, f.product.id, 2)
            .await
            .unwrap();

        f.state
            .service_request_service
            .complete(&pool, &f.superuser, record.id, CompleteOptions::default())
            .await
            .unwrap();

        let err = f
            .state
            .service_request_service
            .complete(&pool, &f.superuser, record.id, CompleteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyCompleted));

        // Sem fatura nova e sem débito novo.
        assert_eq!(invoice_count(&pool, record.id).await, 1);
        let inventory_repo = InventoryRepository::new(pool.clone());
        let inventory = inventory_repo
            .find_inventory(&pool, f.inventory.id, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory.quantity_on_hand, 8);
    }

    #[sqlx::test]
    async fn mao_de_obra_negativa_e_clampada_a_zero(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        f.state
            .service_request_service
            .add_usage(&pool, &f.superuser, record.id, f.product.id, 1)
            .await
            .unwrap();

        let outcome = f
            .state
            .service_request_service
            .complete(
                &pool,
                &f.superuser,
                record.id,
                CompleteOptions {
                    labor_cost: Some(dec("-100.00")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.record.labor_cost, dec("0"));
        assert_eq!(outcome.invoice.subtotal, dec("150.00"));
    }

    #[sqlx::test]
    async fn escopo_esconde_os_de_outra_filial(pool: PgPool) {
        let f = setup_workshop(&pool).await;

        // OS na filial B, criada pelo superuser.
        let record_b = f
            .state
            .service_request_service
            .create(
                &pool,
                &f.superuser,
                CreateServiceRequest {
                    customer_id: f.customer.id,
                    vehicle_id: None,
                    site_id: f.site_b.id,
                    service_type_id: None,
                    description: "Na filial B".into(),
                    assigned_mechanic_id: None,
                    status: None,
                    labor_cost: dec("0"),
                    transaction_type: None,
                },
            )
            .await
            .unwrap();

        // Usuário da filial A não enxerga (404, não 403: nem sabe que existe).
        let err = f
            .state
            .service_request_service
            .complete(&pool, &f.site_a_user, record_b.id, CompleteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceRequestNotFound));

        // Usuário de matriz enxerga, mas não escreve.
        let err = f
            .state
            .service_request_service
            .complete(&pool, &f.hq_user, record_b.id, CompleteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SiteWriteForbidden));
    }

    #[sqlx::test]
    async fn registro_concluido_e_imutavel(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        f.state
            .service_request_service
            .complete(&pool, &f.superuser, record.id, CompleteOptions::default())
            .await
            .unwrap();

        let err = f
            .state
            .service_request_service
            .update(
                &pool,
                &f.superuser,
                record.id,
                UpdateServiceRequest {
                    description: Some("Editando".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CompletedImmutable));

        let err = f
            .state
            .service_request_service
            .add_usage(&pool, &f.superuser, record.id, f.product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CompletedImmutable));

        let err = f
            .state
            .service_request_service
            .delete(&pool, &f.superuser, record.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CompletedImmutable));
    }

    #[sqlx::test]
    async fn troca_de_filial_exige_superuser(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        let err = f
            .state
            .service_request_service
            .update(
                &pool,
                &f.site_a_user,
                record.id,
                UpdateServiceRequest {
                    site_id: Some(f.site_b.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CrossSiteForbidden));

        let (updated, _) = f
            .state
            .service_request_service
            .update(
                &pool,
                &f.superuser,
                record.id,
                UpdateServiceRequest {
                    site_id: Some(f.site_b.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.site_id, f.site_b.id);
    }

    #[sqlx::test]
    async fn patch_nao_conclui_por_status(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        let err = f
            .state
            .service_request_service
            .update(
                &pool,
                &f.superuser,
                record.id,
                UpdateServiceRequest {
                    status: Some(ServiceStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ManualCompletionForbidden));
    }

    #[sqlx::test]
    async fn atribuir_mecanico_gera_evento_uma_vez(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let record = create_service_record(&f, &pool).await;

        let mechanic = f
            .state
            .site_service
            .create_mechanic(&pool, &f.superuser, f.site_a.id, "Yaw Boateng", "+233209876543")
            .await
            .unwrap();

        let (_, events) = f
            .state
            .service_request_service
            .update(
                &pool,
                &f.superuser,
                record.id,
                UpdateServiceRequest {
                    assigned_mechanic_id: Some(mechanic.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DomainEvent::MechanicAssigned { .. }));

        // Repetir o mesmo mecânico não dispara de novo.
        let (_, events) = f
            .state
            .service_request_service
            .update(
                &pool,
                &f.superuser,
                record.id,
                UpdateServiceRequest {
                    assigned_mechanic_id: Some(mechanic.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(events.is_empty());
    }
}
