// src/config.rs

use std::sync::Arc;
use std::{env, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::common::i18n::I18nStore;
use crate::db::{
    AppointmentRepository, BillingRepository, CrmRepository, InventoryRepository,
    SequenceRepository, ServiceRequestRepository, SiteRepository, UserRepository,
};
use crate::services::{
    notification_service::ConsoleSink, AppointmentService, AuthService, BillingService,
    CrmService, InventoryService, NotificationService, SequenceService, ServiceRequestService,
    SiteService,
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub site_service: SiteService,
    pub crm_service: CrmService,
    pub inventory_service: InventoryService,
    pub billing_service: BillingService,
    pub service_request_service: ServiceRequestService,
    pub appointment_service: AppointmentService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, jwt_secret))
    }

    /// Monta o grafo de dependências sobre uma pool já criada (os testes de
    /// integração entram por aqui).
    pub fn with_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let site_repo = SiteRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let sequence_repo = SequenceRepository::new(db_pool.clone());
        let service_request_repo = ServiceRequestRepository::new(db_pool.clone());
        let billing_repo = BillingRepository::new(db_pool.clone());
        let appointment_repo = AppointmentRepository::new(db_pool.clone());

        // --- Serviços ---
        let auth_service = AuthService::new(user_repo, jwt_secret, db_pool.clone());
        let site_service = SiteService::new(site_repo.clone());
        let crm_service = CrmService::new(crm_repo.clone(), site_repo.clone());
        let inventory_service = InventoryService::new(inventory_repo);
        let sequence_service = SequenceService::new(sequence_repo);
        let billing_service = BillingService::new(
            billing_repo.clone(),
            service_request_repo.clone(),
            crm_repo.clone(),
        );
        let service_request_service = ServiceRequestService::new(
            service_request_repo,
            crm_repo.clone(),
            site_repo.clone(),
            billing_repo,
            inventory_service.clone(),
            sequence_service.clone(),
        );
        let appointment_service = AppointmentService::new(
            appointment_repo,
            crm_repo,
            site_repo,
            sequence_service,
            service_request_service.clone(),
        );
        let notification_service = NotificationService::new(Arc::new(ConsoleSink));

        Self {
            db_pool,
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            site_service,
            crm_service,
            inventory_service,
            billing_service,
            service_request_service,
            appointment_service,
            notification_service,
        }
    }
}
