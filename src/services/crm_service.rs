// src/services/crm_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, SiteRepository},
    middleware::site::SiteScope,
    models::crm::{Customer, Vehicle},
};

#[derive(Clone)]
pub struct CrmService {
    crm_repo: CrmRepository,
    site_repo: SiteRepository,
}

impl CrmService {
    pub fn new(crm_repo: CrmRepository, site_repo: SiteRepository) -> Self {
        Self {
            crm_repo,
            site_repo,
        }
    }

    // ---
    // Clientes
    // ---

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        self.crm_repo.list_customers().await
    }

    pub async fn get_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.crm_repo
            .find_customer(executor, id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
        phone_number: &str,
        receive_service_reminders: bool,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !scope.can_write() {
            return Err(AppError::SiteWriteForbidden);
        }
        self.crm_repo
            .create_customer(
                executor,
                first_name,
                last_name,
                email,
                phone_number,
                receive_service_reminders,
            )
            .await
    }

    // ---
    // Veículos
    // ---

    pub async fn list_vehicles(&self, scope: &SiteScope) -> Result<Vec<Vehicle>, AppError> {
        self.crm_repo.list_vehicles(scope.visible_site()).await
    }

    pub async fn get_vehicle<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.crm_repo
            .find_vehicle(executor, id, scope.visible_site())
            .await?
            .ok_or(AppError::VehicleNotFound)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_vehicle<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        customer_id: Uuid,
        site_id: Uuid,
        make: &str,
        model: &str,
        year: i32,
        license_plate: &str,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if !scope.can_write_site(site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        let mut tx = executor.begin().await?;

        self.site_repo
            .find_site(&mut *tx, site_id)
            .await?
            .ok_or(AppError::SiteNotFound)?;
        self.crm_repo
            .find_customer(&mut *tx, customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        let vehicle = self
            .crm_repo
            .create_vehicle(
                &mut *tx,
                customer_id,
                site_id,
                make,
                model,
                year,
                license_plate,
            )
            .await?;

        tx.commit().await?;
        Ok(vehicle)
    }
}
