// src/services/site_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SiteRepository,
    middleware::site::SiteScope,
    models::site::{Mechanic, Site},
};

#[derive(Clone)]
pub struct SiteService {
    site_repo: SiteRepository,
}

impl SiteService {
    pub fn new(site_repo: SiteRepository) -> Self {
        Self { site_repo }
    }

    // ---
    // Filiais
    // ---
    // A lista de filiais é visível para qualquer usuário autenticado (o
    // frontend precisa dela para os seletores); criar é só superuser.

    pub async fn list_sites(&self) -> Result<Vec<Site>, AppError> {
        self.site_repo.list_sites().await
    }

    pub async fn create_site<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        name: &str,
        location: &str,
        contact_number: &str,
    ) -> Result<Site, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !scope.is_superuser {
            return Err(AppError::SiteWriteForbidden);
        }
        self.site_repo
            .create_site(executor, name, location, contact_number)
            .await
    }

    // ---
    // Mecânicos
    // ---

    pub async fn list_mechanics(&self, scope: &SiteScope) -> Result<Vec<Mechanic>, AppError> {
        self.site_repo.list_mechanics(scope.visible_site()).await
    }

    pub async fn create_mechanic<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        site_id: Uuid,
        name: &str,
        phone_number: &str,
    ) -> Result<Mechanic, AppError>
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

        let mechanic = self
            .site_repo
            .create_mechanic(&mut *tx, site_id, name, phone_number)
            .await?;

        tx.commit().await?;
        Ok(mechanic)
    }
}
