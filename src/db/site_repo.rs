// src/db/site_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::site::{Mechanic, Site},
};

#[derive(Clone)]
pub struct SiteRepository {
    pool: PgPool,
}

impl SiteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Filiais
    // ---
    // Listagens usam a pool principal; buscas dentro de transação recebem o
    // executor do chamador.

    pub async fn list_sites(&self) -> Result<Vec<Site>, AppError> {
        let sites = sqlx::query_as::<_, Site>("SELECT * FROM sites ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(sites)
    }

    pub async fn find_site<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Site>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let site = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(site)
    }

    pub async fn create_site<'e, E>(
        &self,
        executor: E,
        name: &str,
        location: &str,
        contact_number: &str,
    ) -> Result<Site, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let site = sqlx::query_as::<_, Site>(
            r#"
            INSERT INTO sites (name, location, contact_number)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(location)
        .bind(contact_number)
        .fetch_one(executor)
        .await?;
        Ok(site)
    }

    // ---
    // Mecânicos
    // ---
    // Listagem sempre filtrada pelo escopo do chamador:
    // NULL = enxerga todas as filiais (superuser/matriz).

    pub async fn list_mechanics(&self, scope_site: Option<Uuid>) -> Result<Vec<Mechanic>, AppError> {
        let mechanics = sqlx::query_as::<_, Mechanic>(
            r#"
            SELECT * FROM mechanics
            WHERE ($1::uuid IS NULL OR site_id = $1)
            ORDER BY name ASC
            "#,
        )
        .bind(scope_site)
        .fetch_all(&self.pool)
        .await?;
        Ok(mechanics)
    }

    pub async fn find_mechanic<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        scope_site: Option<Uuid>,
    ) -> Result<Option<Mechanic>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mechanic = sqlx::query_as::<_, Mechanic>(
            r#"
            SELECT * FROM mechanics
            WHERE id = $1 AND ($2::uuid IS NULL OR site_id = $2)
            "#,
        )
        .bind(id)
        .bind(scope_site)
        .fetch_optional(executor)
        .await?;
        Ok(mechanic)
    }

    pub async fn create_mechanic<'e, E>(
        &self,
        executor: E,
        site_id: Uuid,
        name: &str,
        phone_number: &str,
    ) -> Result<Mechanic, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mechanic = sqlx::query_as::<_, Mechanic>(
            r#"
            INSERT INTO mechanics (site_id, name, phone_number)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(site_id)
        .bind(name)
        .bind(phone_number)
        .fetch_one(executor)
        .await?;
        Ok(mechanic)
    }
}
