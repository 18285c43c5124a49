// src/services/appointment_service.rs

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AppointmentRepository, CrmRepository, SiteRepository},
    middleware::site::SiteScope,
    models::appointments::{Appointment, AppointmentStatus},
    services::{
        sequence_service::{SequenceService, PREFIX_APPOINTMENT, SHORT_WIDTH},
        service_request_service::{CreateServiceRequest, ServiceRequestService},
    },
};

#[derive(Clone)]
pub struct AppointmentService {
    repo: AppointmentRepository,
    crm_repo: CrmRepository,
    site_repo: SiteRepository,
    sequence_service: SequenceService,
    service_request_service: ServiceRequestService,
}

impl AppointmentService {
    pub fn new(
        repo: AppointmentRepository,
        crm_repo: CrmRepository,
        site_repo: SiteRepository,
        sequence_service: SequenceService,
        service_request_service: ServiceRequestService,
    ) -> Self {
        Self {
            repo,
            crm_repo,
            site_repo,
            sequence_service,
            service_request_service,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        customer_id: Uuid,
        vehicle_id: Uuid,
        site_id: Uuid,
        mechanic_id: Option<Uuid>,
        scheduled_date: NaiveDate,
        scheduled_time: NaiveTime,
        duration_minutes: i32,
        notes: &str,
    ) -> Result<Appointment, AppError>
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
        self.crm_repo
            .find_vehicle(&mut *tx, vehicle_id, scope.visible_site())
            .await?
            .ok_or(AppError::VehicleNotFound)?;
        if let Some(mechanic_id) = mechanic_id {
            let mechanic = self
                .site_repo
                .find_mechanic(&mut *tx, mechanic_id, scope.visible_site())
                .await?
                .ok_or(AppError::MechanicNotFound)?;
            if mechanic.site_id != site_id {
                return Err(AppError::MechanicNotFound);
            }
        }

        let display_number = self
            .sequence_service
            .next_display_number(&mut *tx, PREFIX_APPOINTMENT, SHORT_WIDTH)
            .await?;

        let appointment = self
            .repo
            .create(
                &mut *tx,
                &display_number,
                customer_id,
                vehicle_id,
                site_id,
                mechanic_id,
                scheduled_date,
                scheduled_time,
                duration_minutes,
                notes,
            )
            .await?;

        tx.commit().await?;
        Ok(appointment)
    }

    pub async fn list(&self, scope: &SiteScope) -> Result<Vec<Appointment>, AppError> {
        self.repo.list(scope.visible_site()).await
    }

    pub async fn get<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_scoped(executor, id, scope.visible_site())
            .await?
            .ok_or(AppError::AppointmentNotFound)
    }

    /// Move o status do agendamento. Estados terminais (concluído,
    /// cancelado, não compareceu) não voltam atrás.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let appointment = self
            .repo
            .find_scoped(&mut *tx, id, scope.visible_site())
            .await?
            .ok_or(AppError::AppointmentNotFound)?;

        if appointment.status.is_terminal() {
            return Err(AppError::AppointmentTerminal);
        }
        if !scope.can_write_site(appointment.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        let updated = self.repo.set_status(&mut *tx, appointment.id, status).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Converte o agendamento em OS: cria a ordem pela API de mutação do
    /// Job/Sale (invariantes inclusos) e grava o vínculo.
    pub async fn convert<'e, E>(
        &self,
        executor: E,
        scope: &SiteScope,
        id: Uuid,
        description: &str,
        service_type_id: Option<Uuid>,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let appointment = self
            .repo
            .find_scoped(&mut *tx, id, scope.visible_site())
            .await?
            .ok_or(AppError::AppointmentNotFound)?;

        if appointment.status.is_terminal() {
            return Err(AppError::AppointmentTerminal);
        }
        if appointment.service_request_id.is_some() {
            return Err(AppError::AppointmentAlreadyConverted);
        }
        if !scope.can_write_site(appointment.site_id) {
            return Err(AppError::SiteWriteForbidden);
        }

        let record = self
            .service_request_service
            .create(
                &mut *tx,
                scope,
                CreateServiceRequest {
                    customer_id: appointment.customer_id,
                    vehicle_id: Some(appointment.vehicle_id),
                    site_id: appointment.site_id,
                    service_type_id,
                    description: description.to_string(),
                    assigned_mechanic_id: appointment.mechanic_id,
                    status: None,
                    labor_cost: Decimal::ZERO,
                    transaction_type: None,
                },
            )
            .await?;

        let updated = self
            .repo
            .link_service_request(&mut *tx, appointment.id, record.id)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use sqlx::PgPool;

    use crate::test_support::{setup_workshop, WorkshopFixture};

    async fn create_appointment(f: &WorkshopFixture, pool: &PgPool) -> Appointment {
        f.state
            .appointment_service
            .create(
                pool,
                &f.superuser,
                f.customer.id,
                f.vehicle.id,
                f.site_a.id,
                None,
                NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
                NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
                60,
                "Revisão de 10.000 km",
            )
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn agendamento_recebe_numero_apt(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let appointment = create_appointment(&f, &pool).await;

        let year = chrono::Utc::now().year();
        assert_eq!(appointment.display_number, format!("APT-{}-0001", year));
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    }

    #[sqlx::test]
    async fn estado_terminal_nao_volta_atras(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let appointment = create_appointment(&f, &pool).await;

        f.state
            .appointment_service
            .set_status(&pool, &f.superuser, appointment.id, AppointmentStatus::Cancelled)
            .await
            .unwrap();

        let err = f
            .state
            .appointment_service
            .set_status(&pool, &f.superuser, appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AppointmentTerminal));
    }

    #[sqlx::test]
    async fn conversao_cria_os_vinculada_e_nao_repete(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let appointment = create_appointment(&f, &pool).await;

        let converted = f
            .state
            .appointment_service
            .convert(&pool, &f.superuser, appointment.id, "Revisão completa", None)
            .await
            .unwrap();

        assert!(converted.service_request_id.is_some());
        assert_eq!(converted.status, AppointmentStatus::InProgress);

        let record = f
            .state
            .service_request_service
            .get(&pool, &f.superuser, converted.service_request_id.unwrap())
            .await
            .unwrap();
        assert_eq!(record.vehicle_id, Some(f.vehicle.id));
        assert!(record.display_number.starts_with("SR-"));

        let err = f
            .state
            .appointment_service
            .convert(&pool, &f.superuser, appointment.id, "De novo", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AppointmentAlreadyConverted));
    }
}
