// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Sites & Mecânicos ---
        handlers::sites::list_sites,
        handlers::sites::create_site,
        handlers::sites::list_mechanics,
        handlers::sites::create_mechanic,

        // --- CRM ---
        handlers::crm::list_customers,
        handlers::crm::create_customer,
        handlers::crm::get_customer,
        handlers::crm::list_vehicles,
        handlers::crm::create_vehicle,
        handlers::crm::get_vehicle,

        // --- INVENTORY ---
        handlers::inventory::list_products,
        handlers::inventory::create_product,
        handlers::inventory::list_inventory,
        handlers::inventory::create_inventory,
        handlers::inventory::get_inventory,
        handlers::inventory::list_inventory_transactions,
        handlers::inventory::stock_entry,
        handlers::inventory::adjust_stock,

        // --- SERVICE REQUESTS ---
        handlers::service_requests::list_service_requests,
        handlers::service_requests::create_service_request,
        handlers::service_requests::get_service_request,
        handlers::service_requests::update_service_request,
        handlers::service_requests::delete_service_request,
        handlers::service_requests::complete_service_request,
        handlers::service_requests::add_product_usage,
        handlers::service_requests::list_product_usages,
        handlers::service_requests::list_service_types,
        handlers::service_requests::create_service_type,

        // --- INVOICES ---
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::update_invoice,

        // --- PROMOTIONS ---
        handlers::promotions::list_promotions,
        handlers::promotions::create_promotion,
        handlers::promotions::get_promotion,

        // --- APPOINTMENTS ---
        handlers::appointments::list_appointments,
        handlers::appointments::create_appointment,
        handlers::appointments::get_appointment,
        handlers::appointments::update_appointment_status,
        handlers::appointments::convert_appointment,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Sites ---
            models::site::Site,
            models::site::Mechanic,
            handlers::sites::CreateSitePayload,
            handlers::sites::CreateMechanicPayload,

            // --- CRM ---
            models::crm::Customer,
            models::crm::Vehicle,
            handlers::crm::CreateCustomerPayload,
            handlers::crm::CreateVehiclePayload,

            // --- Inventory ---
            models::inventory::ProductCategory,
            models::inventory::UnitOfMeasure,
            models::inventory::Product,
            models::inventory::Inventory,
            models::inventory::TransactionKind,
            models::inventory::InventoryTransaction,
            handlers::inventory::CreateProductPayload,
            handlers::inventory::CreateInventoryPayload,
            handlers::inventory::StockEntryPayload,
            handlers::inventory::AdjustStockPayload,

            // --- Service Requests ---
            models::service_requests::TransactionType,
            models::service_requests::ServiceStatus,
            models::service_requests::ServiceType,
            models::service_requests::ServiceRequest,
            models::service_requests::ProductUsage,
            handlers::service_requests::CreateServiceRequestPayload,
            handlers::service_requests::UpdateServiceRequestPayload,
            handlers::service_requests::CompleteServiceRequestPayload,
            handlers::service_requests::CompletionResponse,
            handlers::service_requests::AddProductUsagePayload,
            handlers::service_requests::CreateServiceTypePayload,

            // --- Billing ---
            models::billing::PaymentMethod,
            models::billing::Promotion,
            models::billing::Invoice,
            models::billing::InvoiceListEntry,
            handlers::invoices::UpdateInvoicePayload,
            handlers::promotions::CreatePromotionPayload,

            // --- Appointments ---
            models::appointments::AppointmentStatus,
            models::appointments::Appointment,
            handlers::appointments::CreateAppointmentPayload,
            handlers::appointments::UpdateAppointmentStatusPayload,
            handlers::appointments::ConvertAppointmentPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Sites", description = "Filiais e Mecânicos"),
        (name = "CRM", description = "Clientes e Veículos"),
        (name = "Inventory", description = "Catálogo, Saldos e Movimentações de Estoque"),
        (name = "ServiceRequests", description = "Ordens de Serviço, Vendas e Conclusão"),
        (name = "Invoices", description = "Faturas e Pagamentos"),
        (name = "Promotions", description = "Promoções e Descontos"),
        (name = "Appointments", description = "Agendamentos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
