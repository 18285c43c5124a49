pub mod appointment_service;
pub use appointment_service::AppointmentService;
pub mod auth;
pub use auth::AuthService;
pub mod billing_service;
pub use billing_service::BillingService;
pub mod crm_service;
pub use crm_service::CrmService;
pub mod inventory_service;
pub use inventory_service::InventoryService;
pub mod notification_service;
pub use notification_service::NotificationService;
pub mod sequence_service;
pub use sequence_service::SequenceService;
pub mod service_request_service;
pub use service_request_service::ServiceRequestService;
pub mod site_service;
pub use site_service::SiteService;
