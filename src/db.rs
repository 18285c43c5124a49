pub mod appointment_repo;
pub use appointment_repo::AppointmentRepository;
pub mod billing_repo;
pub use billing_repo::BillingRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod sequence_repo;
pub use sequence_repo::SequenceRepository;
pub mod service_request_repo;
pub use service_request_repo::ServiceRequestRepository;
pub mod site_repo;
pub use site_repo::SiteRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
