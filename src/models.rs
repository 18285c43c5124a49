pub mod appointments;
pub mod auth;
pub mod billing;
pub mod crm;
pub mod events;
pub mod inventory;
pub mod sequence;
pub mod service_requests;
pub mod site;
