// Cálculos puros
pub mod bonus;
pub mod ledger;
pub mod metrics;
pub mod schedule;
pub mod status;

// Serviços com estado
pub mod agent_service;
pub mod auth;
pub mod bonus_service;
pub mod client_service;
pub mod dashboard_service;
pub mod document_service;
pub mod payment_service;
pub mod user_service;
pub mod webhook;
