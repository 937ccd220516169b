pub mod agent;
pub mod auth;
pub mod bonus;
pub mod client;
pub mod dashboard;
pub mod payment;
pub mod validation;
