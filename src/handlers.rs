pub mod agents;
pub mod auth;
pub mod bonuses;
pub mod clients;
pub mod dashboard;
pub mod documents;
pub mod payments;
pub mod users;
