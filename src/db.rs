pub mod user_repo;
pub use user_repo::UserRepository;
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod receipt_repo;
pub use receipt_repo::ReceiptRepository;
pub mod agent_repo;
pub use agent_repo::AgentRepository;
pub mod bonus_repo;
pub use bonus_repo::BonusRepository;
