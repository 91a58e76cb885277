pub mod auth;
pub mod contract;
pub mod dao;
pub mod notifier;

pub use auth::AuthService;
pub use contract::ContractService;
pub use dao::*;
pub use notifier::Notifier;
