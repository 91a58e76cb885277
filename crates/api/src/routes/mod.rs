pub mod admin;
pub mod auth;
pub mod collaboration;
pub mod contract;
pub mod post;
