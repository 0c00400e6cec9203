pub mod auth;
pub mod engagement;
pub mod error;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod repo;
pub mod response;
pub mod routes;
pub mod security;
pub mod storage;

// Re-export commonly used items for tests / external users
pub use routes::{config, AppState};
pub use security::SecurityHeaders;
