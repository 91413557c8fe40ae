//! The Transport Adapter (§4, §6): maps HTTP requests onto
//! Session Manager operations with uniform error mapping. Carries no
//! business logic of its own.

pub mod dto;
pub mod error;
pub mod routes;

pub use routes::router;
