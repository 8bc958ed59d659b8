//! Middleware del sistema
//!
//! Autenticación JWT con control de roles, extractores con errores de la
//! API y configuración de CORS.

pub mod auth;
pub mod cors;
pub mod extract;

pub use auth::*;
pub use cors::*;
pub use extract::*;
