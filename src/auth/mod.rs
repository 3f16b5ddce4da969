//! # Autenticación
//! src/auth/mod.rs
//!
//! Control de acceso jerárquico estilo `.htpasswd`:
//! - `credentials`: base64 → `user:password` → `user:md5hex(password)`
//! - `access`: recorrido de directorios y comparación de entradas

pub mod access;
pub mod credentials;

pub use access::{check_access, AccessResult, GUARD_FILE_NAME};
