//! # Staging Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 de archivos estáticos. Cada petición se procesa
//! completa dentro de una arena de tamaño fijo reclamada de un pool, y el
//! acceso se controla con archivos `.htpasswd` por directorio.
//!
//! ## Arquitectura
//!
//! - `memory`: arena con scopes anidados, pool de slots y lectura de archivos
//! - `http`: tokenizer de requests, status lines y respuestas en la arena
//! - `auth`: decodificación de credenciales y recorrido de guardianes
//! - `server`: accept loop, pool de workers y pipeline por conexión
//! - `config`: CLI/env y archivo de configuración
//! - `error`: tipos de error
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use staging_server::config::Config;
//! use staging_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config).expect("Error al iniciar servidor");
//! server.run().expect("Error en el accept loop");
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod server;
