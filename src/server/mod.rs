//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! 1. `tcp`: escucha y acepta conexiones
//! 2. `dispatch`: pool de workers que ejecuta cada conexión una vez
//! 3. `pipeline`: procesa una conexión dentro de la arena de su slot
//! 4. `state`: configuración y memoria compartidas, fijas desde el inicio

pub mod dispatch;
pub mod pipeline;
pub mod state;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use dispatch::{Dispatcher, WorkerPool};
pub use pipeline::{handle_connection, Connection, Outcome};
pub use state::ServerState;
pub use tcp::Server;
