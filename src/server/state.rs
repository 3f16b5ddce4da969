//! # Estado del Servidor
//! src/server/state.rs
//!
//! Todo lo que el servidor necesita durante su vida, construido una vez al
//! inicio y de solo lectura después (salvo los flags del pool, que son
//! atómicos). La distribución de la memoria está en [`crate::memory`].

use crate::config::Config;
use crate::error::InitError;
use crate::http::StatusLines;
use crate::memory::{Arena, TaskPool, MIN_SLOT_BYTES};
use std::sync::Arc;
use tracing::info;

/// Configuración y recursos compartidos por todas las peticiones
#[derive(Debug)]
pub struct ServerState {
    /// Raíz de documentos, sin `/` final
    root: Vec<u8>,
    port: u16,
    lines: StatusLines<'static>,
    pool: Arc<TaskPool>,
}

impl ServerState {
    /// Valida la configuración, reserva la arena principal, renderiza las
    /// status lines y reparte el resto entre los slots.
    pub fn initialize(config: &Config) -> Result<Self, InitError> {
        config.validate()?;

        let arena = Arena::with_process_lifetime(config.memory_bytes());
        let (lines, free) = StatusLines::render(arena)?;
        let slots = free.split_evenly(config.slots, MIN_SLOT_BYTES)?;
        let slot_bytes = slots.first().map(Arena::capacity).unwrap_or(0);

        let root = config.root().trim_end_matches('/').as_bytes().to_vec();

        info!(
            root = config.root(),
            slots = config.slots,
            slot_bytes,
            "server memory initialized"
        );

        Ok(Self {
            root,
            port: config.port(),
            lines,
            pool: Arc::new(TaskPool::new(slots)),
        })
    }

    pub fn root(&self) -> &[u8] {
        &self.root
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn lines(&self) -> &StatusLines<'static> {
        &self.lines
    }

    pub fn pool(&self) -> &Arc<TaskPool> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArenaError, ConfigError};
    use crate::http::StatusCode;

    fn config(root: &str, slots: usize) -> Config {
        Config {
            root: Some(root.to_string()),
            port: Some(9999),
            slots,
            memory_mb: 1,
            ..Config::default()
        }
    }

    #[test]
    fn test_initialize() {
        let state = ServerState::initialize(&config("/srv/www/", 4)).unwrap();

        assert_eq!(state.root(), b"/srv/www");
        assert_eq!(state.port(), 9999);
        assert_eq!(state.pool().len(), 4);
        assert_eq!(state.pool().in_use(), 0);
        assert_eq!(state.lines().get(StatusCode::NotFound), b"HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[test]
    fn test_root_slash_becomes_empty_prefix() {
        let state = ServerState::initialize(&config("/", 2)).unwrap();
        assert_eq!(state.root(), b"");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = ServerState::initialize(&config("/srv", 0));
        assert!(matches!(result, Err(InitError::Config(ConfigError::Zero(_)))));
    }

    #[test]
    fn test_status_lines_reduce_slot_memory() {
        // 16 slots de exactamente 64 KiB no dejan lugar para las status lines
        let result = ServerState::initialize(&config("/srv", 16));
        assert!(matches!(result, Err(InitError::Memory(ArenaError::TooSmall { .. }))));
    }
}
