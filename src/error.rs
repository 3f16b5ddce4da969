//! # Tipos de Error
//! src/error.rs
//!
//! Taxonomía de errores del servidor. Ninguno de estos errores termina el
//! proceso: cada uno se resuelve en una respuesta enviada (o una conexión
//! cerrada) y un slot liberado.

use thiserror::Error;

/// Errores de la arena de memoria
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// La asignación no cabe en la capacidad restante
    #[error("arena exhausted: requested {requested} bytes, {remaining} remaining")]
    Exhausted { requested: usize, remaining: usize },

    /// La alineación pedida no es potencia de dos
    #[error("alignment {0} is not a power of two")]
    BadAlignment(usize),

    /// Se intentó cerrar un scope que no es el más interno
    #[error("scope closed out of order: expected depth {expected}, got {found}")]
    ScopeOrder { expected: usize, found: usize },

    /// Operación que requiere que no haya scopes abiertos
    #[error("{0} scope(s) still open")]
    OpenScopes(usize),

    /// No hay memoria suficiente para repartir entre los slots
    #[error("sub-arena of {available} bytes is below the minimum of {minimum}")]
    TooSmall { available: usize, minimum: usize },
}

/// Errores durante la inicialización del servidor
#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("server memory: {0}")]
    Memory(#[from] ArenaError),

    #[error("bind failed: {0}")]
    Bind(#[from] std::io::Error),

    #[error("worker thread could not be started: {0}")]
    Spawn(std::io::Error),
}

/// Errores de configuración
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be >= 1")]
    Zero(&'static str),

    #[error("{per_slot} bytes per task slot is below the minimum of {minimum}")]
    SlotTooSmall { per_slot: usize, minimum: usize },

    #[error("document root must not be empty")]
    EmptyRoot,
}

/// Errores de una conexión individual
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Falló la lectura del socket o el peer cerró sin enviar nada
    #[error("receive failed: {0}")]
    Receive(std::io::Error),

    /// Falló el envío de la respuesta (se registra, no se reintenta)
    #[error("send failed: {0}")]
    Send(std::io::Error),

    /// La arena del slot se agotó procesando esta petición
    #[error("request exceeded its task arena: {0}")]
    Capacity(#[from] ArenaError),
}
