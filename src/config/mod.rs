//! # Configuración del Servidor
//! src/config/mod.rs
//!
//! Argumentos CLI y variables de entorno (clap), completados con el archivo
//! de configuración.
//!
//! Precedencia de `port` y `root`: CLI/env > archivo > valor por defecto.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./staging_server --port 8080 --root ./www --workers 4 --slots 8
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 DOCUMENT_ROOT=/srv/www ./staging_server
//! ```

pub mod scanner;

use crate::error::ConfigError;
use crate::memory::MIN_SLOT_BYTES;
use clap::Parser;
use scanner::{ConfigFile, FileLoad};
use std::path::PathBuf;
use tracing::{info, warn};

/// Puerto si nadie lo fija
pub const DEFAULT_PORT: u16 = 8080;

/// Raíz de documentos si nadie la fija
pub const DEFAULT_ROOT: &str = "./www";

/// Configuración del servidor de archivos estáticos
#[derive(Debug, Clone, Parser)]
#[command(name = "staging_server")]
#[command(about = "Servidor HTTP/1.1 de archivos estáticos con control de acceso .htpasswd")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor [default: 8080]
    #[arg(short, long, env = "HTTP_PORT")]
    pub port: Option<u16>,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Raíz de documentos [default: ./www]
    #[arg(short, long, env = "DOCUMENT_ROOT")]
    pub root: Option<String>,

    /// Archivo de configuración (`port: N`, `root: "ruta"`)
    #[arg(short = 'c', long = "config", default_value = "config", env = "SERVER_CONFIG")]
    pub config_file: PathBuf,

    // === Concurrencia y memoria ===

    /// Threads del pool de workers
    #[arg(short, long, default_value = "4", env = "WORKERS")]
    pub workers: usize,

    /// Slots de tarea (peticiones en vuelo)
    #[arg(long, default_value = "8", env = "TASK_SLOTS")]
    pub slots: usize,

    /// Memoria total del servidor en MiB, repartida entre los slots
    #[arg(long = "memory-mb", default_value = "64", env = "SERVER_MEMORY_MB")]
    pub memory_mb: usize,
}

impl Config {
    /// Parsea CLI/env y completa con el archivo de configuración
    pub fn load() -> Self {
        let mut config = Config::parse();
        config.apply_config_file();
        config
    }

    /// Lee `config_file` y rellena los valores que CLI/env no fijaron.
    ///
    /// Un archivo ausente o con errores solo se reporta.
    pub fn apply_config_file(&mut self) {
        match ConfigFile::load(&self.config_file) {
            FileLoad::Loaded(file) => {
                info!(path = %self.config_file.display(), port = ?file.port, root = ?file.root, "config file loaded");
                self.merge(file);
            }
            FileLoad::Missing => {
                warn!(path = %self.config_file.display(), "config file not found, using defaults");
            }
            FileLoad::Invalid(errors) => {
                for error in &errors {
                    warn!(path = %self.config_file.display(), "config scan error: {}", error);
                }
                warn!(count = errors.len(), "config file has errors, none of its values were applied");
            }
        }
    }

    /// Solo completa lo que falta: CLI/env tiene prioridad
    pub fn merge(&mut self, file: ConfigFile) {
        if self.port.is_none() {
            self.port = file.port;
        }
        if self.root.is_none() {
            self.root = file.root;
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn root(&self) -> &str {
        self.root.as_deref().unwrap_or(DEFAULT_ROOT)
    }

    /// Obtiene la dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port())
    }

    pub fn memory_bytes(&self) -> usize {
        self.memory_mb.saturating_mul(1024 * 1024)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        if self.slots == 0 {
            return Err(ConfigError::Zero("task slots"));
        }
        if self.root().is_empty() {
            return Err(ConfigError::EmptyRoot);
        }

        let per_slot = self.memory_bytes() / self.slots;
        if per_slot < MIN_SLOT_BYTES {
            return Err(ConfigError::SlotTooSmall {
                per_slot,
                minimum: MIN_SLOT_BYTES,
            });
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: None,
            host: "127.0.0.1".to_string(),
            root: None,
            config_file: PathBuf::from("config"),
            workers: 4,
            slots: 8,
            memory_mb: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port(), 8080);
        assert_eq!(config.root(), "./www");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.workers, 4);
        assert_eq!(config.slots, 8);
    }

    #[test]
    fn test_address() {
        let mut config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:8080");

        config.host = "0.0.0.0".to_string();
        config.port = Some(3000);
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_cli_arguments() {
        let config = Config::try_parse_from([
            "staging_server",
            "--port",
            "9000",
            "--root",
            "/srv/www",
            "--workers",
            "2",
            "--slots",
            "16",
        ])
        .unwrap();

        assert_eq!(config.port, Some(9000));
        assert_eq!(config.root(), "/srv/www");
        assert_eq!(config.workers, 2);
        assert_eq!(config.slots, 16);
    }

    // ==================== Precedencia ====================

    #[test]
    fn test_file_fills_unset_values() {
        let mut config = Config::default();
        config.merge(ConfigFile {
            port: Some(7000),
            root: Some("/from/file".to_string()),
        });

        assert_eq!(config.port(), 7000);
        assert_eq!(config.root(), "/from/file");
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = Config::default();
        config.port = Some(9000);
        config.merge(ConfigFile {
            port: Some(7000),
            root: Some("/from/file".to_string()),
        });

        assert_eq!(config.port(), 9000);
        assert_eq!(config.root(), "/from/file");
    }

    #[test]
    fn test_apply_config_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "// staging\nport: 4321\nroot: \"/srv/site/\"\n").unwrap();

        let mut config = Config {
            config_file: path,
            ..Config::default()
        };
        config.apply_config_file();

        assert_eq!(config.port(), 4321);
        assert_eq!(config.root(), "/srv/site");
    }

    #[test]
    fn test_invalid_config_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "port: 4321\nhost: \"x\"\n").unwrap();

        let mut config = Config {
            config_file: path,
            ..Config::default()
        };
        config.apply_config_file();

        assert_eq!(config.port(), DEFAULT_PORT);
    }

    // ==================== Validación ====================

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_workers() {
        let mut config = Config::default();
        config.workers = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("workers")));
    }

    #[test]
    fn test_validate_zero_slots() {
        let mut config = Config::default();
        config.slots = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("task slots")));
    }

    #[test]
    fn test_validate_empty_root() {
        let mut config = Config::default();
        config.root = Some(String::new());
        assert_eq!(config.validate(), Err(ConfigError::EmptyRoot));
    }

    #[test]
    fn test_validate_slot_too_small() {
        let mut config = Config::default();
        config.memory_mb = 1;
        config.slots = 32;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::SlotTooSmall { per_slot: 32768, minimum: MIN_SLOT_BYTES })
        ));
    }
}
