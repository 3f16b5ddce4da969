//! # Control de Acceso por Directorio
//! src/auth/access.rs
//!
//! Un archivo guardián (`.htpasswd`) protege su directorio y todo lo que
//! cuelga de él. Para decidir el acceso a un archivo se recorre la ruta
//! hacia arriba, desde el directorio del archivo hasta la raíz de
//! documentos, y se usa el **primer** guardián encontrado (el más cercano).
//! Los guardianes nunca se combinan.
//!
//! ## Formato del guardián
//!
//! Entradas separadas por cualquier cantidad de espacios o saltos de línea:
//!
//! ```text
//! user:ee11cbb19052e40b07aac0ca060c23ee
//! admin:5ebe2294ecd0e0f08eab7690d2a6ee69
//! ```
//!
//! No es compatible con los formatos crypt/bcrypt de Apache.

use super::credentials;
use crate::error::ArenaError;
use crate::memory::{fs, Arena, FileRead, Region};
use tracing::debug;

/// Nombre del archivo guardián
pub const GUARD_FILE_NAME: &[u8] = b".htpasswd";

/// Resultado del control de acceso
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    /// Protegido y sin credenciales
    Unauthorized,
    /// Protegido y las credenciales no coinciden (o el guardián no se pudo leer)
    Forbidden,
    /// Sin protección, o credenciales válidas
    Granted,
}

fn last_separator(bytes: &[u8], end: usize) -> Option<usize> {
    bytes[..end].iter().rposition(|b| *b == b'/')
}

/// Busca el guardián más cercano a `path` sin subir por encima de la raíz.
///
/// `root_len` es la longitud del prefijo de la raíz de documentos dentro
/// de `path`; ningún directorio más corto que eso se consulta.
pub fn find_guard(arena: &mut Arena<'_>, path: Region, root_len: usize) -> Result<FileRead, ArenaError> {
    let mut dir_end = match last_separator(arena.bytes(path), path.len()) {
        Some(sep) => sep + 1,
        None => return Ok(FileRead::Missing),
    };

    let scratch = arena.allocate(path.len() + GUARD_FILE_NAME.len(), 1)?;

    while dir_end >= root_len {
        let guard_len = dir_end + GUARD_FILE_NAME.len();
        arena.copy_region(path.truncate(dir_end), scratch, 0);
        arena.bytes_mut(scratch)[dir_end..guard_len].copy_from_slice(GUARD_FILE_NAME);

        let guard_path = scratch.truncate(guard_len);
        let read = fs::read_entire_file(arena, guard_path);
        debug!(
            guard = %String::from_utf8_lossy(arena.bytes(guard_path)),
            found = !matches!(read, FileRead::Missing),
            "guard file lookup"
        );

        if read != FileRead::Missing {
            return Ok(read);
        }

        dir_end = match last_separator(arena.bytes(path), dir_end - 1) {
            Some(sep) => sep + 1,
            None => break,
        };
    }

    Ok(FileRead::Missing)
}

/// ¿Alguna entrada del guardián es exactamente `expected`?
pub fn contains_entry(entries: &[u8], expected: &[u8]) -> bool {
    entries
        .split(|b| b.is_ascii_whitespace())
        .filter(|entry| !entry.is_empty())
        .any(|entry| entry == expected)
}

/// Decide el acceso a `path`.
///
/// Con guardián, el resultado por defecto es `Unauthorized` si no hay
/// credenciales y `Forbidden` si las hay; solo una entrada idéntica a
/// `user:md5hex(password)` lo cambia a `Granted`.
pub fn check_access(
    arena: &mut Arena<'_>,
    path: Region,
    root_len: usize,
    credentials: Option<Region>,
) -> Result<AccessResult, ArenaError> {
    let guard = find_guard(arena, path, root_len)?;

    let entries = match (guard, credentials) {
        (FileRead::Missing, _) => return Ok(AccessResult::Granted),
        (_, None) => return Ok(AccessResult::Unauthorized),
        (FileRead::Unreadable, Some(_)) => return Ok(AccessResult::Forbidden),
        (FileRead::Loaded(entries), Some(_)) => entries,
    };

    let expected = match credentials {
        Some(encoded) => credentials::comparison_string(arena, encoded)?,
        None => None,
    };

    let granted = expected
        .map(|expected| contains_entry(arena.bytes(entries), arena.bytes(expected)))
        .unwrap_or(false);

    Ok(if granted {
        AccessResult::Granted
    } else {
        AccessResult::Forbidden
    })
}
