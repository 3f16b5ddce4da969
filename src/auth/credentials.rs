//! # Decodificación de Credenciales
//! src/auth/credentials.rs
//!
//! Transforma las credenciales Basic en la forma en que se guardan en los
//! archivos guardián:
//!
//! ```text
//! base64(user:password) -> user:password -> user:md5hex(password)
//! ```
//!
//! Todo el trabajo ocurre en la arena del slot. El hasher es nuevo en cada
//! llamada, así que no queda estado entre peticiones.

use crate::error::ArenaError;
use crate::memory::{Arena, Region};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use md5::{Digest, Md5};

/// Longitud del digest MD5 en hexadecimal
pub const DIGEST_HEX_LEN: usize = 32;

/// Decodifica `encoded` y construye la cadena de comparación `user:<hex>`.
///
/// Retorna `Ok(None)` si el base64 es inválido o el texto plano no tiene
/// `:`; esas credenciales nunca pueden coincidir con una entrada.
pub fn comparison_string(arena: &mut Arena<'_>, encoded: Region) -> Result<Option<Region>, ArenaError> {
    let capacity = encoded.len().div_ceil(4) * 3;
    let scratch = arena.allocate(capacity, 1)?;

    let decoded = {
        let (input, output) = arena.source_and_target(encoded, scratch);
        match STANDARD.decode_slice(input, output) {
            Ok(len) => len,
            Err(_) => return Ok(None),
        }
    };
    let plain = scratch.truncate(decoded);

    // Se parte en el primer ':'; el usuario no puede contenerlo
    let colon = match arena.bytes(plain).iter().position(|b| *b == b':') {
        Some(colon) => colon,
        None => return Ok(None),
    };
    let digest = Md5::digest(&arena.bytes(plain)[colon + 1..]);

    let user_len = colon + 1;
    let comparison = arena.allocate(user_len + DIGEST_HEX_LEN, 1)?;
    arena.copy_region(plain.truncate(user_len), comparison, 0);

    if hex::encode_to_slice(digest, &mut arena.bytes_mut(comparison)[user_len..]).is_err() {
        return Ok(None);
    }

    Ok(Some(comparison))
}
