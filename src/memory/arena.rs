//! # Arena de Memoria
//! src/memory/arena.rs
//!
//! Allocator tipo "bump" sobre un rango fijo de bytes. Las asignaciones solo
//! avanzan el offset `used`; no existe liberación individual. La única forma
//! de recuperar memoria es cerrar un [`Scope`], que restaura `used` al valor
//! que tenía cuando se abrió.
//!
//! Las asignaciones se devuelven como [`Region`] (offset + longitud) en lugar
//! de referencias, así varias regiones pueden coexistir mientras la arena se
//! sigue usando de forma mutable.
//!
//! ```
//! use staging_server::memory::Arena;
//!
//! let mut buffer = vec![0u8; 64];
//! let mut arena = Arena::new(&mut buffer);
//!
//! let scope = arena.open_scope();
//! let hello = arena.push_bytes(b"hello").unwrap();
//! assert_eq!(arena.bytes(hello), b"hello");
//! arena.close_scope(scope).unwrap();
//! assert_eq!(arena.used(), 0);
//! ```

use crate::error::ArenaError;
use std::ops::Range;

/// Rango asignado dentro de una arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    start: usize,
    len: usize,
}

impl Region {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Sub-región a partir de un rango relativo al inicio de esta región
    ///
    /// Se usa para convertir los spans que devuelve el tokenizer HTTP
    /// en regiones de la arena.
    pub fn slice(&self, range: Range<usize>) -> Region {
        debug_assert!(range.start <= range.end && range.end <= self.len);
        Region {
            start: self.start + range.start,
            len: range.end - range.start,
        }
    }

    /// Primeros `len` bytes de la región
    pub fn truncate(&self, len: usize) -> Region {
        self.slice(0..len.min(self.len))
    }

    /// Une dos regiones contiguas (`self` seguida de `next`)
    pub fn join(&self, next: Region) -> Option<Region> {
        (self.end() == next.start).then(|| Region {
            start: self.start,
            len: self.len + next.len,
        })
    }
}

/// Marca de un scope abierto
///
/// No es `Clone`: un scope se cierra una sola vez.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "un scope abierto debe cerrarse con Arena::close_scope"]
pub struct Scope {
    mark: usize,
    depth: usize,
}

/// Bump allocator sobre un buffer prestado
pub struct Arena<'a> {
    buf: &'a mut [u8],
    used: usize,
    open_scopes: usize,
}

impl<'a> Arena<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            used: 0,
            open_scopes: 0,
        }
    }

    /// Reserva un buffer para toda la vida del proceso y construye la arena
    /// principal sobre él.
    pub fn with_process_lifetime(capacity: usize) -> Arena<'static> {
        let buf: &'static mut [u8] = Box::leak(vec![0u8; capacity].into_boxed_slice());
        Arena::new(buf)
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.used
    }

    pub fn open_scopes(&self) -> usize {
        self.open_scopes
    }

    /// Asigna `size` bytes alineados a `align` (potencia de dos).
    ///
    /// La alineación es relativa al inicio del buffer de la arena.
    /// Falla sin modificar la arena si la región no cabe.
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<Region, ArenaError> {
        if align == 0 || !align.is_power_of_two() {
            return Err(ArenaError::BadAlignment(align));
        }

        let start = (self.used + align - 1) & !(align - 1);
        let end = start.checked_add(size).filter(|end| *end <= self.buf.len());

        match end {
            Some(end) => {
                self.used = end;
                Ok(Region { start, len: size })
            }
            None => Err(ArenaError::Exhausted {
                requested: size,
                remaining: self.remaining(),
            }),
        }
    }

    /// Copia `bytes` en una región nueva
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<Region, ArenaError> {
        let region = self.allocate(bytes.len(), 1)?;
        self.bytes_mut(region).copy_from_slice(bytes);
        Ok(region)
    }

    /// Escribe `prefix` seguido del contenido de `tail` (que ya vive en esta
    /// arena) en una región nueva.
    pub fn push_concat(&mut self, prefix: &[u8], tail: Region) -> Result<Region, ArenaError> {
        let region = self.allocate(prefix.len() + tail.len, 1)?;
        self.buf[region.start..region.start + prefix.len()].copy_from_slice(prefix);
        self.buf
            .copy_within(tail.start..tail.end(), region.start + prefix.len());
        Ok(region)
    }

    /// Copia una región existente dentro de otra, a partir de `offset`
    pub fn copy_region(&mut self, src: Region, dst: Region, offset: usize) {
        debug_assert!(offset + src.len <= dst.len);
        self.buf.copy_within(src.start..src.end(), dst.start + offset);
    }

    pub fn bytes(&self, region: Region) -> &[u8] {
        debug_assert!(region.end() <= self.used, "region outlived its scope");
        &self.buf[region.start..region.end()]
    }

    pub fn bytes_mut(&mut self, region: Region) -> &mut [u8] {
        debug_assert!(region.end() <= self.used, "region outlived its scope");
        &mut self.buf[region.start..region.end()]
    }

    /// Presta una región para lectura y otra posterior para escritura.
    ///
    /// `target` debe empezar después de que termina `source`, que es el
    /// caso natural en un bump allocator (lo escrito se asignó después).
    pub fn source_and_target(&mut self, source: Region, target: Region) -> (&[u8], &mut [u8]) {
        assert!(source.end() <= target.start, "target must follow source");
        let (head, tail) = self.buf.split_at_mut(target.start);
        (&head[source.start..source.end()], &mut tail[..target.len])
    }

    /// Abre un scope anidado: todo lo asignado después se descarta al cerrarlo
    pub fn open_scope(&mut self) -> Scope {
        let scope = Scope {
            mark: self.used,
            depth: self.open_scopes,
        };
        self.open_scopes += 1;
        scope
    }

    /// Cierra el scope más interno y restaura `used`.
    ///
    /// Cerrar un scope externo mientras hay uno interno abierto es un error;
    /// la arena queda intacta en ese caso.
    pub fn close_scope(&mut self, scope: Scope) -> Result<(), ArenaError> {
        let expected = self.open_scopes.checked_sub(1).ok_or(ArenaError::ScopeOrder {
            expected: 0,
            found: scope.depth,
        })?;

        if scope.depth != expected {
            return Err(ArenaError::ScopeOrder {
                expected,
                found: scope.depth,
            });
        }

        self.used = scope.mark;
        self.open_scopes = expected;
        Ok(())
    }

    /// Cierra el scope más interno conservando lo asignado dentro de él.
    ///
    /// Las regiones pasan a pertenecer al scope que lo contenía.
    pub fn commit_scope(&mut self, scope: Scope) -> Result<(), ArenaError> {
        let used = self.used;
        self.close_scope(scope)?;
        self.used = used;
        Ok(())
    }

    /// Separa lo ya asignado (inmutable desde ahora) del espacio libre, que
    /// se devuelve como una arena nueva.
    pub fn freeze(self) -> Result<(&'a [u8], Arena<'a>), ArenaError> {
        if self.open_scopes > 0 {
            return Err(ArenaError::OpenScopes(self.open_scopes));
        }

        let Arena { buf, used, .. } = self;
        let (permanent, free) = buf.split_at_mut(used);
        Ok((permanent, Arena::new(free)))
    }

    /// Divide toda la capacidad libre en `count` sub-arenas del mismo tamaño.
    ///
    /// Cada sub-arena debe tener al menos `minimum` bytes.
    pub fn split_evenly(self, count: usize, minimum: usize) -> Result<Vec<Arena<'a>>, ArenaError> {
        let (_, free) = self.freeze()?;
        let per_slot = if count == 0 { 0 } else { free.capacity() / count };

        if count == 0 || per_slot < minimum {
            return Err(ArenaError::TooSmall {
                available: per_slot,
                minimum,
            });
        }

        let Arena { buf, .. } = free;
        Ok(buf
            .chunks_exact_mut(per_slot)
            .take(count)
            .map(Arena::new)
            .collect())
    }
}

impl std::fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("used", &self.used)
            .field("open_scopes", &self.open_scopes)
            .finish()
    }
}
