//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! La respuesta se ensambla en la arena del slot como un único rango de
//! bytes contiguo: status line seguida (solo en el caso 200) del contenido
//! del archivo.
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! \r\n
//! <bytes del archivo>
//! ```

use super::StatusCode;
use crate::auth::AccessResult;
use crate::error::ArenaError;
use crate::memory::{fs, Arena, FileRead, Region};

/// Las cinco respuestas pre-renderizadas, residentes en la parte permanente
/// de la arena principal.
#[derive(Debug, Clone, Copy)]
pub struct StatusLines<'a> {
    lines: [&'a [u8]; 5],
}

impl<'a> StatusLines<'a> {
    /// Copia las cinco respuestas al inicio de `arena`, congela esa parte y
    /// devuelve el espacio libre restante.
    pub fn render(mut arena: Arena<'a>) -> Result<(Self, Arena<'a>), ArenaError> {
        let mut regions = [None; 5];
        for code in StatusCode::ALL {
            regions[code.index()] = Some(arena.push_bytes(code.status_line().as_bytes())?);
        }

        let (permanent, free) = arena.freeze()?;
        let lines = regions.map(|region| match region {
            Some(region) => &permanent[region.start()..region.end()],
            None => &permanent[..0],
        });

        Ok((Self { lines }, free))
    }

    pub fn get(&self, status: StatusCode) -> &'a [u8] {
        self.lines[status.index()]
    }
}

/// Respuesta ensamblada en la arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    bytes: Region,
    body_len: usize,
}

impl Response {
    /// Respuesta sin body
    pub fn status_only(
        arena: &mut Arena<'_>,
        lines: &StatusLines<'_>,
        status: StatusCode,
    ) -> Result<Self, ArenaError> {
        let bytes = arena.push_bytes(lines.get(status))?;
        Ok(Self {
            status,
            bytes,
            body_len: 0,
        })
    }

    /// Respuesta según el resultado del control de acceso.
    ///
    /// Con acceso concedido se intenta leer `path` completo en lo que queda
    /// de la arena; si falla, todo lo escrito para el 200 se descarta y se
    /// responde 404. Con `include_body = false` (HEAD) se envía solo la
    /// status line, pero el archivo igual debe poder leerse.
    pub fn for_access(
        arena: &mut Arena<'_>,
        lines: &StatusLines<'_>,
        access: AccessResult,
        path: Region,
        include_body: bool,
    ) -> Result<Self, ArenaError> {
        match access {
            AccessResult::Unauthorized => Self::status_only(arena, lines, StatusCode::Unauthorized),
            AccessResult::Forbidden => Self::status_only(arena, lines, StatusCode::Forbidden),
            AccessResult::Granted => {
                let scope = arena.open_scope();
                match Self::with_file(arena, lines, path, include_body) {
                    Ok(Some(response)) => {
                        arena.commit_scope(scope)?;
                        Ok(response)
                    }
                    Ok(None) => {
                        arena.close_scope(scope)?;
                        Self::status_only(arena, lines, StatusCode::NotFound)
                    }
                    Err(e) => {
                        arena.close_scope(scope)?;
                        Err(e)
                    }
                }
            }
        }
    }

    fn with_file(
        arena: &mut Arena<'_>,
        lines: &StatusLines<'_>,
        path: Region,
        include_body: bool,
    ) -> Result<Option<Self>, ArenaError> {
        let head = arena.push_bytes(lines.get(StatusCode::Ok))?;

        let body = match fs::read_entire_file(arena, path) {
            FileRead::Loaded(body) => body,
            FileRead::Missing | FileRead::Unreadable => return Ok(None),
        };

        let bytes = if include_body { head.join(body) } else { Some(head) };
        Ok(bytes.map(|bytes| Self {
            status: StatusCode::Ok,
            bytes,
            body_len: body.len(),
        }))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Bytes a enviar (status line + body)
    pub fn bytes(&self) -> Region {
        self.bytes
    }

    /// Tamaño del archivo servido
    pub fn body_len(&self) -> usize {
        self.body_len
    }
}
