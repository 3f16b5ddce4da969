//! # Pipeline de una Conexión
//! src/server/pipeline.rs
//!
//! Procesa una conexión aceptada de principio a fin dentro de la arena de
//! su slot:
//!
//! ```text
//! Receiving → Parsing → Resolving → AccessChecking → Responding → Sending → Done
//! ```
//!
//! Un request inválido salta directo a enviar el 400. Un error de
//! transporte o de capacidad cierra la conexión sin respuesta. En todos
//! los casos la conexión se cierra y el slot vuelve al pool.

use crate::auth::check_access;
use crate::error::{ArenaError, ConnectionError};
use crate::http::{Method, Request, Response, StatusCode};
use crate::memory::{Arena, Region, SlotLease};
use crate::server::state::ServerState;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tamaño del buffer de recepción (un solo `read`)
pub const RECEIVE_BUFFER_BYTES: usize = 8 * 1024;

/// Stream de una conexión
pub trait Transport: Read + Write {
    /// Cierra ambos sentidos de la conexión
    fn close(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// Conexión aceptada: dirección del peer + stream
#[derive(Debug)]
pub struct Connection<S> {
    peer: SocketAddr,
    stream: S,
}

impl<S: Transport> Connection<S> {
    pub fn new(peer: SocketAddr, stream: S) -> Self {
        Self { peer, stream }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

/// Cómo terminó una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Respuesta enviada completa
    Sent { status: StatusCode, bytes: usize },
    /// Conexión cerrada sin respuesta completa
    Dropped,
}

/// Punto de entrada del pipeline; corre una vez por conexión en un worker.
///
/// El lease se consume: al volver, el scope del slot está cerrado y el slot
/// libre, sin importar el resultado.
pub fn handle_connection<S: Transport>(connection: Connection<S>, lease: SlotLease, state: &ServerState) -> Outcome {
    let Connection { peer, mut stream } = connection;
    let started = Instant::now();

    let result = {
        let mut arena = lease.arena();
        exchange(&mut arena, &mut stream, peer, state, started)
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            match &e {
                ConnectionError::Receive(_) => debug!(%peer, error = %e, "connection dropped"),
                ConnectionError::Send(_) | ConnectionError::Capacity(_) => {
                    warn!(%peer, slot = lease.index(), error = %e, "connection dropped")
                }
            }
            Outcome::Dropped
        }
    };

    if let Err(e) = stream.close() {
        debug!(%peer, error = %e, "shutdown failed");
    }
    drop(lease);

    outcome
}

fn exchange<S: Transport>(
    arena: &mut Arena<'_>,
    stream: &mut S,
    peer: SocketAddr,
    state: &ServerState,
    started: Instant,
) -> Result<Outcome, ConnectionError> {
    // Receiving
    let buffer = arena.allocate(RECEIVE_BUFFER_BYTES, 1)?;
    let received = stream
        .read(arena.bytes_mut(buffer))
        .map_err(ConnectionError::Receive)?;
    if received == 0 {
        return Err(ConnectionError::Receive(io::ErrorKind::UnexpectedEof.into()));
    }
    let raw = buffer.truncate(received);

    // Parsing
    let (response, line, path) = match Request::parse(arena.bytes(raw)) {
        Ok(request) => {
            let path = raw.slice(request.path());
            let response = respond(arena, state, raw, &request)?;
            (response, Some((request.method(), request.version())), Some(path))
        }
        Err(e) => {
            debug!(%peer, error = %e, "malformed request");
            let response = Response::status_only(arena, state.lines(), StatusCode::BadRequest)?;
            (response, None, None)
        }
    };

    // Sending
    stream
        .write_all(arena.bytes(response.bytes()))
        .and_then(|_| stream.flush())
        .map_err(ConnectionError::Send)?;

    info!(
        %peer,
        method = line.map(|(m, _)| m.as_str()).unwrap_or("-"),
        path = %path.map(|p| String::from_utf8_lossy(arena.bytes(p))).unwrap_or_default(),
        version = line.map(|(_, v)| v.as_str()).unwrap_or("-"),
        status = response.status().as_u16(),
        bytes = response.bytes().len(),
        body = response.body_len(),
        latency_us = started.elapsed().as_micros() as u64,
        "request served"
    );

    Ok(Outcome::Sent {
        status: response.status(),
        bytes: response.bytes().len(),
    })
}

/// Resolving → AccessChecking → Responding
fn respond(arena: &mut Arena<'_>, state: &ServerState, raw: Region, request: &Request) -> Result<Response, ArenaError> {
    let path = resolve_path(arena, state.root(), raw.slice(request.path()))?;

    // Un header vacío equivale a no enviar credenciales
    let credentials = request
        .credentials()
        .map(|span| raw.slice(span))
        .filter(|region| !region.is_empty());

    let access = check_access(arena, path, state.root().len(), credentials)?;
    debug!(access = ?access, "access checked");

    Response::for_access(arena, state.lines(), access, path, request.method() == Method::GET)
}

/// Concatena `root` con el path del request normalizándolo en el camino.
///
/// Segmentos vacíos y `.` se omiten; `..` quita el último segmento pero
/// nunca sale de `root`. Un `/` final se conserva.
pub fn resolve_path(arena: &mut Arena<'_>, root: &[u8], request_path: Region) -> Result<Region, ArenaError> {
    let resolved = arena.allocate(root.len() + request_path.len() + 1, 1)?;
    let (path, out) = arena.source_and_target(request_path, resolved);

    out[..root.len()].copy_from_slice(root);
    let mut len = root.len();

    for segment in path.split(|b| *b == b'/') {
        match segment {
            b"" | b"." => {}
            b".." => {
                len = out[root.len()..len]
                    .iter()
                    .rposition(|b| *b == b'/')
                    .map_or(root.len(), |sep| root.len() + sep);
            }
            segment => {
                out[len] = b'/';
                out[len + 1..len + 1 + segment.len()].copy_from_slice(segment);
                len += 1 + segment.len();
            }
        }
    }

    if len == root.len() || path.ends_with(b"/") {
        out[len] = b'/';
        len += 1;
    }

    Ok(resolved.truncate(len))
}
