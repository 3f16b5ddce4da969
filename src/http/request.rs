//! # Tokenizer de Requests HTTP
//! src/http/request.rs
//!
//! Parser a nivel de bytes. No copia nada: el resultado son rangos
//! (`Span`) relativos al buffer recibido, que el pipeline convierte en
//! regiones de la arena del slot.
//!
//! ## Formato aceptado
//!
//! ```text
//! GET /path?query HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Authorization: Basic dXNlcjp1c2Vy\r\n
//! \r\n
//! ```
//!
//! Del header `Authorization` se quita el esquema `Basic` (sin importar
//! mayúsculas); lo que queda son las credenciales codificadas en base64,
//! posiblemente vacías.

use std::ops::Range;
use thiserror::Error;

/// Rango de bytes dentro del buffer parseado
pub type Span = Range<usize>;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Como GET pero sin body
    HEAD,
}

impl Method {
    fn from_bytes(s: &[u8]) -> Result<Self, ParseError> {
        match s {
            b"GET" => Ok(Method::GET),
            b"HEAD" => Ok(Method::HEAD),
            _ => Err(ParseError::UnsupportedMethod(lossy(s))),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
        }
    }
}

/// Versiones aceptadas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
        }
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,

    /// Falta el fin de línea o la línea vacía que cierra los headers
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    /// Formato inválido de la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Método HTTP no soportado
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// El path no es absoluto
    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    /// Versión HTTP no soportada
    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Header malformado
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Request parseado; todos los campos son rangos dentro del buffer original
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: Span,
    query: Option<Span>,
    version: HttpVersion,
    host: Option<Span>,
    credentials: Option<Span>,
}

const CRLF: &[u8] = b"\r\n";

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

/// Recorta espacios y tabs de ambos extremos del rango
const BASIC: &[u8] = b"basic";

/// `Basic` seguido de espacio, tab o nada (payload vacío)
fn has_basic_scheme(value: &[u8]) -> bool {
    value.len() >= BASIC.len()
        && value[..BASIC.len()].eq_ignore_ascii_case(BASIC)
        && value.get(BASIC.len()).map_or(true, |b| matches!(b, b' ' | b'\t'))
}

fn trim(buffer: &[u8], mut span: Span) -> Span {
    while span.start < span.end && matches!(buffer[span.start], b' ' | b'\t') {
        span.start += 1;
    }
    while span.end > span.start && matches!(buffer[span.end - 1], b' ' | b'\t') {
        span.end -= 1;
    }
    span
}

impl Request {
    /// Parsea un request desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use staging_server::http::Request;
    ///
    /// let raw = b"GET /docs/index.html?v=2 HTTP/1.1\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(&raw[request.path()], b"/docs/index.html");
    /// assert_eq!(&raw[request.query().unwrap()], b"v=2");
    /// assert!(request.credentials().is_none());
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ParseError::EmptyRequest);
        }

        // 1. Request line
        let line_end = find(buffer, CRLF, 0).ok_or(ParseError::IncompleteRequest)?;
        let (method, path, query, version) = Self::parse_request_line(buffer, 0..line_end)?;

        let mut request = Request {
            method,
            path,
            query,
            version,
            host: None,
            credentials: None,
        };

        // 2. Headers hasta la línea vacía
        let mut cursor = line_end + CRLF.len();
        loop {
            let end = find(buffer, CRLF, cursor).ok_or(ParseError::IncompleteRequest)?;
            if end == cursor {
                break;
            }
            request.parse_header(buffer, cursor..end)?;
            cursor = end + CRLF.len();
        }

        Ok(request)
    }

    /// Formato: `METHOD /path?query VERSION`, separados por un espacio
    fn parse_request_line(
        buffer: &[u8],
        line: Span,
    ) -> Result<(Method, Span, Option<Span>, HttpVersion), ParseError> {
        let bytes = &buffer[line.clone()];
        if bytes.iter().any(|b| b.is_ascii_control()) {
            return Err(ParseError::InvalidRequestLine);
        }

        let parts: Vec<Span> = bytes
            .split(|b| *b == b' ')
            .scan(line.start, |offset, part| {
                let span = *offset..*offset + part.len();
                *offset += part.len() + 1;
                Some(span)
            })
            .collect();

        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_bytes(&buffer[parts[0].clone()])?;

        let target = parts[1].clone();
        if buffer[target.start] != b'/' {
            return Err(ParseError::InvalidPath(lossy(&buffer[target])));
        }
        let (path, query) = match buffer[target.clone()].iter().position(|b| *b == b'?') {
            Some(q) => (target.start..target.start + q, Some(target.start + q + 1..target.end)),
            None => (target, None),
        };

        let version = match &buffer[parts[2].clone()] {
            b"HTTP/1.0" => HttpVersion::Http10,
            b"HTTP/1.1" => HttpVersion::Http11,
            other => return Err(ParseError::InvalidHttpVersion(lossy(other))),
        };

        Ok((method, path, query, version))
    }

    /// Cada header tiene formato: "Name: Value"
    fn parse_header(&mut self, buffer: &[u8], line: Span) -> Result<(), ParseError> {
        let colon = buffer[line.clone()]
            .iter()
            .position(|b| *b == b':')
            .ok_or_else(|| ParseError::InvalidHeader(lossy(&buffer[line.clone()])))?;

        let name = &buffer[line.start..line.start + colon];
        let value = trim(buffer, line.start + colon + 1..line.end);

        if name.eq_ignore_ascii_case(b"host") {
            self.host = Some(value);
        } else if name.eq_ignore_ascii_case(b"authorization") {
            let credentials = if has_basic_scheme(&buffer[value.clone()]) {
                trim(buffer, value.start + BASIC.len()..value.end)
            } else {
                value
            };
            self.credentials = Some(credentials);
        }

        Ok(())
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path sin query string
    pub fn path(&self) -> Span {
        self.path.clone()
    }

    pub fn query(&self) -> Option<Span> {
        self.query.clone()
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn host(&self) -> Option<Span> {
        self.host.clone()
    }

    /// Credenciales en base64, ya sin el esquema `Basic `
    pub fn credentials(&self) -> Option<Span> {
        self.credentials.clone()
    }
}
