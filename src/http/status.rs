//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! El servidor solo produce cinco respuestas, y todas tienen la forma
//! exacta de una status line (más el challenge `WWW-Authenticate` en el
//! caso 401) seguida de la línea vacía. No se envían otros headers.

/// Códigos de estado que produce el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - Archivo encontrado y acceso concedido
    Ok = 200,

    /// 400 Bad Request - El tokenizer rechazó la petición
    BadRequest = 400,

    /// 401 Unauthorized - Recurso protegido y no se enviaron credenciales
    Unauthorized = 401,

    /// 403 Forbidden - Credenciales enviadas pero no coinciden
    Forbidden = 403,

    /// 404 Not Found - Acceso concedido pero el archivo no se pudo leer
    NotFound = 404,
}

impl StatusCode {
    /// Todos los códigos, en el orden en que se guardan en la arena
    pub const ALL: [StatusCode; 5] = [
        StatusCode::Ok,
        StatusCode::BadRequest,
        StatusCode::Unauthorized,
        StatusCode::Forbidden,
        StatusCode::NotFound,
    ];

    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use staging_server::http::StatusCode;
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
        }
    }

    /// Respuesta completa sin body, tal como se envía por el socket
    pub fn status_line(&self) -> &'static str {
        match self {
            StatusCode::Ok => "HTTP/1.1 200 OK\r\n\r\n",
            StatusCode::BadRequest => "HTTP/1.1 400 Bad Request\r\n\r\n",
            StatusCode::Unauthorized => {
                "HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: Basic realm=\"Access to the staging site\"\r\n\r\n"
            }
            StatusCode::Forbidden => "HTTP/1.1 403 Forbidden\r\n\r\n",
            StatusCode::NotFound => "HTTP/1.1 404 Not Found\r\n\r\n",
        }
    }

    /// Posición dentro de [`StatusCode::ALL`]
    pub fn index(&self) -> usize {
        match self {
            StatusCode::Ok => 0,
            StatusCode::BadRequest => 1,
            StatusCode::Unauthorized => 2,
            StatusCode::Forbidden => 3,
            StatusCode::NotFound => 4,
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::BadRequest.as_u16(), 400);
        assert_eq!(StatusCode::Unauthorized.as_u16(), 401);
        assert_eq!(StatusCode::Forbidden.as_u16(), 403);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
    }

    #[test]
    fn test_status_lines_are_exact() {
        assert_eq!(StatusCode::Ok.status_line(), "HTTP/1.1 200 OK\r\n\r\n");
        assert_eq!(StatusCode::BadRequest.status_line(), "HTTP/1.1 400 Bad Request\r\n\r\n");
        assert_eq!(StatusCode::Forbidden.status_line(), "HTTP/1.1 403 Forbidden\r\n\r\n");
        assert_eq!(StatusCode::NotFound.status_line(), "HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let line = StatusCode::Unauthorized.status_line();
        assert!(line.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
        assert!(line.contains("WWW-Authenticate: Basic realm=\"Access to the staging site\"\r\n"));
        assert!(line.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_index_matches_all() {
        for (i, code) in StatusCode::ALL.iter().enumerate() {
            assert_eq!(code.index(), i);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::Unauthorized.to_string(), "401 Unauthorized");
    }
}
