//! # Módulo HTTP
//!
//! Subconjunto de HTTP/1.x que necesita un servidor de archivos estáticos:
//!
//! - Tokenizer del request line y de los headers `Host` / `Authorization`
//! - Las cinco status lines que el servidor sabe enviar
//! - Ensamblado de la respuesta en la arena del slot
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Host: localhost\r\n
//! Authorization: Basic dXNlcjp1c2Vy\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! Sin headers adicionales; el fin del body lo marca el cierre de la
//! conexión.
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! \r\n
//! <contenido del archivo>
//! ```

pub mod request;   // Tokenizer de requests
pub mod response;  // Respuestas en la arena
pub mod status;    // Status lines

pub use request::{Method, ParseError, Request};
pub use response::{Response, StatusLines};
pub use status::StatusCode;
