//! # Archivo de Configuración
//! src/config/scanner.rs
//!
//! Lenguaje mínimo para fijar puerto y raíz de documentos:
//!
//! ```text
//! // comentario hasta fin de línea
//! port: 8080
//! root: "/srv/www/"
//! ```
//!
//! El scanner reporta todos los errores con fila y columna. Si hubo al
//! menos uno, ningún token se aplica. Los valores posteriores sobrescriben
//! a los anteriores.

use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;
use thiserror::Error;

/// Tipo de token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Port,
    Root,
    Colon,
    Str(String),
    Integer(u16),
}

/// Token con su posición (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub row: u32,
    pub column: u32,
}

/// Errores de escaneo
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("unknown identifier `{name}` ({row}, {column})")]
    UnknownIdentifier { name: String, row: u32, column: u32 },

    #[error("unterminated string ({row}, {column})")]
    UnterminatedString { row: u32, column: u32 },

    #[error("newline before end of string ({row}, {column})")]
    NewlineInString { row: u32, column: u32 },

    #[error("number literal overflows 16 bits ({row}, {column})")]
    IntegerOverflow { row: u32, column: u32 },

    #[error("unexpected character {ch:?} ({row}, {column})")]
    UnexpectedCharacter { ch: char, row: u32, column: u32 },
}

struct Scanner<'s> {
    chars: Peekable<Chars<'s>>,
    row: u32,
    column: u32,
    tokens: Vec<Token>,
    errors: Vec<ScanError>,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            chars: source.chars().peekable(),
            row: 1,
            column: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.row += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, row: u32, column: u32) {
        self.tokens.push(Token { kind, row, column });
    }

    fn scan(mut self) -> Result<Vec<Token>, Vec<ScanError>> {
        loop {
            let (row, column) = (self.row, self.column);
            let c = match self.advance() {
                Some(c) => c,
                None => break,
            };

            match c {
                ':' => self.push(TokenKind::Colon, row, column),
                ' ' | '\r' | '\t' | '\n' => {}
                '/' if self.chars.peek() == Some(&'/') => self.skip_comment(),
                '"' => self.string(row, column),
                c if c.is_ascii_digit() => self.integer(c, row, column),
                c if c.is_ascii_alphabetic() || c == '_' => self.identifier(c, row, column),
                ch => self.errors.push(ScanError::UnexpectedCharacter { ch, row, column }),
            }
        }

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    fn skip_comment(&mut self) {
        while self.chars.peek().is_some_and(|c| *c != '\n') {
            self.advance();
        }
    }

    fn string(&mut self, row: u32, column: u32) {
        let mut value = String::new();
        loop {
            let (err_row, err_column) = (self.row, self.column);
            match self.advance() {
                Some('"') => break,
                Some('\n') => self.errors.push(ScanError::NewlineInString {
                    row: err_row,
                    column: err_column,
                }),
                Some(c) => value.push(c),
                None => {
                    self.errors.push(ScanError::UnterminatedString { row, column });
                    return;
                }
            }
        }
        self.push(TokenKind::Str(value), row, column);
    }

    fn integer(&mut self, first: char, row: u32, column: u32) {
        let mut value = u32::from(first as u8 - b'0');
        let mut overflow = false;

        while let Some(digit) = self.chars.peek().and_then(|c| c.to_digit(10)) {
            self.advance();
            value = value.saturating_mul(10).saturating_add(digit);
            overflow |= value > u32::from(u16::MAX);
        }

        match u16::try_from(value) {
            Ok(value) if !overflow => self.push(TokenKind::Integer(value), row, column),
            _ => self.errors.push(ScanError::IntegerOverflow { row, column }),
        }
    }

    fn identifier(&mut self, first: char, row: u32, column: u32) {
        let mut name = String::from(first);
        while let Some(c) = self.chars.peek().copied().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
            self.advance();
            name.push(c);
        }

        match name.as_str() {
            "port" => self.push(TokenKind::Port, row, column),
            "root" => self.push(TokenKind::Root, row, column),
            _ => self.errors.push(ScanError::UnknownIdentifier { name, row, column }),
        }
    }
}

/// Convierte el texto en tokens, o en la lista completa de errores
pub fn scan(source: &str) -> Result<Vec<Token>, Vec<ScanError>> {
    Scanner::new(source).scan()
}

/// Valores leídos del archivo de configuración
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub port: Option<u16>,
    pub root: Option<String>,
}

/// Resultado de intentar cargar el archivo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLoad {
    Loaded(ConfigFile),
    Missing,
    Invalid(Vec<ScanError>),
}

impl ConfigFile {
    /// Aplica los tokens en orden: cada valor va a la última clave vista
    pub fn parse(source: &str) -> Result<Self, Vec<ScanError>> {
        let mut file = ConfigFile::default();
        let mut key = None;

        for token in scan(source)? {
            match token.kind {
                TokenKind::Port | TokenKind::Root => key = Some(token.kind),
                TokenKind::Colon => {}
                TokenKind::Integer(port) if key == Some(TokenKind::Port) => file.port = Some(port),
                TokenKind::Str(root) if key == Some(TokenKind::Root) => {
                    file.root = Some(strip_trailing_slash(root));
                }
                TokenKind::Integer(_) | TokenKind::Str(_) => {}
            }
        }

        Ok(file)
    }

    pub fn load(path: &Path) -> FileLoad {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(_) => return FileLoad::Missing,
        };

        match Self::parse(&source) {
            Ok(file) => FileLoad::Loaded(file),
            Err(errors) => FileLoad::Invalid(errors),
        }
    }
}

/// Quita un `/` final para que los paths del request se concatenen directo
pub fn strip_trailing_slash(mut root: String) -> String {
    if root.len() > 1 && root.ends_with('/') {
        root.pop();
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    // ==================== Scanner ====================

    #[test]
    fn test_scan_basic_file() {
        let tokens = kinds("port: 8080\nroot: \"/srv/www\"\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Port,
                TokenKind::Colon,
                TokenKind::Integer(8080),
                TokenKind::Root,
                TokenKind::Colon,
                TokenKind::Str("/srv/www".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_positions() {
        let tokens = scan("// header\n  port : 80").unwrap();
        assert_eq!((tokens[0].row, tokens[0].column), (2, 3));
        assert_eq!((tokens[1].row, tokens[1].column), (2, 8));
        assert_eq!((tokens[2].row, tokens[2].column), (2, 10));
    }

    #[test]
    fn test_scan_comments_and_whitespace() {
        assert_eq!(kinds("// solo comentarios\r\n\t// otro"), vec![]);
        assert_eq!(kinds("port:80 // fin"), vec![TokenKind::Port, TokenKind::Colon, TokenKind::Integer(80)]);
    }

    #[test]
    fn test_scan_unknown_identifier() {
        let errors = scan("host: \"x\"").unwrap_err();
        assert_eq!(
            errors,
            vec![ScanError::UnknownIdentifier { name: "host".to_string(), row: 1, column: 1 }]
        );
    }

    #[test]
    fn test_scan_unterminated_string() {
        let errors = scan("root: \"/srv").unwrap_err();
        assert_eq!(errors, vec![ScanError::UnterminatedString { row: 1, column: 7 }]);
    }

    #[test]
    fn test_scan_newline_in_string() {
        let errors = scan("root: \"/srv\n/www\"").unwrap_err();
        assert_eq!(errors, vec![ScanError::NewlineInString { row: 1, column: 12 }]);
    }

    #[test]
    fn test_scan_integer_overflow() {
        assert!(kinds("port: 65535").contains(&TokenKind::Integer(65535)));
        let errors = scan("port: 65536").unwrap_err();
        assert_eq!(errors, vec![ScanError::IntegerOverflow { row: 1, column: 7 }]);
        assert!(scan("port: 99999999999999999999").is_err());
    }

    #[test]
    fn test_scan_unexpected_character() {
        let errors = scan("port = 80").unwrap_err();
        assert_eq!(errors, vec![ScanError::UnexpectedCharacter { ch: '=', row: 1, column: 6 }]);
    }

    #[test]
    fn test_scan_reports_every_error() {
        let errors = scan("foo: 1\nport: 70000\n#").unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    // ==================== ConfigFile ====================

    #[test]
    fn test_parse_sets_values() {
        let file = ConfigFile::parse("port: 3000\nroot: \"/srv/www/\"").unwrap();
        assert_eq!(file.port, Some(3000));
        assert_eq!(file.root.as_deref(), Some("/srv/www"));
    }

    #[test]
    fn test_parse_later_values_overwrite() {
        let file = ConfigFile::parse("port: 1\nport: 2\nroot: \"a\"\nroot: \"b\"").unwrap();
        assert_eq!(file.port, Some(2));
        assert_eq!(file.root.as_deref(), Some("b"));
    }

    #[test]
    fn test_parse_value_without_matching_key_is_ignored() {
        let file = ConfigFile::parse("root: 80\nport: \"x\"").unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_parse_any_error_applies_nothing() {
        assert!(ConfigFile::parse("port: 3000\nbogus").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ConfigFile::load(&dir.path().join("config")), FileLoad::Missing);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "port: 9090\n").unwrap();

        match ConfigFile::load(&path) {
            FileLoad::Loaded(file) => assert_eq!(file.port, Some(9090)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_strip_trailing_slash() {
        assert_eq!(strip_trailing_slash("/srv/www/".to_string()), "/srv/www");
        assert_eq!(strip_trailing_slash("/srv/www".to_string()), "/srv/www");
        assert_eq!(strip_trailing_slash("/".to_string()), "/");
    }
}
