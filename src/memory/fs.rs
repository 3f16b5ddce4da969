//! # Lectura de Archivos hacia la Arena
//! src/memory/fs.rs
//!
//! Las rutas viven como bytes dentro de la arena; aquí se convierten en
//! `Path` sin copiar y el contenido del archivo se lee directamente en una
//! región nueva.

use super::arena::{Arena, Region};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Resultado de intentar leer un archivo completo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRead {
    /// No existe (o algún componente de la ruta no es un directorio)
    Missing,
    /// Existe pero no se pudo abrir o leer completo dentro de la arena
    Unreadable,
    /// Contenido completo
    Loaded(Region),
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> &Path {
    use std::os::unix::ffi::OsStrExt;
    Path::new(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> std::borrow::Cow<'_, Path> {
    match String::from_utf8_lossy(bytes) {
        std::borrow::Cow::Borrowed(s) => std::borrow::Cow::Borrowed(Path::new(s)),
        std::borrow::Cow::Owned(s) => std::borrow::Cow::Owned(s.into()),
    }
}

/// Abre el archivo cuya ruta está en `path`
pub fn open(arena: &Arena<'_>, path: Region) -> io::Result<File> {
    File::open(&*path_from_bytes(arena.bytes(path)))
}

/// Lee el archivo completo en una región nueva de la arena.
///
/// Distingue "no existe" de "existe pero falló la lectura": para un archivo
/// guardián la diferencia decide entre acceso libre y denegado. Solo
/// `NotFound` y `NotADirectory` cuentan como ausencia; cualquier otro error
/// al abrir (permisos, symlinks en ciclo, demasiados archivos abiertos) es
/// `Unreadable`.
pub fn read_entire_file(arena: &mut Arena<'_>, path: Region) -> FileRead {
    let mut file = match open(arena, path) {
        Ok(file) => file,
        Err(e) if is_absent(&e) => return FileRead::Missing,
        Err(_) => return FileRead::Unreadable,
    };

    match read_open_file(arena, &mut file) {
        Ok(region) => FileRead::Loaded(region),
        Err(_) => FileRead::Unreadable,
    }
}

fn is_absent(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

fn read_open_file(arena: &mut Arena<'_>, file: &mut File) -> io::Result<Region> {
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
    }

    let size = usize::try_from(metadata.len())
        .map_err(|_| io::Error::new(io::ErrorKind::OutOfMemory, "file too large"))?;
    let region = arena
        .allocate(size, 1)
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;

    file.read_exact(arena.bytes_mut(region))?;
    Ok(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("hello.txt");
        fs::write(&file_path, b"hola mundo").unwrap();

        let mut buf = vec![0u8; 1024];
        let mut arena = Arena::new(&mut buf);
        let path = arena.push_bytes(file_path.to_str().unwrap().as_bytes()).unwrap();

        match read_entire_file(&mut arena, path) {
            FileRead::Loaded(region) => assert_eq!(arena.bytes(region), b"hola mundo"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("nope.txt");

        let mut buf = vec![0u8; 1024];
        let mut arena = Arena::new(&mut buf);
        let path = arena.push_bytes(file_path.to_str().unwrap().as_bytes()).unwrap();

        assert_eq!(read_entire_file(&mut arena, path), FileRead::Missing);
    }

    #[test]
    fn test_read_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();

        let mut buf = vec![0u8; 1024];
        let mut arena = Arena::new(&mut buf);
        let path = arena.push_bytes(dir.path().to_str().unwrap().as_bytes()).unwrap();

        assert_eq!(read_entire_file(&mut arena, path), FileRead::Unreadable);
    }

    #[test]
    fn test_path_through_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), b"x").unwrap();
        let file_path = dir.path().join("index.html/.htpasswd");

        let mut buf = vec![0u8; 1024];
        let mut arena = Arena::new(&mut buf);
        let path = arena.push_bytes(file_path.to_str().unwrap().as_bytes()).unwrap();

        assert_eq!(read_entire_file(&mut arena, path), FileRead::Missing);
    }

    #[cfg(unix)]
    #[test]
    fn test_open_error_is_unreadable() {
        // Un symlink que apunta a sí mismo existe pero nunca abre (ELOOP),
        // incluso corriendo como root
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("loop");
        std::os::unix::fs::symlink(&file_path, &file_path).unwrap();

        let mut buf = vec![0u8; 1024];
        let mut arena = Arena::new(&mut buf);
        let path = arena.push_bytes(file_path.to_str().unwrap().as_bytes()).unwrap();

        assert_eq!(read_entire_file(&mut arena, path), FileRead::Unreadable);
    }

    #[test]
    fn test_read_file_larger_than_arena() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("big.bin");
        fs::write(&file_path, vec![7u8; 4096]).unwrap();

        let mut buf = vec![0u8; 1024];
        let mut arena = Arena::new(&mut buf);
        let path = arena.push_bytes(file_path.to_str().unwrap().as_bytes()).unwrap();
        let used = arena.used();

        assert_eq!(read_entire_file(&mut arena, path), FileRead::Unreadable);
        assert_eq!(arena.used(), used);
    }
}
