use std::fs;
use std::io;
use std::path::Path;

/// Read a file as UTF-8 text.
///
/// Unlike [`std::fs::read_to_string`], a directory path is reported as
/// [`io::ErrorKind::NotFound`] so callers can treat "not a servable file"
/// uniformly.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid UTF-8.
pub fn read_utf8(path: &Path) -> io::Result<String> {
    let bytes = read_file(path)?;
    String::from_utf8(bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is not valid UTF-8: {e}", path.display()),
        )
    })
}

/// Read a file's raw bytes, refusing directories.
///
/// # Errors
/// Returns an error if the path is missing, is a directory, or cannot be read.
pub fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    if path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is a directory", path.display()),
        ));
    }
    fs::read(path)
}
