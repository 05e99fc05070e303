//! Local file access for `file://` URLs

use std::fs;
use std::io;

/// Failure reading a local document
#[derive(Debug, thiserror::Error)]
pub enum LocalFileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LocalFileError {
    /// Document text shown in place of an unreadable file
    ///
    /// Returns `None` for errors that are not displayed as content.
    pub fn placeholder(&self) -> Option<String> {
        match self {
            LocalFileError::NotFound(_) | LocalFileError::PermissionDenied(_) => {
                Some(format!("Error: {}", self))
            }
            LocalFileError::Io(_) => None,
        }
    }
}

/// Read the file at `path` as text
///
/// The handle is closed before this returns, on every path.
pub fn read_local_file(path: &str) -> Result<String, LocalFileError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LocalFileError::NotFound(path.to_string()),
        io::ErrorKind::PermissionDenied => LocalFileError::PermissionDenied(path.to_string()),
        _ => LocalFileError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<p>hello</p>").unwrap();

        let path = file.path().to_str().unwrap();
        assert_eq!(read_local_file(path).unwrap(), "<p>hello</p>");
    }

    #[test]
    fn test_missing_file() {
        let err = read_local_file("/definitely/not/here.html").unwrap_err();
        assert!(matches!(err, LocalFileError::NotFound(_)));
        assert_eq!(
            err.placeholder().as_deref(),
            Some("Error: File not found: /definitely/not/here.html")
        );
    }

    #[test]
    fn test_permission_denied_placeholder() {
        let err = LocalFileError::PermissionDenied("secret.html".into());
        assert_eq!(err.placeholder().as_deref(), Some("Error: Permission denied: secret.html"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file() {
        use std::os::unix::fs::PermissionsExt;

        let file = tempfile::NamedTempFile::new().unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores file modes
        if fs::read(file.path()).is_ok() {
            return;
        }

        let path = file.path().to_str().unwrap();
        let err = read_local_file(path).unwrap_err();
        assert!(matches!(err, LocalFileError::PermissionDenied(ref p) if p == path));
        assert_eq!(err.placeholder(), Some(format!("Error: Permission denied: {}", path)));
    }

    #[test]
    fn test_other_errors_have_no_placeholder() {
        let err = LocalFileError::Io(io::Error::new(io::ErrorKind::InvalidData, "not utf-8"));
        assert!(err.placeholder().is_none());
    }
}
