//! Input validation: make sure the configured path is a readable PDF.
//!
//! pdfium reports every load failure as a generic format error, so missing
//! files and non-PDF inputs are caught here first and given their own error
//! variants. The `%PDF` magic check costs one 4-byte read.

use crate::error::PdfCaptionError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with the PDF magic bytes.
pub fn validate_input(path: &Path) -> Result<PathBuf, PdfCaptionError> {
    let path = path.to_path_buf();

    if !path.is_file() {
        return Err(PdfCaptionError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() {
                return Err(PdfCaptionError::NotAPdf { path, magic });
            }
            if &magic != b"%PDF" {
                return Err(PdfCaptionError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PdfCaptionError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(PdfCaptionError::FileNotFound { path });
        }
    }

    debug!("Validated PDF input: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = validate_input(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, PdfCaptionError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_input(dir.path()).unwrap_err();
        assert!(matches!(err, PdfCaptionError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04 not a pdf").unwrap();
        let err = validate_input(f.path()).unwrap_err();
        match err {
            PdfCaptionError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn short_file_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%P").unwrap();
        let err = validate_input(f.path()).unwrap_err();
        assert!(matches!(err, PdfCaptionError::NotAPdf { .. }));
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n%%EOF\n").unwrap();
        let path = validate_input(f.path()).expect("valid magic");
        assert_eq!(path, f.path());
    }
}
