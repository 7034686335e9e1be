//! Input validation before hashing.
//!
//! Catches the corruption the scanning rigs actually produce: empty
//! output files and container signatures that do not match the file
//! extension. Extensions without a known signature pass through.

use std::path::Path;

use collate_core::errors::IngestError;

/// Window searched for the PDF header and trailer markers.
const PDF_MARKER_WINDOW: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Pdf,
    Tiff,
    Jpeg,
    Png,
}

fn container_for(ext: &str) -> Option<Container> {
    match ext {
        "pdf" => Some(Container::Pdf),
        "tif" | "tiff" => Some(Container::Tiff),
        "jpg" | "jpeg" => Some(Container::Jpeg),
        "png" => Some(Container::Png),
        _ => None,
    }
}

/// Validate raw content against its path's extension. Returns
/// `CorruptInput` for empty files and signature mismatches.
pub fn check(content: &[u8], path: &Path) -> Result<(), IngestError> {
    let corrupt = |reason: String| IngestError::CorruptInput {
        path: path.to_path_buf(),
        reason,
    };

    if content.is_empty() {
        return Err(corrupt("zero-length file".to_string()));
    }

    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Ok(());
    };
    let ext = ext.to_ascii_lowercase();
    let Some(container) = container_for(&ext) else {
        return Ok(());
    };

    match container {
        Container::Pdf => {
            let head = &content[..content.len().min(PDF_MARKER_WINDOW)];
            if !contains(head, b"%PDF-") {
                return Err(corrupt(format!("no %PDF- header in .{ext} file")));
            }
            let tail_start = content.len().saturating_sub(PDF_MARKER_WINDOW);
            if !contains(&content[tail_start..], b"%%EOF") {
                return Err(corrupt("missing %%EOF trailer, likely truncated".to_string()));
            }
        }
        Container::Tiff => {
            let le = content.starts_with(&[0x49, 0x49, 0x2A, 0x00]);
            let be = content.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]);
            if !le && !be {
                return Err(corrupt(format!("no TIFF byte-order mark in .{ext} file")));
            }
        }
        Container::Jpeg => {
            if !content.starts_with(&[0xFF, 0xD8, 0xFF]) {
                return Err(corrupt(format!("no JPEG SOI marker in .{ext} file")));
            }
        }
        Container::Png => {
            if !content.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
                return Err(corrupt(format!("no PNG signature in .{ext} file")));
            }
        }
    }

    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_is_rejected() {
        let err = check(b"", Path::new("scan.pdf")).unwrap_err();
        assert!(matches!(err, IngestError::CorruptInput { .. }));
    }

    #[test]
    fn valid_pdf_passes() {
        let content = b"%PDF-1.4 body body body %%EOF";
        assert!(check(content, Path::new("scan.pdf")).is_ok());
    }

    #[test]
    fn pdf_with_preamble_passes() {
        let mut content = vec![0x0Au8; 16];
        content.extend_from_slice(b"%PDF-1.7 body %%EOF");
        assert!(check(&content, Path::new("scan.pdf")).is_ok());
    }

    #[test]
    fn truncated_pdf_is_rejected() {
        let content = b"%PDF-1.4 body with no trailer";
        let err = check(content, Path::new("scan.pdf")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("truncated"), "{message}");
    }

    #[test]
    fn tiff_byte_orders_pass() {
        assert!(check(&[0x49, 0x49, 0x2A, 0x00, 1, 2], Path::new("page.tif")).is_ok());
        assert!(check(&[0x4D, 0x4D, 0x00, 0x2A, 1, 2], Path::new("page.tiff")).is_ok());
    }

    #[test]
    fn mislabeled_container_is_rejected() {
        let err = check(b"%PDF-1.4 %%EOF", Path::new("page.png")).unwrap_err();
        assert!(matches!(err, IngestError::CorruptInput { .. }));
    }

    #[test]
    fn unknown_extension_passes_any_content() {
        assert!(check(b"arbitrary bytes", Path::new("page.bin")).is_ok());
        assert!(check(b"arbitrary bytes", Path::new("noext")).is_ok());
    }
}
