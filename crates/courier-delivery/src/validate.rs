//! Artifact sanity checks, run before any automation starts.

use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::ArtifactError;

/// Upload size limit enforced by the messaging client.
pub const MAX_ARTIFACT_BYTES: u64 = 100 * 1024 * 1024;

/// Leading bytes of every well-formed PDF.
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Encryption marker; encrypted PDFs are rejected by the client on upload.
const ENCRYPTION_MARKER: &[u8] = b"/Encrypt";

/// How much of the file head is scanned for the encryption marker.
const HEAD_SCAN_BYTES: usize = 8192;

/// Validate the PDF artifact at `path`.
///
/// Checks run in order: existence, non-empty, size limit, PDF signature,
/// absence of the encryption marker in the first 8 KiB. Read-only; returns
/// the artifact size on success.
pub fn validate_pdf(path: &Path) -> Result<u64, ArtifactError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArtifactError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let size = metadata.len();
    if size == 0 {
        return Err(ArtifactError::Empty {
            path: path.to_path_buf(),
        });
    }
    if size > MAX_ARTIFACT_BYTES {
        return Err(ArtifactError::TooLarge {
            path: path.to_path_buf(),
            size_bytes: size,
            limit_bytes: MAX_ARTIFACT_BYTES,
        });
    }

    let mut file = std::fs::File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut head = vec![0u8; HEAD_SCAN_BYTES.min(size as usize)];
    file.read_exact(&mut head).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if !head.starts_with(PDF_SIGNATURE) {
        return Err(ArtifactError::InvalidFormat {
            path: path.to_path_buf(),
        });
    }
    if contains_marker(&head, ENCRYPTION_MARKER) {
        return Err(ArtifactError::Encrypted {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), size_bytes = size, "artifact validation passed");
    Ok(size)
}

fn contains_marker(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_artifact(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn well_formed_pdf_passes() {
        let file = write_artifact(b"%PDF-1.7\nsome pdf body\n%%EOF");
        let size = validate_pdf(file.path()).unwrap();
        assert!(size > 0);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = validate_pdf(Path::new("/nonexistent/report.pdf")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = write_artifact(b"");
        assert!(matches!(
            validate_pdf(file.path()),
            Err(ArtifactError::Empty { .. })
        ));
    }

    #[test]
    fn oversized_file_is_rejected() {
        // Sparse file: the size check reads metadata only.
        let file = tempfile::NamedTempFile::new().unwrap();
        file.as_file().set_len(MAX_ARTIFACT_BYTES + 1).unwrap();
        assert!(matches!(
            validate_pdf(file.path()),
            Err(ArtifactError::TooLarge { .. })
        ));
    }

    #[test]
    fn non_pdf_signature_is_rejected() {
        let file = write_artifact(b"<html>not a pdf</html>");
        assert!(matches!(
            validate_pdf(file.path()),
            Err(ArtifactError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn encrypted_pdf_is_rejected() {
        let file = write_artifact(b"%PDF-1.4\n1 0 obj\n<< /Encrypt 2 0 R >>\n");
        assert!(matches!(
            validate_pdf(file.path()),
            Err(ArtifactError::Encrypted { .. })
        ));
    }

    #[test]
    fn encryption_marker_outside_head_is_not_scanned() {
        let mut body = b"%PDF-1.4\n".to_vec();
        body.resize(HEAD_SCAN_BYTES + 16, b' ');
        body.extend_from_slice(b"/Encrypt");
        let file = write_artifact(&body);
        assert!(validate_pdf(file.path()).is_ok());
    }

    #[test]
    fn each_failure_has_a_distinct_kind() {
        let empty = write_artifact(b"");
        let bad = write_artifact(b"junk");
        let enc = write_artifact(b"%PDF-1.4 /Encrypt");

        let kinds = [
            format!("{:?}", validate_pdf(Path::new("/nope.pdf")).unwrap_err()),
            format!("{:?}", validate_pdf(empty.path()).unwrap_err()),
            format!("{:?}", validate_pdf(bad.path()).unwrap_err()),
            format!("{:?}", validate_pdf(enc.path()).unwrap_err()),
        ];
        assert!(kinds[0].starts_with("NotFound"));
        assert!(kinds[1].starts_with("Empty"));
        assert!(kinds[2].starts_with("InvalidFormat"));
        assert!(kinds[3].starts_with("Encrypted"));
    }
}
