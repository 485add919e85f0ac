//! Untrusted file input validation
//!
//! A stateless gate over configuration: size bound, extension and MIME
//! allow-lists (exact string matches), and an optional content sniff over
//! the first bytes. A sniff mismatch is always logged; it only rejects when
//! deep-scan mode is enabled.

use crate::{CoreError, Result};
use std::path::Path;
use tracing::warn;

/// Sniffing needs at least this much of the file head.
const SNIFF_LEN: usize = 512;

/// Generic binary fallback type, exempt from mismatch handling.
const GENERIC_BINARY: &str = "application/octet-stream";

const MAX_FILENAME_LEN: usize = 255;

/// Validates uploads against configured allow-lists.
pub struct FileValidator {
    allowed_mime_types: Vec<String>,
    allowed_extensions: Vec<String>,
    max_file_size: u64,
    deep_scan: bool,
}

impl FileValidator {
    /// Build from comma-separated allow-lists as they appear in
    /// configuration. Entries are trimmed; matching is exact, not
    /// prefix or glob.
    pub fn new(mime_types: &str, extensions: &str, max_file_size: u64, deep_scan: bool) -> Self {
        let split = |list: &str| {
            list.split(',')
                .map(|entry| entry.trim().to_string())
                .filter(|entry| !entry.is_empty())
                .collect()
        };
        Self {
            allowed_mime_types: split(mime_types),
            allowed_extensions: split(extensions),
            max_file_size,
            deep_scan,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Gate one file before any byte is relayed.
    pub fn validate(
        &self,
        filename: &str,
        size: u64,
        declared_mime: &str,
        head: &[u8],
    ) -> Result<()> {
        if size > self.max_file_size {
            return Err(CoreError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        let extension = file_extension(filename);
        if !self.allowed_extensions.iter().any(|e| e == &extension) {
            return Err(CoreError::DisallowedExtension(extension));
        }

        if !self.allowed_mime_types.iter().any(|m| m == declared_mime) {
            return Err(CoreError::DisallowedMime(declared_mime.to_string()));
        }

        if head.len() >= SNIFF_LEN {
            if let Some(kind) = infer::get(head) {
                let detected = kind.mime_type();
                if detected != declared_mime && detected != GENERIC_BINARY {
                    warn!(
                        declared = declared_mime,
                        detected,
                        filename,
                        "declared content type does not match file content"
                    );
                    if self.deep_scan {
                        return Err(CoreError::ContentMismatch {
                            declared: declared_mime.to_string(),
                            detected: detected.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Lowercase extension including the dot, or empty when absent.
fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// Strip path traversal and shell/HTML-dangerous characters from an
/// untrusted filename and cap its length, preserving the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let mut name = filename.replace("..", "_");
    name = name.replace(['/', '\\'], "_");
    for dangerous in ['<', '>', ':', '"', '|', '?', '*', '&', '%', '#'] {
        name = name.replace(dangerous, "_");
    }

    if name.len() > MAX_FILENAME_LEN {
        // Split on the actual bytes of the name; `file_extension` lowercases
        // and may change the byte length of a non-ASCII extension.
        let (stem, extension) = match name.rfind('.') {
            Some(dot) => name.split_at(dot),
            None => (name.as_str(), ""),
        };
        let stem_budget = MAX_FILENAME_LEN.saturating_sub(extension.len());
        let capped = if stem_budget > 0 {
            format!("{}{}", truncate_at_char_boundary(stem, stem_budget), extension)
        } else {
            truncate_at_char_boundary(extension, MAX_FILENAME_LEN).to_string()
        };
        name = capped;
    }
    name
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> FileValidator {
        FileValidator::new(
            "image/jpeg,image/png,application/pdf,text/plain",
            ".jpg, .jpeg, .png, .pdf, .txt",
            10 * 1024 * 1024,
            false,
        )
    }

    // A real PNG header followed by padding, enough to trigger sniffing.
    fn png_head() -> Vec<u8> {
        let mut head = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        head.resize(600, 0);
        head
    }

    #[test]
    fn test_rejects_oversized_file() {
        let result = validator().validate("big.png", 11 * 1024 * 1024, "image/png", &[]);
        assert!(matches!(result, Err(CoreError::FileTooLarge { .. })));
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        let result = validator().validate("page.html", 10, "text/plain", &[]);
        assert!(matches!(result, Err(CoreError::DisallowedExtension(ext)) if ext == ".html"));
    }

    #[test]
    fn test_extension_matching_is_case_insensitive_on_input() {
        assert!(validator().validate("PHOTO.PNG", 10, "image/png", &[]).is_ok());
    }

    #[test]
    fn test_rejects_disallowed_mime() {
        let result = validator().validate("doc.pdf", 10, "application/zip", &[]);
        assert!(matches!(result, Err(CoreError::DisallowedMime(_))));
    }

    #[test]
    fn test_short_head_skips_sniffing() {
        // Fewer than 512 bytes available: the sniff step does not run.
        assert!(validator()
            .validate("photo.png", 10, "image/png", b"not a png")
            .is_ok());
    }

    #[test]
    fn test_mismatch_is_warning_without_deep_scan() {
        let head = png_head();
        // Declared PDF, actually PNG: logged, not rejected.
        assert!(validator()
            .validate("doc.pdf", head.len() as u64, "application/pdf", &head)
            .is_ok());
    }

    #[test]
    fn test_mismatch_rejects_with_deep_scan() {
        let strict = FileValidator::new(
            "application/pdf,image/png",
            ".pdf,.png",
            10 * 1024 * 1024,
            true,
        );
        let head = png_head();
        let result = strict.validate("doc.pdf", head.len() as u64, "application/pdf", &head);
        assert!(matches!(result, Err(CoreError::ContentMismatch { .. })));

        // Matching content passes deep scan.
        assert!(strict
            .validate("photo.png", head.len() as u64, "image/png", &head)
            .is_ok());
    }

    #[test]
    fn test_sanitize_path_traversal() {
        let sanitized = sanitize_filename("../../../etc/passwd");
        assert!(sanitized.contains("etc_passwd"));
        assert!(!sanitized.contains(".."));
        assert!(!sanitized.contains('/'));
        assert!(!sanitized.contains('\\'));
        assert!(sanitized.len() <= 255);
    }

    #[test]
    fn test_sanitize_dangerous_characters() {
        let sanitized = sanitize_filename("file<with>.html");
        assert!(sanitized.contains("file_with"));
        assert!(!sanitized.contains('<'));
        assert!(!sanitized.contains('>'));
    }

    #[test]
    fn test_sanitize_caps_length_and_keeps_extension() {
        let long = format!("{}.txt", "a".repeat(300));
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.len(), 255);
        assert!(sanitized.ends_with(".txt"));
    }

    #[test]
    fn test_sanitize_caps_length_with_multibyte_uppercase_extension() {
        // Lowercasing `İ` grows it from 2 to 3 bytes; the cap must split on
        // the name's own bytes, not a lowercased reconstruction.
        let long = format!("{}.İ", "é".repeat(127));
        assert_eq!(long.len(), 257);
        let sanitized = sanitize_filename(&long);
        assert!(sanitized.len() <= 255);
        assert!(sanitized.ends_with(".İ"));
    }

    #[test]
    fn test_sanitize_caps_oversized_extension() {
        let long = format!("a.{}", "b".repeat(300));
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.len(), 255);
        assert!(sanitized.starts_with('.'));
    }

    #[test]
    fn test_sanitize_caps_length_without_extension() {
        let sanitized = sanitize_filename(&"a".repeat(300));
        assert_eq!(sanitized.len(), 255);
    }

    #[test]
    fn test_sanitize_leaves_clean_names_alone() {
        assert_eq!(sanitize_filename("report-2024.pdf"), "report-2024.pdf");
    }
}
