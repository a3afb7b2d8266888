//! Uploaded file validation and object-key construction.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::validation::ValidationErrors;

/// 5 MB
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A file received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Lowercased extension of the original file name.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Allowed extensions and size ceiling for one kind of upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub field: &'static str,
    pub extensions: &'static [&'static str],
    pub max_bytes: usize,
}

impl UploadPolicy {
    /// Check a file, returning its normalized extension.
    pub fn check(&self, file: &UploadedFile) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let ext = file.extension();
        let allowed = ext
            .as_deref()
            .is_some_and(|ext| self.extensions.contains(&ext));
        if !allowed {
            errors.push(
                self.field,
                "file.extname",
                format!(
                    "The {} must have one of {} extension",
                    self.field,
                    self.extensions.join(", ")
                ),
            );
        }
        if file.bytes.len() > self.max_bytes {
            errors.push(
                self.field,
                "file.size",
                format!("The {} size must be under {}mb", self.field, self.max_bytes / (1024 * 1024)),
            );
        }
        if file.bytes.is_empty() {
            errors.push(self.field, "required", format!("The {} field must be defined", self.field));
        }

        errors.into_result()?;
        Ok(ext.unwrap_or_default())
    }
}

/// `<prefix><user_id>_<millis>.<ext>`
pub fn object_key(prefix: &str, user_id: &Uuid, at: DateTime<Utc>, ext: &str) -> String {
    format!("{}{}_{}.{}", prefix, user_id, at.timestamp_millis(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const POLICY: UploadPolicy = UploadPolicy {
        field: "proof",
        extensions: &["jpg", "pdf"],
        max_bytes: 10,
    };

    #[test]
    fn test_extension_is_case_insensitive() {
        let file = UploadedFile::new("Scan.PDF", "application/pdf", vec![1]);
        assert_eq!(POLICY.check(&file).unwrap(), "pdf");
    }

    #[test]
    fn test_rejects_extension_and_size() {
        let file = UploadedFile::new("run.exe", "application/octet-stream", vec![0; 11]);
        let errors = POLICY.check(&file).unwrap_err();
        let rules: Vec<&str> = errors.fields().iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(rules, vec!["file.extname", "file.size"]);
    }

    #[test]
    fn test_rejects_missing_extension() {
        for name in ["noext", ".pdf", "trailing."] {
            let file = UploadedFile::new(name, "x", vec![1]);
            assert!(POLICY.check(&file).is_err(), "{name}");
        }
    }

    #[test]
    fn test_object_key() {
        let id = Uuid::nil();
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            object_key("achievements/", &id, at, "png"),
            "achievements/00000000-0000-0000-0000-000000000000_1700000000123.png"
        );
    }
}
