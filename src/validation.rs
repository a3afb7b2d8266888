//! Request field validation.
//!
//! Failures carry every failing field; the first one doubles as the
//! human-facing message.

use serde::Serialize;

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub rule: String,
    pub message: String,
}

/// Collected field failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single failure.
    pub fn single(field: &str, rule: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, rule, message);
        errors
    }

    pub fn push(&mut self, field: &str, rule: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            rule: rule.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Message of the first failing field.
    pub fn first_message(&self) -> Option<&str> {
        self.0.first().map(|e| e.message.as_str())
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Require a non-blank string.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "required", format!("The {field} field must be defined"));
        }
    }

    /// Require a syntactically plausible email address.
    pub fn require_email(&mut self, field: &str, value: &str) {
        if !is_email(value) {
            self.push(
                field,
                "email",
                format!("The {field} field must be a valid email address"),
            );
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.first_message() {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "validation failed"),
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// One `@`, non-empty local part, and a dotted domain without spaces.
pub fn is_email(value: &str) -> bool {
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    !local.is_empty()
        && !value.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
