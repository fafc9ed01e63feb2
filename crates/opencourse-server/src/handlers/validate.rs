//! Small input-validation helpers shared by the handlers.
//!
//! Handlers collect problems into a field-keyed map and fail with a single
//! 400 carrying all of them, instead of bailing on the first.

use std::collections::BTreeMap;

/// Field-keyed validation messages.
pub type FieldErrors = BTreeMap<String, String>;

/// Requires a present, non-blank text field. Records an error and returns
/// `None` otherwise.
pub fn require_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
) -> Option<String> {
    match value {
        None => {
            errors.insert(field.to_string(), "This field is required.".to_string());
            None
        }
        Some(s) if s.trim().is_empty() => {
            errors.insert(field.to_string(), "This field may not be blank.".to_string());
            None
        }
        Some(s) => Some(s),
    }
}

/// Rejects a present-but-blank text field; absent is fine.
pub fn reject_blank(errors: &mut FieldErrors, field: &str, value: &Option<String>) {
    if let Some(s) = value
        && s.trim().is_empty()
    {
        errors.insert(field.to_string(), "This field may not be blank.".to_string());
    }
}

/// Minimal syntactic email check: one `@` with something on both sides.
pub fn check_email(errors: &mut FieldErrors, field: &str, email: &str) {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        errors.insert(field.to_string(), "Enter a valid email address.".to_string());
    }
}

/// Requires the chapter body to be a structured object when present.
pub fn check_content_is_object(errors: &mut FieldErrors, value: &Option<serde_json::Value>) {
    if let Some(v) = value
        && !v.is_object()
    {
        errors.insert("content".to_string(), "Must be a structured object.".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            require_text(&mut errors, "title", Some("Rust".to_string())),
            Some("Rust".to_string())
        );
        assert!(errors.is_empty());

        require_text(&mut errors, "title", None);
        assert_eq!(errors["title"], "This field is required.");

        let mut errors = FieldErrors::new();
        require_text(&mut errors, "title", Some("   ".to_string()));
        assert_eq!(errors["title"], "This field may not be blank.");
    }

    #[test]
    fn test_check_email() {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", "ada@example.com");
        assert!(errors.is_empty());

        for bad in ["ada", "@example.com", "ada@", "a@b@c"] {
            let mut errors = FieldErrors::new();
            check_email(&mut errors, "email", bad);
            assert_eq!(errors["email"], "Enter a valid email address.", "input: {bad}");
        }
    }

    #[test]
    fn test_check_content_is_object() {
        let mut errors = FieldErrors::new();
        check_content_is_object(&mut errors, &Some(serde_json::json!({"blocks": []})));
        assert!(errors.is_empty());

        check_content_is_object(&mut errors, &Some(serde_json::json!([1, 2])));
        assert_eq!(errors["content"], "Must be a structured object.");
    }
}
