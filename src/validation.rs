//! Field validation for request payloads.
//!
//! Handlers validate the whole payload up front and report every failing
//! field at once as a single `AppError::Validation` (HTTP 422).

use crate::error::AppError;

/// Collects field errors for one payload.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.errors.push(format!("{field}: {message}"));
    }

    /// Non-blank, at most `max` characters.
    pub fn required(&mut self, field: &str, value: &str, max: usize) {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        } else if value.chars().count() > max {
            self.push(field, &format!("must be at most {max} characters"));
        }
    }

    /// Length-checked only when present; blank strings are allowed.
    pub fn optional(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.push(field, &format!("must be at most {max} characters"));
            }
        }
    }

    /// ISO 4217 alphabetic code, e.g. `USD`.
    pub fn currency_code(&mut self, field: &str, value: &str) {
        if value.len() != 3 || !value.chars().all(|c| c.is_ascii_uppercase()) {
            self.push(field, "must be a three-letter uppercase ISO 4217 code");
        }
    }

    /// Four-digit merchant category code (ISO 18245).
    pub fn category_code(&mut self, field: &str, value: &str) {
        if value.len() != 4 || !value.chars().all(|c| c.is_ascii_digit()) {
            self.push(field, "must be a four-digit merchant category code");
        }
    }

    /// Pay-into alias: 4 to 32 digits.
    pub fn alias(&mut self, field: &str, value: &str) {
        if !(4..=32).contains(&value.len()) || !value.chars().all(|c| c.is_ascii_digit()) {
            self.push(field, "must be 4 to 32 digits");
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        let valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !value.chars().any(char::is_whitespace)
                    && value.len() <= 255
            }
            None => false,
        };
        if !valid {
            self.push(field, "must be a valid email address");
        }
    }

    /// Optional leading `+`, then 6 to 15 digits (E.164 length).
    pub fn phone_number(&mut self, field: &str, value: &str) {
        let digits = value.strip_prefix('+').unwrap_or(value);
        if !(6..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            self.push(field, "must be 6 to 15 digits, optionally prefixed with +");
        }
    }

    pub fn latitude(&mut self, field: &str, value: f64) {
        if !(-90.0..=90.0).contains(&value) {
            self.push(field, "must be between -90 and 90");
        }
    }

    pub fn longitude(&mut self, field: &str, value: f64) {
        if !(-180.0..=180.0).contains(&value) {
            self.push(field, "must be between -180 and 180");
        }
    }

    /// Absolute http(s) URL, at most 2048 characters.
    pub fn web_url(&mut self, field: &str, value: &str) {
        if value.len() > 2048 {
            self.push(field, "must be at most 2048 characters");
            return;
        }
        match url::Url::parse(value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(_) => self.push(field, "must use http or https"),
            Err(_) => self.push(field, "must be a valid URL"),
        }
    }

    /// `Ok(())` when no field failed, otherwise every message joined by `; `.
    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_of(f: impl FnOnce(&mut Validator)) -> Vec<String> {
        let mut v = Validator::new();
        f(&mut v);
        v.errors
    }

    #[test]
    fn required_rejects_blank_and_long_values() {
        assert_eq!(errors_of(|v| v.required("name", "  ", 10)).len(), 1);
        assert_eq!(errors_of(|v| v.required("name", "abcdefghijk", 10)).len(), 1);
        assert!(errors_of(|v| v.required("name", "Cafe", 10)).is_empty());
    }

    #[test]
    fn codes_are_checked() {
        assert!(errors_of(|v| v.currency_code("c", "EUR")).is_empty());
        assert_eq!(errors_of(|v| v.currency_code("c", "EU")).len(), 1);
        assert!(errors_of(|v| v.category_code("m", "5411")).is_empty());
        assert_eq!(errors_of(|v| v.category_code("m", "54a1")).len(), 1);
    }

    #[test]
    fn contact_fields_are_checked() {
        assert!(errors_of(|v| v.email("e", "owner@shop.example")).is_empty());
        assert_eq!(errors_of(|v| v.email("e", "owner@shop")).len(), 1);
        assert_eq!(errors_of(|v| v.email("e", "owner shop.example")).len(), 1);
        assert!(errors_of(|v| v.phone_number("p", "+959123456789")).is_empty());
        assert_eq!(errors_of(|v| v.phone_number("p", "09-123")).len(), 1);
    }

    #[test]
    fn coordinates_and_urls_are_checked() {
        assert!(errors_of(|v| v.latitude("lat", 16.8)).is_empty());
        assert_eq!(errors_of(|v| v.latitude("lat", 91.0)).len(), 1);
        assert_eq!(errors_of(|v| v.longitude("lon", -181.0)).len(), 1);
        assert!(errors_of(|v| v.web_url("url", "https://shop.example/store")).is_empty());
        assert_eq!(errors_of(|v| v.web_url("url", "ftp://shop.example")).len(), 1);
        assert_eq!(errors_of(|v| v.web_url("url", "not a url")).len(), 1);
    }

    #[test]
    fn finish_joins_messages() {
        let mut v = Validator::new();
        v.required("a", "", 5);
        v.alias("b", "12");
        match v.finish() {
            Err(AppError::Validation(message)) => {
                assert_eq!(
                    message,
                    "a: must not be empty; b: must be 4 to 32 digits"
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
