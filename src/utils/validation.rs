// file: src/utils/validation.rs
// description: input validation helpers shared by settings, schema and search code
// reference: input validation patterns

use crate::error::{Result, WarehouseError};

pub struct Validator;

impl Validator {
    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(WarehouseError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_port(port: u16) -> Result<()> {
        if port == 0 {
            return Err(WarehouseError::Validation("Port cannot be 0".to_string()));
        }
        Ok(())
    }

    /// Table and database names are spliced into DDL, so only plain identifiers pass.
    pub fn validate_identifier(name: &str) -> Result<()> {
        let mut chars = name.chars();
        let valid_head = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);

        if !valid_head || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(WarehouseError::Validation(format!(
                "Invalid identifier: '{}'",
                name
            )));
        }
        Ok(())
    }

    pub fn validate_query_vector(vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(WarehouseError::Validation("Query vector is empty".to_string()));
        }

        if let Some(position) = vector.iter().position(|v| !v.is_finite()) {
            return Err(WarehouseError::Validation(format!(
                "Query vector has a non-finite value at position {}",
                position
            )));
        }
        Ok(())
    }

    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            let head: String = text.chars().take(max_chars).collect();
            format!("{}...", head)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://example.com").is_ok());
        assert!(Validator::validate_url("http://localhost:9000").is_ok());
        assert!(Validator::validate_url("example.com").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_port() {
        assert!(Validator::validate_port(8123).is_ok());
        assert!(Validator::validate_port(0).is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(Validator::validate_identifier("events").is_ok());
        assert!(Validator::validate_identifier("s3_events").is_ok());
        assert!(Validator::validate_identifier("_scratch").is_ok());
        assert!(Validator::validate_identifier("").is_err());
        assert!(Validator::validate_identifier("3events").is_err());
        assert!(Validator::validate_identifier("events; DROP TABLE x").is_err());
    }

    #[test]
    fn test_validate_query_vector() {
        assert!(Validator::validate_query_vector(&[0.1, 0.2]).is_ok());
        assert!(Validator::validate_query_vector(&[]).is_err());
        assert!(Validator::validate_query_vector(&[0.1, f32::NAN]).is_err());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
        assert_eq!(Validator::truncate_text("ééééé", 2), "éé...");
    }
}
