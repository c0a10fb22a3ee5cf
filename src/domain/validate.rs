//! Input normalization shared by write services

use super::{HospitalError, Result};

/// Trims `value`, rejecting blank input as a missing field
pub fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HospitalError::missing(field));
    }
    Ok(trimmed.to_string())
}

/// Trims `value`, mapping blank input to `None`
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Case-insensitive comparison key
pub fn match_key(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  Ward 4 ").unwrap(), "Ward 4");
        assert!(matches!(
            required_text("name", "   "),
            Err(HospitalError::MissingRequiredField { ref field }) if field == "name"
        ));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some(" x ".into())), Some("x".to_string()));
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_match_key() {
        assert_eq!(match_key(" McDonald "), match_key("mcdonald"));
    }
}
