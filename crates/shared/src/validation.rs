//! Common validation utilities for room and participant input.

use validator::ValidationError;

/// Maximum length of a participant display name.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 24;

lazy_static::lazy_static! {
    static ref SLUG_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z2-9]{3}-[A-Z2-9]{3}$").unwrap();
    static ref ROOM_PASSWORD_REGEX: regex::Regex =
        regex::Regex::new(r"^[0-9]{4}$").unwrap();
}

/// Validates a participant display name: non-empty after trimming, within
/// the length bound, and free of control characters. Uniqueness is NOT
/// enforced; two players may share a name.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        let mut err = ValidationError::new("display_name_empty");
        err.message = Some("Display name must not be empty".into());
        return Err(err);
    }

    if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some("Display name must be at most 24 characters".into());
        return Err(err);
    }

    if trimmed.chars().any(|c| c.is_control()) {
        let mut err = ValidationError::new("display_name_control_chars");
        err.message = Some("Display name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Strips surrounding whitespace and collapses internal whitespace runs to
/// single spaces. Applied before a display name is stored.
pub fn sanitize_display_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validates a room password: exactly four ASCII digits.
pub fn validate_room_password(raw: &str) -> Result<(), ValidationError> {
    if ROOM_PASSWORD_REGEX.is_match(raw) {
        Ok(())
    } else {
        let mut err = ValidationError::new("room_password_format");
        err.message = Some("Room password must be exactly 4 digits".into());
        Err(err)
    }
}

/// Validates a slug in canonical `XXX-XXX` form.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_REGEX.is_match(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug_format");
        err.message = Some("Slug must be in XXX-XXX format".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Display name tests
    #[test]
    fn test_validate_display_name_ok() {
        assert!(validate_display_name("Alice").is_ok());
        assert!(validate_display_name("Dr. Black").is_ok());
        assert!(validate_display_name("侦探小明").is_ok());
    }

    #[test]
    fn test_validate_display_name_empty() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
    }

    #[test]
    fn test_validate_display_name_too_long() {
        let long = "x".repeat(MAX_DISPLAY_NAME_LENGTH + 1);
        assert!(validate_display_name(&long).is_err());

        let exactly = "x".repeat(MAX_DISPLAY_NAME_LENGTH);
        assert!(validate_display_name(&exactly).is_ok());
    }

    #[test]
    fn test_validate_display_name_counts_chars_not_bytes() {
        // 24 multibyte characters are within the bound
        let name = "名".repeat(MAX_DISPLAY_NAME_LENGTH);
        assert!(validate_display_name(&name).is_ok());
    }

    #[test]
    fn test_validate_display_name_control_chars() {
        assert!(validate_display_name("Al\x00ice").is_err());
        assert!(validate_display_name("Ali\tce").is_err());
    }

    #[test]
    fn test_validate_display_name_error_message() {
        let err = validate_display_name("").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Display name must not be empty"
        );
    }

    #[test]
    fn test_sanitize_display_name() {
        assert_eq!(sanitize_display_name("  Alice  "), "Alice");
        assert_eq!(sanitize_display_name("Dr.   Black"), "Dr. Black");
        assert_eq!(sanitize_display_name("a\n b"), "a b");
    }

    // Room password tests
    #[test]
    fn test_validate_room_password() {
        assert!(validate_room_password("0000").is_ok());
        assert!(validate_room_password("1234").is_ok());
        assert!(validate_room_password("123").is_err());
        assert!(validate_room_password("12345").is_err());
        assert!(validate_room_password("12a4").is_err());
        assert!(validate_room_password("").is_err());
    }

    #[test]
    fn test_validate_room_password_error_message() {
        let err = validate_room_password("abc").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Room password must be exactly 4 digits"
        );
    }

    // Slug tests
    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("ABC-DEF").is_ok());
        assert!(validate_slug("XY2-9ZQ").is_ok());
        assert!(validate_slug("abc-def").is_err()); // must be normalized first
        assert!(validate_slug("ABCDEF").is_err());
        assert!(validate_slug("AB0-DEF").is_err()); // ambiguous char
    }

    #[test]
    fn test_validate_slug_accepts_generated() {
        for _ in 0..50 {
            let slug = crate::slug::generate();
            assert!(validate_slug(&slug).is_ok(), "generated slug {}", slug);
        }
    }
}
