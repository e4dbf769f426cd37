use super::ApiError;
use crate::constants::limits::MIN_PASSWORD_LEN;

pub fn validate_account_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid account ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

/// Password rule applied before the reset flow stores a credential: minimum
/// length plus one of each character class.
pub fn validate_new_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if !(has_lower && has_upper && has_digit && has_special) {
        return Err(ApiError::validation(
            "Password must contain at least one uppercase, one lowercase, one number, and one special character",
        ));
    }

    Ok(password)
}

pub fn validate_token_value(token: &str) -> Result<&str, ApiError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Token cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_account_id() {
        assert!(validate_account_id(1).is_ok());
        assert!(validate_account_id(12345).is_ok());
        assert!(validate_account_id(0).is_err());
        assert!(validate_account_id(-1).is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("NewP@ss1").is_ok());
        assert!(validate_new_password("Str0ng-enough").is_ok());

        assert!(validate_new_password("short").is_err());
        assert!(validate_new_password("alllowercase1!").is_err());
        assert!(validate_new_password("ALLUPPERCASE1!").is_err());
        assert!(validate_new_password("NoDigitsHere!").is_err());
        assert!(validate_new_password("NoSpecials123").is_err());
    }

    #[test]
    fn test_validate_token_value() {
        assert!(validate_token_value("abc123").is_ok());
        assert!(validate_token_value("  padded  ").is_ok());
        assert!(validate_token_value("").is_err());
        assert!(validate_token_value("   ").is_err());
    }
}
