use crate::error::ApiError;

/// Checks required request fields in declared order and reports the first
/// empty one. Only the first failure is surfaced, so the order of `fields`
/// is part of the endpoint contract.
pub fn require_fields(fields: &[(&str, &str)]) -> Result<(), ApiError> {
    for (label, value) in fields {
        if value.is_empty() {
            return Err(ApiError::Validation(format!(
                "{label} not found on request body"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_when_all_fields_present() {
        let result = require_fields(&[("Email", "a@x.com"), ("Password", "123456")]);
        assert!(result.is_ok());
    }

    #[test]
    fn reports_first_missing_field_only() {
        let err = require_fields(&[("Email", ""), ("Password", ""), ("Nickname", "")])
            .expect_err("should fail");
        assert_eq!(err.to_string(), "Email not found on request body");
    }

    #[test]
    fn later_fields_checked_once_earlier_ones_pass() {
        let err = require_fields(&[("Email", "a@x.com"), ("Password", ""), ("Nickname", "nick")])
            .expect_err("should fail");
        assert_eq!(err.to_string(), "Password not found on request body");

        let err = require_fields(&[("Email", "a@x.com"), ("Password", "123456"), ("Nickname", "")])
            .expect_err("should fail");
        assert_eq!(err.to_string(), "Nickname not found on request body");
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let err = require_fields(&[("Login", "")]).expect_err("should fail");
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.to_string(), "Login not found on request body");
    }
}
