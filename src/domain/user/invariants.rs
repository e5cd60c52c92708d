// src/domain/user/invariants.rs

use crate::domain::{DomainError, DomainResult};

/// Login names must carry at least one visible character
pub fn validate_login_name(login_name: &str) -> DomainResult<()> {
    if login_name.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Login name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_login_rejected() {
        assert!(validate_login_name("   ").is_err());
        assert!(validate_login_name("alice").is_ok());
    }
}
