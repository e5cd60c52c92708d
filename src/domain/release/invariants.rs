// src/domain/release/invariants.rs

use crate::domain::{DomainError, DomainResult};

pub fn validate_year(year: Option<i32>) -> DomainResult<()> {
    if let Some(y) = year {
        if !(0..=9999).contains(&y) {
            return Err(DomainError::InvariantViolation(format!(
                "Release year {} is out of range",
                y
            )));
        }
    }
    Ok(())
}

pub fn validate_total_disc(total_disc: Option<u32>) -> DomainResult<()> {
    if total_disc == Some(0) {
        return Err(DomainError::InvariantViolation(
            "Total disc count cannot be zero".to_string(),
        ));
    }
    Ok(())
}

/// Invariants that must hold true for Release:
///
/// 1. Name is never longer than the configured maximum
/// 2. Duration is derived from tracks, never stored
/// 3. Orphan status is derived (no referencing track), never stored
/// 4. At most one row carries the reserved "<None>" name

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_disc_rejected() {
        assert!(validate_total_disc(Some(0)).is_err());
        assert!(validate_total_disc(Some(2)).is_ok());
        assert!(validate_total_disc(None).is_ok());
    }

    #[test]
    fn test_year_range() {
        assert!(validate_year(Some(1969)).is_ok());
        assert!(validate_year(Some(-1)).is_err());
        assert!(validate_year(None).is_ok());
    }
}
