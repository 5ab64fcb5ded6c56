//! Step type registry errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Step type already registered: {0}")]
    DuplicateType(String),

    #[error("Unknown step type: {0}")]
    UnknownType(String),

    #[error("Invalid definition for {type_id}: {reason}")]
    InvalidDefinition { type_id: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_type_display() {
        let err = RegistryError::DuplicateType("CLICK_ELEMENT".to_string());
        assert!(err.to_string().contains("already registered"));
        assert!(err.to_string().contains("CLICK_ELEMENT"));
    }

    #[test]
    fn test_unknown_type_display() {
        let err = RegistryError::UnknownType("NOPE".to_string());
        assert_eq!(err.to_string(), "Unknown step type: NOPE");
    }

    #[test]
    fn test_invalid_definition_display() {
        let err = RegistryError::InvalidDefinition {
            type_id: "WAIT".to_string(),
            reason: "duplicate parameter key 'seconds'".to_string(),
        };
        assert!(err.to_string().contains("WAIT"));
        assert!(err.to_string().contains("seconds"));
    }
}
