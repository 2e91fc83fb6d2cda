//! Value-constraint validation for entity and observation payloads.
//!
//! The database carries the same rules as `CHECK` constraints. Checking
//! them here first lets a rejected write name the offending field instead
//! of surfacing a bare engine message, and keeps malformed payloads from
//! ever opening a transaction.

/// A write payload violated a shape or value constraint.
///
/// Always local to the call that produced it and never retried
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was absent or empty.
    #[error("missing required field `{field}`")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A numeric field fell outside its allowed domain.
    #[error("field `{field}` = {value} violates `{rule}`")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: i64,
        /// Human-readable rule, e.g. `>= 1`.
        rule: &'static str,
    },

    /// The payload references an entity that does not exist in the store.
    #[error("{entity} {id} does not exist")]
    MissingReference {
        /// Kind of the referenced entity (`player`, `faction`).
        entity: &'static str,
        /// The referenced identifier.
        id: i64,
    },

    /// The payload could not be decoded into a typed record.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The storage engine rejected the row on a constraint not caught above.
    #[error("constraint violation: {0}")]
    Constraint(String),
}

/// Implemented by every payload that can be written to the store.
pub trait Validate {
    /// Check every field constraint, returning the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first rule that failed.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Require `value >= 0` when present.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] for a negative value.
pub const fn non_negative(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::OutOfRange {
            field,
            value: v,
            rule: ">= 0",
        }),
        _ => Ok(()),
    }
}

/// Require `value >= 1` when present.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] for a value below one.
pub const fn at_least_one(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < 1 => Err(ValidationError::OutOfRange {
            field,
            value: v,
            rule: ">= 1",
        }),
        _ => Ok(()),
    }
}

/// Require `value > 0` when present.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] for zero or a negative value.
pub const fn positive(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v <= 0 => Err(ValidationError::OutOfRange {
            field,
            value: v,
            rule: "> 0",
        }),
        _ => Ok(()),
    }
}

/// Require a non-blank string.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] when the string is empty or
/// whitespace only.
pub fn required_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_pass_every_rule() {
        assert!(non_negative("respect", None).is_ok());
        assert!(at_least_one("level", None).is_ok());
        assert!(positive("life_maximum", None).is_ok());
    }

    #[test]
    fn boundaries() {
        assert!(non_negative("respect", Some(0)).is_ok());
        assert!(at_least_one("level", Some(1)).is_ok());
        assert_eq!(
            at_least_one("level", Some(0)),
            Err(ValidationError::OutOfRange {
                field: "level",
                value: 0,
                rule: ">= 1",
            })
        );
        assert!(positive("life_maximum", Some(0)).is_err());
    }

    #[test]
    fn blank_name_is_missing() {
        assert_eq!(
            required_text("name", "   "),
            Err(ValidationError::MissingField { field: "name" })
        );
    }

    #[test]
    fn display_names_the_field() {
        let err = ValidationError::OutOfRange {
            field: "life_maximum",
            value: -3,
            rule: "> 0",
        };
        let msg = format!("{err}");
        assert!(msg.contains("life_maximum"));
        assert!(msg.contains("-3"));
    }
}
