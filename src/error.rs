// Form and scheduling errors
// Every variant is recoverable by re-prompting the user; none is fatal.

use serde::Serialize;
use thiserror::Error;

/// Errors produced while turning form input into an event instant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Input does not match `YYYY-MM-DD` / `HH:MM`, or a field is out of range
    #[error("Invalid {field} `{value}`: {expected}")]
    MalformedInput {
        field: &'static str,
        value: String,
        expected: String,
    },

    /// A segment looked numeric to the format check but is not an integer
    #[error("Invalid {field}: `{segment}` is not a number")]
    UnparsableNumber {
        field: &'static str,
        segment: String,
    },

    /// The instant is not in the future under the active policy
    #[error("{reason}")]
    EventInPast { reason: String },
}

impl ScheduleError {
    /// Short machine-readable kind, used in API error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::MalformedInput { .. } => "malformed_input",
            ScheduleError::UnparsableNumber { .. } => "unparsable_number",
            ScheduleError::EventInPast { .. } => "event_in_past",
        }
    }

    pub(crate) fn malformed(field: &'static str, value: &str, expected: impl Into<String>) -> Self {
        ScheduleError::MalformedInput {
            field,
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// A required or badly-shaped form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Why a submitted form could not become a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("{}", join_fields(.0))]
    Fields(Vec<FieldError>),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_displayable() {
        let err = ScheduleError::malformed("date", "2025/12/27", "expected YYYY-MM-DD");
        assert_eq!(
            err.to_string(),
            "Invalid date `2025/12/27`: expected YYYY-MM-DD"
        );
        assert_eq!(err.kind(), "malformed_input");

        let err = ScheduleError::EventInPast {
            reason: "Scheduled date and time must be in the future".to_string(),
        };
        assert_eq!(err.to_string(), "Scheduled date and time must be in the future");
        assert_eq!(err.kind(), "event_in_past");
    }

    #[test]
    fn test_field_errors_are_joined() {
        let err = DraftError::Fields(vec![
            FieldError::new("title", "Required field is empty"),
            FieldError::new("email", "Not a valid email address"),
        ]);

        assert_eq!(
            err.to_string(),
            "title: Required field is empty; email: Not a valid email address"
        );
    }
}
