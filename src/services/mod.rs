pub mod account;
pub mod booking;

use std::collections::BTreeMap;

use serde::Serialize;

/// Field name (as submitted by the form) to its error messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Result object handed back to form callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionState {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ActionState {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            message: message.into(),
            errors: Some(errors),
        }
    }
}
