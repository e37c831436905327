//! Protocol validator
//!
//! Pure check of a decoded message against an expected protocol version.
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the message is an object
//! 2. `version` is a string equal to the expected version exactly
//! 3. shape: `cmd`, `from` (strings) and `payload` (object)
//! 4. `cmd` belongs to the command vocabulary
//!
//! A wrong version is therefore reported whatever the other fields hold.

use serde_json::Value;
use thiserror::Error;

use super::{Command, Message, Payload};

/// Why a message was rejected; `Display` is the diagnostic sent back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Message must be an object, got {found}.")]
    NotAnObject { found: &'static str },

    #[error("Message must contain '{0}' field.")]
    MissingField(&'static str),

    #[error("Field '{field}' must be {expected}, not {found}.")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown command: '{0}'.")]
    UnknownCommand(String),

    #[error("Protocol version mismatch: expected {expected}, got {found}.")]
    VersionMismatch { expected: String, found: String },
}

/// Outcome of [`validate`]
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid(Message),
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    /// Human-readable reason, `None` when valid
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(e) => Some(e.to_string()),
        }
    }
}

/// Validate a decoded message
///
/// Total over every JSON value: never panics, never returns an error type.
pub fn validate(value: &Value, expected_version: &str) -> ValidationResult {
    match check(value, expected_version) {
        Ok(message) => ValidationResult::Valid(message),
        Err(e) => ValidationResult::Invalid(e),
    }
}

fn check(value: &Value, expected_version: &str) -> Result<Message, ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject {
        found: type_name(value),
    })?;

    // Version
    let version = string_field(object, "version")?;
    if version != expected_version {
        return Err(ValidationError::VersionMismatch {
            expected: expected_version.to_string(),
            found: version.to_string(),
        });
    }

    // Shape
    let cmd = string_field(object, "cmd")?;
    let sender = string_field(object, "from")?;
    let payload = match object.get("payload") {
        None => return Err(ValidationError::MissingField("payload")),
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return Err(ValidationError::WrongType {
                field: "payload",
                expected: "an object",
                found: type_name(other),
            })
        }
    };

    // Vocabulary
    let command: Command = cmd
        .parse()
        .map_err(|_| ValidationError::UnknownCommand(cmd.to_string()))?;

    let target = object.get("to").and_then(Value::as_str).map(str::to_string);

    Ok(Message {
        version: version.to_string(),
        command,
        sender: sender.to_string(),
        payload,
        target,
    })
}

fn string_field<'a>(
    object: &'a Payload,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match object.get(field) {
        None => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
            found: type_name(other),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
