//! Validator Tests
//!
//! These tests verify:
//! - Well-formed messages pass and decode into a Message
//! - Missing and mistyped fields are named in the diagnostic
//! - Unknown commands and version mismatches are rejected
//! - A wrong version wins over every other defect

use lhc_server::protocol::{
    validate, Command, ValidationError, ValidationResult, PROTOCOL_VERSION,
};
use serde_json::{json, Value};

fn well_formed(cmd: &str) -> Value {
    json!({
        "version": PROTOCOL_VERSION,
        "cmd": cmd,
        "from": "client_1",
        "payload": {},
    })
}

fn invalid(value: &Value) -> ValidationError {
    match validate(value, PROTOCOL_VERSION) {
        ValidationResult::Invalid(e) => e,
        ValidationResult::Valid(m) => panic!("expected rejection, got {:?}", m),
    }
}

// =============================================================================
// Accepted Messages
// =============================================================================

#[test]
fn test_every_known_command_is_valid() {
    for command in Command::ALL {
        let value = well_formed(command.as_str());
        match validate(&value, PROTOCOL_VERSION) {
            ValidationResult::Valid(message) => {
                assert_eq!(message.command, command);
                assert_eq!(message.sender, "client_1");
                assert_eq!(message.version, PROTOCOL_VERSION);
                assert!(message.payload.is_empty());
            }
            ValidationResult::Invalid(e) => panic!("{} rejected: {}", command, e),
        }
    }
}

#[test]
fn test_payload_and_target_are_kept() {
    let value = json!({
        "version": PROTOCOL_VERSION,
        "cmd": "SET",
        "from": "client_1",
        "to": "stage",
        "payload": {"positions": [1.0, 2.5]},
    });

    let result = validate(&value, PROTOCOL_VERSION);
    assert!(result.is_valid());
    assert_eq!(result.diagnostic(), None);

    let ValidationResult::Valid(message) = result else {
        unreachable!()
    };
    assert_eq!(message.payload.get("positions"), Some(&json!([1.0, 2.5])));
    assert_eq!(message.target.as_deref(), Some("stage"));
}

#[test]
fn test_extra_fields_are_ignored() {
    let mut value = well_formed("PING");
    value["error_msg"] = Value::Null;
    value["msg"] = json!("Alive?");

    assert!(validate(&value, PROTOCOL_VERSION).is_valid());
}

// =============================================================================
// Shape Errors
// =============================================================================

#[test]
fn test_not_an_object() {
    assert_eq!(
        invalid(&json!([1, 2])),
        ValidationError::NotAnObject { found: "array" }
    );
    assert_eq!(
        invalid(&json!("PING")),
        ValidationError::NotAnObject { found: "string" }
    );
}

#[test]
fn test_each_missing_field_is_named() {
    for field in ["version", "cmd", "from", "payload"] {
        let mut value = well_formed("PING");
        value.as_object_mut().unwrap().remove(field);

        let error = invalid(&value);
        assert!(matches!(error, ValidationError::MissingField(f) if f == field));
        assert!(error.to_string().contains(field));
    }
}

#[test]
fn test_wrong_field_types() {
    let mut value = well_formed("PING");
    value["from"] = json!(42);
    assert_eq!(
        invalid(&value),
        ValidationError::WrongType {
            field: "from",
            expected: "a string",
            found: "number",
        }
    );

    let mut value = well_formed("PING");
    value["payload"] = json!([]);
    assert_eq!(
        invalid(&value),
        ValidationError::WrongType {
            field: "payload",
            expected: "an object",
            found: "array",
        }
    );

    let mut value = well_formed("PING");
    value["version"] = Value::Null;
    assert!(matches!(
        invalid(&value),
        ValidationError::WrongType { field: "version", .. }
    ));
}

// =============================================================================
// Vocabulary and Version
// =============================================================================

#[test]
fn test_unknown_command() {
    let error = invalid(&well_formed("JUMP"));

    assert_eq!(error, ValidationError::UnknownCommand("JUMP".to_string()));
    assert!(error.to_string().contains("Unknown command"));
}

#[test]
fn test_command_is_case_sensitive() {
    assert!(matches!(
        invalid(&well_formed("ping")),
        ValidationError::UnknownCommand(_)
    ));
}

#[test]
fn test_version_mismatch_for_every_command() {
    for command in Command::ALL {
        let mut value = well_formed(command.as_str());
        value["version"] = json!("0.0.1");

        let error = invalid(&value);
        assert_eq!(
            error,
            ValidationError::VersionMismatch {
                expected: PROTOCOL_VERSION.to_string(),
                found: "0.0.1".to_string(),
            }
        );
        assert!(error.to_string().contains("version mismatch"));
    }
}

#[test]
fn test_version_is_exact_string_match() {
    let mut value = well_formed("PING");
    value["version"] = json!(format!("{} ", PROTOCOL_VERSION));
    assert!(matches!(invalid(&value), ValidationError::VersionMismatch { .. }));

    // Validator takes the expected version as a parameter
    let value = well_formed("PING");
    assert!(validate(&value, "9.9.9").diagnostic().is_some());
}

#[test]
fn test_version_mismatch_wins_over_unknown_command() {
    let value = json!({
        "version": "0.0.1",
        "cmd": "FOO",
        "from": "c",
        "payload": {},
    });

    assert!(matches!(
        invalid(&value),
        ValidationError::VersionMismatch { ref found, .. } if found == "0.0.1"
    ));
}

#[test]
fn test_version_mismatch_wins_over_missing_fields() {
    let value = json!({"version": "0.0.1", "cmd": "GET", "payload": {}});
    assert!(matches!(invalid(&value), ValidationError::VersionMismatch { .. }));

    let value = json!({"version": "0.0.1"});
    assert!(matches!(invalid(&value), ValidationError::VersionMismatch { .. }));
}

#[test]
fn test_check_order_after_version() {
    // Missing field wins over unknown command
    let value = json!({"version": PROTOCOL_VERSION, "cmd": "JUMP", "from": "c"});
    assert_eq!(invalid(&value), ValidationError::MissingField("payload"));

    // Missing version is a shape error, not a mismatch
    let value = json!({"cmd": "PING", "from": "c", "payload": {}});
    assert_eq!(invalid(&value), ValidationError::MissingField("version"));
}
