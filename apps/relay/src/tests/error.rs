// Unit tests for error module
// Tests error serialization and formatting

use crate::error::RelayError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that errors can be serialized.
///
/// **WHY THIS MATTERS**: Errors are written as structured JSON by tooling around the relay.
///
/// **BUG THIS CATCHES**: Would catch if someone removes the `#[derive(Serialize)]`
/// or adds a non-serializable field.
#[test]
fn given_relay_error_when_serialized_then_tagged_json() {
    // GIVEN: A RelayError
    let err = RelayError::NoServer {
        message: String::from("Nobody listening"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_string(&err).expect("serializable");

    // THEN: Variant tag, message and location are present
    assert!(json.contains("\"type\":\"NoServer\""), "got {json}");
    assert!(json.contains("Nobody listening"));
    assert!(json.contains("\"line\""));
}

/// **VALUE**: Verifies Display includes the variant label and location.
#[test]
fn given_core_error_when_formatted_then_label_and_location_present() {
    let err = RelayError::Core {
        message: String::from("Failed to bind"),
        location: ErrorLocation::from(Location::caller()),
    };

    let text = err.to_string();

    assert!(text.starts_with("Core Error: Failed to bind"));
    assert!(text.contains("error.rs"));
}
