use relay_core::error::{ChannelError, CoreError};

use std::error::Error;
use std::io::{Error as IoError, ErrorKind};
use std::time::Duration;

/// **VALUE**: Verifies channel errors carry the location they were raised at.
///
/// **WHY THIS MATTERS**: Decoding and connecting fail at several points; the location
/// says which one.
///
/// **BUG THIS CATCHES**: Would catch a constructor losing `#[track_caller]`, which would
/// point every error at the constructor itself.
#[test]
fn given_parse_error_when_formatted_then_includes_caller_location() {
    // GIVEN: A parse error raised here
    let err = ChannelError::parse("bad line");

    // WHEN: Formatting
    let text = err.to_string();

    // THEN: Kind, message and this file
    assert!(text.contains("Parse Error"));
    assert!(text.contains("bad line"));
    assert!(text.contains("channel.rs"), "missing location: {text}");
}

/// **VALUE**: Verifies I/O errors keep their source for error chains.
#[test]
fn given_io_error_when_wrapped_then_source_is_preserved() {
    let err = ChannelError::io("Failed to read", IoError::new(ErrorKind::BrokenPipe, "pipe gone"));

    assert!(err.source().is_some());
    assert!(err.to_string().contains("pipe gone"));
    assert!(!err.is_connect_timeout());
}

/// **VALUE**: Verifies connect timeouts are recognisable through the core error.
#[test]
fn given_connect_timeout_when_converted_to_core_error_then_message_is_kept() {
    let err = ChannelError::connect_timeout("/run/relay.sock", Duration::from_millis(1000));
    assert!(err.is_connect_timeout());

    let core: CoreError = err.into();
    assert!(core.to_string().contains("/run/relay.sock"));
}
