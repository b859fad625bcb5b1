//! Line codec for the command channel.
//!
//! One command per line: UTF-8 text, fields joined with [`FIELD_SEPARATOR`],
//! terminated by `\n`. There is no escaping, so a separator byte inside a path
//! cannot be carried.

use crate::FIELD_SEPARATOR;
use crate::command::{Command, parser};
use crate::error::ChannelError;

use std::str::from_utf8;

pub fn encode(command: &Command) -> String {
    let mut line = command.tokens().join(&FIELD_SEPARATOR.to_string());
    line.push('\n');
    line
}

/// Decode one line. Returns `None` for empty or whitespace-only lines.
pub fn decode(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\n', '\r']);

    if line.trim().is_empty() {
        return None;
    }

    let tokens: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    Some(parser::parse(&tokens))
}

/// Decode raw bytes read from a connection.
#[track_caller]
pub fn decode_bytes(bytes: &[u8]) -> Result<Option<Command>, ChannelError> {
    let line = from_utf8(bytes)
        .map_err(|e| ChannelError::parse(format!("Command line is not valid UTF-8: {e}")))?;
    Ok(decode(line))
}
