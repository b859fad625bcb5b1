//! Token parser for relay commands.
//!
//! Tolerant by construction: malformed tokens are logged and skipped instead of
//! failing the whole command, so a caller with a slightly wrong argument list
//! still gets its file opened.

use crate::FLAG_PREFIX;
use crate::command::Command;

use std::num::NonZeroU32;
use std::sync::OnceLock;

use log::{trace, warn};
use regex::Regex;

const FLAG_PATTERN: &str = r"^--[A-Za-z][A-Za-z0-9_-]*$";

static FLAG_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_flag_regex() -> &'static Regex {
    FLAG_REGEX.get_or_init(|| Regex::new(FLAG_PATTERN).expect("valid regex pattern"))
}

/// Parse positional tokens into a [`Command`].
///
/// Field order: leading `--flag` tokens, the file path, an optional line and an
/// optional column. Empty tokens before the file path are ignored.
pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Command {
    let mut command = Command::default();
    let mut rest = tokens.iter().map(AsRef::as_ref).peekable();

    while let Some(token) = rest.next_if(|t| t.is_empty() || t.starts_with(FLAG_PREFIX)) {
        if token.is_empty() {
            continue;
        }
        if get_flag_regex().is_match(token) {
            trace!("Parsed flag {token}");
            command.flags.insert(token.to_string());
        } else {
            warn!("Skipping malformed flag token '{}'", token.escape_debug());
        }
    }

    let Some(file_path) = rest.next() else {
        return command;
    };
    command.file_path = Some(file_path.to_string());

    command.line = rest.next().and_then(|token| parse_position("line", token));
    if command.line.is_some() {
        command.column = rest.next().and_then(|token| parse_position("column", token));
    }

    for extra in rest {
        warn!("Ignoring trailing token '{}'", extra.escape_debug());
    }

    command
}

pub(crate) fn parse_position(field: &str, token: &str) -> Option<NonZeroU32> {
    match token.trim().parse::<u32>().ok().and_then(NonZeroU32::new) {
        Some(value) => Some(value),
        None => {
            warn!("Skipping malformed {field} token '{}'", token.escape_debug());
            None
        }
    }
}
