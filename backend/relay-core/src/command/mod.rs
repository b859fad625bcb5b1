//! The command a client hands to the relay server.
//!
//! A [`Command`] is immutable once built: every downstream decision branches on
//! its fields, so there are no setters. Build one with [`CommandBuilder`] or by
//! decoding a wire line with [`wire::decode`].

pub mod parser;
pub mod wire;

use crate::error::ChannelError;
use crate::{FIELD_SEPARATOR, FLAG_PREFIX, NEW_INSTANCE_FLAG};

use std::collections::BTreeSet;
use std::num::NonZeroU32;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    flags: BTreeSet<String>,
    file_path: Option<String>,
    line: Option<NonZeroU32>,
    column: Option<NonZeroU32>,
}

impl Command {
    pub fn flags(&self) -> &BTreeSet<String> {
        &self.flags
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Whether the caller asked for a separate host instead of reusing one.
    pub fn is_new_instance(&self) -> bool {
        self.has_flag(NEW_INSTANCE_FLAG)
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn line(&self) -> Option<NonZeroU32> {
        self.line
    }

    /// Parsed but not used by resolution.
    pub fn column(&self) -> Option<NonZeroU32> {
        self.column
    }

    /// Positional tokens in wire order: flags, file path, line, column.
    ///
    /// The column is only emitted when a line is present, since the protocol is
    /// positional and a lone trailing number always decodes as the line.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.flags.iter().cloned().collect();

        if let Some(file_path) = &self.file_path {
            tokens.push(file_path.clone());

            if let Some(line) = self.line {
                tokens.push(line.to_string());

                if let Some(column) = self.column {
                    tokens.push(column.to_string());
                }
            }
        }

        tokens
    }
}

/// Builder for validated [`Command`] values.
#[derive(Debug, Default)]
pub struct CommandBuilder {
    flags: BTreeSet<String>,
    file_path: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
}

impl CommandBuilder {
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    pub fn with_new_instance(self) -> Self {
        self.with_flag(NEW_INSTANCE_FLAG)
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    /// Build the Command, rejecting values the wire format cannot carry.
    #[track_caller]
    pub fn build(self) -> Result<Command, ChannelError> {
        for flag in &self.flags {
            if !flag.starts_with(FLAG_PREFIX) || flag.len() == FLAG_PREFIX.len() {
                return Err(ChannelError::parse(format!(
                    "Flag '{flag}' must start with '{FLAG_PREFIX}' and name a flag"
                )));
            }
            if contains_reserved(flag) {
                return Err(ChannelError::parse(format!(
                    "Flag '{}' contains a reserved character",
                    flag.escape_debug()
                )));
            }
        }

        if let Some(file_path) = &self.file_path {
            if file_path.is_empty() {
                return Err(ChannelError::parse("File path cannot be empty"));
            }
            if contains_reserved(file_path) {
                return Err(ChannelError::parse(format!(
                    "File path '{}' contains a reserved character",
                    file_path.escape_debug()
                )));
            }
            if file_path.starts_with(FLAG_PREFIX) {
                return Err(ChannelError::parse(format!(
                    "File path '{file_path}' would be read back as a flag"
                )));
            }
        }

        let line = positive("line", self.line)?;
        let column = positive("column", self.column)?;

        if column.is_some() && line.is_none() {
            return Err(ChannelError::parse("Column requires a line number"));
        }
        if line.is_some() && self.file_path.is_none() {
            return Err(ChannelError::parse("Line number requires a file path"));
        }

        Ok(Command {
            flags: self.flags,
            file_path: self.file_path,
            line,
            column,
        })
    }
}

fn contains_reserved(value: &str) -> bool {
    value.contains(FIELD_SEPARATOR) || value.contains('\n') || value.contains('\r')
}

#[track_caller]
fn positive(field: &str, value: Option<u32>) -> Result<Option<NonZeroU32>, ChannelError> {
    match value {
        None => Ok(None),
        Some(raw) => NonZeroU32::new(raw)
            .map(Some)
            .ok_or_else(|| ChannelError::parse(format!("{field} must be positive, got {raw}"))),
    }
}
