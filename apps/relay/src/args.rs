//! Invocation parsing.
//!
//! `editor-relay [--server] [--new] <file> [line] [column]`

use relay_core::SERVER_FLAG;
use relay_core::command::Command;
use relay_core::command::parser::parse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    force_server: bool,
    command: Command,
}

impl Invocation {
    /// A leading `--server` is consumed here, before the rest is parsed as a
    /// command, so it never travels over the channel.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();

        let force_server = tokens.first().is_some_and(|t| t == SERVER_FLAG);
        if force_server {
            tokens.remove(0);
        }

        Self {
            force_server,
            command: parse(&tokens),
        }
    }

    pub fn force_server(&self) -> bool {
        self.force_server
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn into_command(self) -> Command {
        self.command
    }

    /// Whether there is anything worth sending or resolving.
    pub fn has_request(&self) -> bool {
        self.command.file_path().is_some()
    }
}
