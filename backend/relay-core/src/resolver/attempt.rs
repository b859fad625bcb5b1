use crate::command::Command;
use crate::project::ProjectIdentifier;

use std::fmt::{Display, Formatter, Result as FormatResult};

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The file was opened through a live host handle.
    Opened,
    /// The request was handed to the host's own command line.
    FallbackOpened,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Started,
    ProbeExisting,
    LaunchHost,
    PollForHost,
    OpenInHost,
    FallbackLaunch,
    Terminal(Outcome),
}

impl Display for ResolutionState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Terminal(outcome) => write!(formatter, "Terminal({outcome:?})"),
            other => write!(formatter, "{other:?}"),
        }
    }
}

/// Transient record of one resolution. Created per incoming command and
/// discarded once it reaches a terminal state.
#[derive(Debug, Clone)]
pub struct ResolutionAttempt {
    target: Option<ProjectIdentifier>,
    command: Command,
    state: ResolutionState,
    poll_count: u32,
}

impl ResolutionAttempt {
    pub fn new(command: Command, target: Option<ProjectIdentifier>) -> Self {
        Self {
            target,
            command,
            state: ResolutionState::Started,
            poll_count: 0,
        }
    }

    pub fn target(&self) -> Option<&ProjectIdentifier> {
        self.target.as_ref()
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    pub fn poll_count(&self) -> u32 {
        self.poll_count
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            ResolutionState::Terminal(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub(crate) fn transition(&mut self, next: ResolutionState) {
        debug!("Resolution {} -> {next}", self.state);
        self.state = next;
    }

    pub(crate) fn record_poll(&mut self) {
        self.poll_count += 1;
    }
}
