pub mod arbiter;
pub mod automation;
pub mod channel;
pub mod config;
pub mod launch;
pub mod probe;
pub mod resolve;

pub use arbiter::ArbiterError;
pub use automation::AutomationError;
pub use channel::ChannelError;
pub use config::ConfigError;
pub use launch::LaunchError;
pub use probe::ProbeError;
pub use resolve::ResolveError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Arbiter(#[from] ArbiterError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
