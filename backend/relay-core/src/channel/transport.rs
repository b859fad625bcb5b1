//! Platform endpoints for the command channel.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::path::{Path, PathBuf};

/// Where the channel lives: a socket path on Unix, a pipe name on Windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAddress {
    path: PathBuf,
}

impl ChannelAddress {
    /// Address for a channel name in the default location.
    #[cfg(unix)]
    pub fn for_name(name: &str) -> Self {
        Self::new(crate::runtime_dir().join(format!("{name}.sock")))
    }

    #[cfg(windows)]
    pub fn for_name(name: &str) -> Self {
        Self::new(format!(r"\\.\pipe\{name}"))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for ChannelAddress {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.path.display())
    }
}

#[cfg(unix)]
mod imp {
    use super::ChannelAddress;
    use crate::error::ChannelError;

    use std::fs::{create_dir_all, remove_file};
    use std::io::{Error as IoError, ErrorKind};
    use std::os::unix::net::UnixStream as StdUnixStream;
    use std::path::{Path, PathBuf};

    use log::{debug, warn};
    use tokio::net::{UnixListener, UnixStream};

    pub(crate) type Connection = UnixStream;

    /// Bound inbound endpoint. The socket file is removed when it is dropped.
    pub(crate) struct Endpoint {
        listener: UnixListener,
        path: PathBuf,
    }

    impl Endpoint {
        /// Bind the socket, replacing a stale file left by a crashed server.
        /// A socket that still accepts connections belongs to a live server and
        /// is left alone.
        pub(crate) fn bind(address: &ChannelAddress) -> Result<Self, ChannelError> {
            let path = address.path().to_path_buf();

            if let Some(parent) = path.parent() {
                create_dir_all(parent).map_err(|e| {
                    ChannelError::io(format!("Failed to create {}", parent.display()), e)
                })?;
            }

            match StdUnixStream::connect(&path) {
                Ok(_) => return Err(ChannelError::already_served(path.display().to_string())),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) if e.kind() == ErrorKind::ConnectionRefused => remove_stale(&path)?,
                Err(e) => {
                    return Err(ChannelError::io(
                        format!("Failed to check existing socket {}", path.display()),
                        e,
                    ));
                }
            }

            let listener = UnixListener::bind(&path)
                .map_err(|e| ChannelError::io(format!("Failed to bind {}", path.display()), e))?;

            Ok(Self { listener, path })
        }

        pub(crate) async fn accept(&mut self) -> Result<Connection, ChannelError> {
            let (stream, _addr) = self
                .listener
                .accept()
                .await
                .map_err(|e| ChannelError::io("Failed to accept connection", e))?;
            Ok(stream)
        }
    }

    impl Drop for Endpoint {
        fn drop(&mut self) {
            match remove_file(&self.path) {
                Ok(()) => debug!("Removed socket {}", self.path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove socket {}: {e}", self.path.display()),
            }
        }
    }

    fn remove_stale(path: &Path) -> Result<(), ChannelError> {
        match remove_file(path) {
            Ok(()) => {
                debug!("Removed stale socket {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChannelError::io(
                format!("Failed to remove stale socket {}", path.display()),
                e,
            )),
        }
    }

    pub(crate) async fn connect(address: &ChannelAddress) -> Result<Connection, IoError> {
        UnixStream::connect(address.path()).await
    }

    /// Errors meaning "nobody is listening yet", worth retrying until timeout.
    pub(crate) fn is_not_listening(error: &IoError) -> bool {
        matches!(
            error.kind(),
            ErrorKind::NotFound | ErrorKind::ConnectionRefused
        )
    }
}

#[cfg(windows)]
mod imp {
    use super::ChannelAddress;
    use crate::error::ChannelError;

    use std::ffi::OsString;
    use std::io::{Error as IoError, ErrorKind};

    use tokio::net::windows::named_pipe::{
        ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions,
    };

    const ERROR_PIPE_BUSY: i32 = 231;

    pub(crate) type Connection = NamedPipeServer;

    /// One pipe instance at a time; a new instance is opened for each cycle.
    pub(crate) struct Endpoint {
        name: OsString,
        pending: Option<NamedPipeServer>,
    }

    impl Endpoint {
        pub(crate) fn bind(address: &ChannelAddress) -> Result<Self, ChannelError> {
            let name = address.path().as_os_str().to_os_string();
            let first = ServerOptions::new()
                .first_pipe_instance(true)
                .max_instances(1)
                .create(&name)
                .map_err(|e| ChannelError::io(format!("Failed to create pipe {address}"), e))?;

            Ok(Self {
                name,
                pending: Some(first),
            })
        }

        pub(crate) async fn accept(&mut self) -> Result<Connection, ChannelError> {
            let server = match self.pending.take() {
                Some(server) => server,
                None => ServerOptions::new()
                    .max_instances(1)
                    .create(&self.name)
                    .map_err(|e| ChannelError::io("Failed to open pipe instance", e))?,
            };

            server
                .connect()
                .await
                .map_err(|e| ChannelError::io("Failed to accept pipe client", e))?;
            Ok(server)
        }
    }

    pub(crate) async fn connect(address: &ChannelAddress) -> Result<NamedPipeClient, IoError> {
        ClientOptions::new().open(address.path().as_os_str())
    }

    pub(crate) fn is_not_listening(error: &IoError) -> bool {
        error.kind() == ErrorKind::NotFound || error.raw_os_error() == Some(ERROR_PIPE_BUSY)
    }
}

pub(crate) use imp::{Endpoint, connect, is_not_listening};
