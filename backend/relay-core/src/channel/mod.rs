//! Command channel between short-lived clients and the relay server.
//!
//! Single consumer, many producers: the server accepts one connection at a
//! time and decodes exactly one command line from it; a client connects, writes
//! one line and disconnects. On Unix the endpoint is a domain socket, on
//! Windows a named pipe.

pub mod client;
pub mod server;
mod transport;

pub use client::send;
pub use server::{ChannelServer, ServerSettings, ServerState};
pub use transport::ChannelAddress;
