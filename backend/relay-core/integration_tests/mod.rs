mod arbiter;
mod channel;
mod dispatch;
mod error;
mod launcher;
mod resolver;
mod support;
