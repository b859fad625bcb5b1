mod args;
mod error;
