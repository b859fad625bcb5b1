mod command;
mod config;
mod dispatch;
mod launcher;
mod locator;
mod process_table;
mod registry;
mod server;
mod wire;
