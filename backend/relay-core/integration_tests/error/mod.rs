mod channel;
mod resolve;
