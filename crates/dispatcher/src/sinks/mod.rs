//! Sink implementations
//!
//! Contains LogSink and ChannelSink.

mod channel;
mod log;

pub use self::channel::ChannelSink;
pub use self::log::LogSink;
