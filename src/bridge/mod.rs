pub mod context;
pub mod engine;
pub mod sink;

pub use context::BridgeContext;
pub use engine::Bridge;
pub use sink::{ChannelSink, LoggingSink};

#[cfg(test)]
mod tests;
