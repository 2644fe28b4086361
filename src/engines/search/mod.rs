pub mod engine;
pub mod progress;

pub use engine::SearchEngine;
pub use progress::{ChannelProgress, ConsoleProgress, ProgressCallback, ProgressMessage, SilentProgress};
