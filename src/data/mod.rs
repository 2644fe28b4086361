pub mod connectors;
pub mod events;

pub use connectors::{CsvConnector, DataValidator, DatasetMetadata};
pub use events::{EntityGroup, EventFrame, EventFrameBuilder};
