pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod labeling;
pub mod labels;
pub mod types;

pub use config::{AppConfig, ConfigManager, ErrorPolicy, ExampleLimit, SearchConfig};
pub use data::{CsvConnector, EventFrame};
pub use engines::search::SearchEngine;
pub use engines::windowing::{MinimumData, Offset, Span, WindowCursor, WindowPlan, WindowSize};
pub use error::{LabelcraftError, Result};
pub use labeling::{LabelFunction, LabelOutput, LabelingFunction, Params, WindowView};
pub use labels::{BinOptions, Bins, LabelRecord, LabelTable, SampleOptions, SampleSpec};
pub use types::{LabelType, Timestamp, Value};
