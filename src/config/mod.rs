pub mod traits;
pub mod search;
pub mod manager;

pub use manager::{AppConfig, ColumnConfig, ConfigManager, LabelConfig};
pub use search::{ErrorPolicy, ExampleLimit, SearchConfig};
pub use traits::ConfigSection;
