use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Summary of a loaded event file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub file_path: String,
    pub num_rows: usize,
    pub num_columns: usize,
    pub columns: Vec<String>,
    pub entity_column: String,
    pub time_column: String,
    pub num_entities: usize,
    pub time_range: Option<(Timestamp, Timestamp)>,
    /// Columns with nulls and their counts
    pub null_counts: Vec<(String, usize)>,
}
