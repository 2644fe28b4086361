pub mod binning;
pub mod describe;
pub mod export;
pub mod metadata;
pub mod table;
pub mod transforms;

pub use binning::{BinOptions, Bins};
pub use describe::{ContinuousSummary, Description};
pub use metadata::{EntitySummary, SampleSpec, SearchMetadata, TransformRecord, METADATA_VERSION};
pub use table::{LabelRecord, LabelTable};
pub use transforms::SampleOptions;
