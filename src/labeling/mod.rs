pub mod builtin;
pub mod function;
pub mod view;

pub use builtin::Aggregation;
pub use function::{validate_params, LabelFunction, LabelOutput, LabelingFunction, Params};
pub use view::{WindowContext, WindowView};
