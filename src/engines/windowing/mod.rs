pub mod cursor;
pub mod span;

pub use cursor::{Window, WindowCursor, WindowPlan};
pub use span::{MinimumData, Offset, Span, WindowSize};
