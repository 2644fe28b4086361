pub mod search;
pub mod windowing;
