/// Handle errors
pub mod error;
/// Reusable encoding symbol storage
pub mod symbolpool;
