pub mod grid;
pub mod submission;
