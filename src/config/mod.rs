//! Settings file parsing (`file`) and the fully resolved configuration (`runtime`).

pub mod file;
pub mod runtime;
