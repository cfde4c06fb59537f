//! Command handlers - kept out of main.rs for testability

pub mod convert;

pub use convert::{build_request, execute_convert};
