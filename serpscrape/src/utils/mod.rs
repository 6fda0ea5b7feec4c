//! Validation and timestamp helpers.

pub mod timestamps;
mod validation;

pub use timestamps::iso_timestamp;
pub use validation::{validate_run_params, Limits};
