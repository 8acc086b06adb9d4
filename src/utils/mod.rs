//! Shared helpers: email plus-addressing, path arithmetic and cross-document
//! validation.

pub mod email;
pub mod paths;
pub mod validation;

pub use email::{plus_address, split_email};
pub use paths::relative_path;
pub use validation::validate_config;
