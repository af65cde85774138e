pub mod error;
pub mod fs;
pub mod manifest;
pub mod source;
