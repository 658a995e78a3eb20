#![warn(clippy::pedantic)]

pub mod compression;
pub mod encoder;
pub mod error;

pub use encoder::DocumentEncoder;
pub use error::EncodeError;
