#![warn(clippy::pedantic)]

pub mod error;
pub mod header;
pub mod region_frame;
pub mod varint;

pub use error::WireError;
