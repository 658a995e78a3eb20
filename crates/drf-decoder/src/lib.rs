#![warn(clippy::pedantic)]

pub mod config;
pub mod document;
pub mod error;
pub mod image;
pub mod reader;

mod decompression;

pub use config::{DecoderConfig, LazyPolicy};
pub use document::{Document, Region};
pub use error::DecodeError;
pub use image::{ImageRegion, LazyImage};
pub use reader::DocumentReader;
