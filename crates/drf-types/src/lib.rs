#![warn(clippy::pedantic)]

pub mod enums;
pub mod error;
pub mod fields;
pub mod image;
pub mod region_type;
pub mod text;

pub use enums::PixelFormat;
pub use error::TypeError;
pub use fields::FieldWireType;
pub use image::ImageHeader;
pub use region_type::RegionType;
pub use text::TextRegion;
