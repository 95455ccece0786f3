//! Image handling: source classification, loading, extraction, and
//! preparation for transmission.

pub mod extract;
pub mod prepare;
pub mod source;

pub use extract::ImageExtractor;
pub use source::{ImageLoader, ImageSource};
