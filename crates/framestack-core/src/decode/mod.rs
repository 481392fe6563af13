//! Image decoding for framestack.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG, WebP, BMP and GIF images to RGBA
//! - Honouring the EXIF orientation tag, the way a browser `<img>` does
//! - Decoding a whole selection while skipping unreadable images
//!
//! # Architecture
//!
//! Decoding is synchronous. Fetching the bytes (and timing that out) belongs
//! to the caller; see [`crate::loader`] for a runtime-agnostic helper.
//!
//! # Examples
//!
//! ```ignore
//! use framestack_core::decode::decode_image;
//!
//! let bytes = std::fs::read("frame.png").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod batch;
mod reader;
mod types;

pub use batch::decode_batch;
pub use reader::{decode_image, get_orientation};
pub use types::{DecodeError, DecodedImage, Orientation};
