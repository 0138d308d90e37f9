//! Image rendering for georeferenced rasters.
//!
//! Implements the stages between a loaded grid and an encoded file:
//! - Normalization (percentile stretch, fixed value domain)
//! - Color ramps
//! - Truecolor and scalar image composition
//! - PNG and WebP encoding

pub mod gradient;
pub mod image;
pub mod normalize;
pub mod png;
pub mod webp;

pub use crate::gradient::{Color, Colormap};
pub use crate::image::{compose_scalar, compose_truecolor, PixelFormat, RenderedImage};
pub use crate::normalize::{StretchParams, ValueDomain};
pub use crate::png::encode_png;
pub use crate::webp::{encode_webp, DEFAULT_WEBP_QUALITY};
