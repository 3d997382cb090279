//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with content sniffing |
//! | **Resize (fit)** | `resize_exact` to the fitted box, Lanczos3 |
//! | **Resize (crop)** | fill-resize + center `crop_imm` |
//! | **Encode** | source format; JPEG quality configurable |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Building backend parameters from thumbnail requests

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, ResizedImage};
pub use calculations::{
    calculate_crop_dimensions, calculate_fill_dimensions, calculate_fit_dimensions,
};
pub use operations::{ThumbnailConfig, plan_resize};
pub use params::{Quality, ResizeParams, Sharpening};
pub use rust_backend::RustBackend;
