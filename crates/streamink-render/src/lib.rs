//! StreamInk Render Library
//!
//! Layered page rendering for StreamInk. [`RenderController`] keeps the
//! slide, action and volatile surfaces in sync with a page; [`RasterSurface`]
//! is the CPU surface used headless and in tests.

mod controller;
mod raster;
mod renderer;

pub use controller::{RenderController, RenderStats, device_to_page};
pub use raster::RasterSurface;
pub use renderer::{RenderOptions, RenderResult, RenderSurface, RendererError, view_transform};
