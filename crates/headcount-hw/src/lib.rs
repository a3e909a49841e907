//! headcount-hw — camera capture, overlay rendering and the preview window.
//!
//! Frames come off a V4L2 device through a persistent mmap stream and are
//! converted to packed RGB24 before they leave this crate.

pub mod camera;
pub mod display;
pub mod frame;
pub mod overlay;

pub use camera::{Camera, CameraError, DeviceInfo, FrameSource, PixelFormat};
pub use display::{Display, DisplayError, Headless, PreviewWindow};
pub use frame::{Frame, FrameError};
pub use overlay::{count_label, FaceBox, Overlay};
pub use image::RgbImage;
