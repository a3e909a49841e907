//! Live preview window and quit-key polling.

use image::RgbImage;
use minifb::{Key, Window, WindowOptions};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("window error: {0}")]
    Window(String),
}

/// Where annotated frames go.
pub trait Display {
    /// Present one frame. `caption` is a short status line (the window title).
    fn show(&mut self, image: &RgbImage, caption: &str) -> Result<(), DisplayError>;

    /// Whether the operator asked to stop (quit key or window closed).
    fn quit_requested(&self) -> bool;
}

/// A desktop window; `q` or closing the window requests quit.
pub struct PreviewWindow {
    title: String,
    window: Option<Window>,
    caption: String,
    buffer: Vec<u32>,
    quit: bool,
}

impl PreviewWindow {
    /// The window is created lazily on the first frame, sized to it.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            window: None,
            caption: String::new(),
            buffer: Vec::new(),
            quit: false,
        }
    }
}

impl Display for PreviewWindow {
    fn show(&mut self, image: &RgbImage, caption: &str) -> Result<(), DisplayError> {
        let (w, h) = (image.width() as usize, image.height() as usize);

        if self.window.is_none() {
            let window = Window::new(&self.title, w, h, WindowOptions::default())
                .map_err(|e| DisplayError::Window(e.to_string()))?;
            tracing::info!(width = w, height = h, "preview window opened");
            self.window = Some(window);
        }
        let Some(window) = self.window.as_mut() else {
            return Ok(());
        };

        if caption != self.caption {
            window.set_title(&format!("{} | {caption}", self.title));
            self.caption = caption.to_string();
        }

        pack_rgb(image.as_raw(), &mut self.buffer);
        window
            .update_with_buffer(&self.buffer, w, h)
            .map_err(|e| DisplayError::Window(e.to_string()))?;

        if !window.is_open() || window.is_key_down(Key::Q) {
            self.quit = true;
        }
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// No-op display for running without a screen.
#[derive(Debug, Default)]
pub struct Headless;

impl Display for Headless {
    fn show(&mut self, _image: &RgbImage, _caption: &str) -> Result<(), DisplayError> {
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        false
    }
}

/// Pack RGB24 bytes into minifb's `0RGB` u32 pixels, reusing `out`.
fn pack_rgb(rgb: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        rgb.chunks_exact(3)
            .map(|p| (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32),
    );
}
