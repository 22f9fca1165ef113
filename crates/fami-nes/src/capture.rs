//! Headless capture: PNG screenshots.

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use crate::ppu::{FB_HEIGHT, FB_WIDTH};
use crate::Nes;

/// Save the current framebuffer as a PNG file.
///
/// The framebuffer is already RGBA8, which is what the encoder wants.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_screenshot(nes: &Nes, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, FB_WIDTH as u32, FB_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(nes.framebuffer())?;
    Ok(())
}
