//! Binary PPM (P6) dump of panel memory

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ssd1331_display::{Rgb565, HEIGHT, WIDTH};

/// Write RGB565 pixels, row-major, as an RGB888 P6 image
pub fn write_ppm<W: Write>(out: &mut W, pixels: &[u16]) -> Result<()> {
    write!(out, "P6\n{} {}\n255\n", WIDTH, HEIGHT)?;
    for &pixel in pixels {
        let (r, g, b) = Rgb565(pixel).to_rgb888();
        out.write_all(&[r, g, b])?;
    }
    out.flush()?;
    Ok(())
}

/// Dump to a file
pub fn save_ppm(path: &Path, pixels: &[u16]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create image: {}", path.display()))?;
    write_ppm(&mut BufWriter::new(file), pixels)
        .with_context(|| format!("Failed to write image: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssd1331_display::display::framebuffer::PIXELS;

    #[test]
    fn test_header_and_size() {
        let pixels = vec![Rgb565::RED.0; PIXELS];
        let mut out = Vec::new();
        write_ppm(&mut out, &pixels).unwrap();

        let header = b"P6\n96 64\n255\n";
        assert!(out.starts_with(header));
        assert_eq!(out.len(), header.len() + PIXELS * 3);
        assert_eq!(out[header.len()], 0xFF);
        assert_eq!(out[header.len() + 1], 0x00);
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.ppm");
        save_ppm(&path, &[0u16; PIXELS]).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 13 + PIXELS * 3);
    }
}
