// Opens a picture file and converts it into surface pixels.
// The engine never reads files; the demo uses this to start from a real image
// instead of a blank page.

use flood_canvas::{Error, PixelBuffer, argb};
use std::path::Path;

/// Decode any format the `image` crate knows into packed 0xAARRGGBB pixels.
pub fn load(path: &Path) -> Result<PixelBuffer, Error> {
    // 1) Decode (this is where unsupported or broken files fail).
    let img = image::open(path)
        .map_err(|e| Error::Image(format!("Open {}: {e}", path.display())))?;

    // 2) Normalize to RGBA8 so every format packs the same way.
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();

    // 3) Pack row-major, the layout the engine and the window both use.
    let mut out = Vec::with_capacity((w as usize) * (h as usize));
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        out.push(argb(a, r, g, b));
    }

    PixelBuffer::from_pixels(w as usize, h as usize, out)
}
