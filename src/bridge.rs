// Keeps the engine's buffer and the host surface in step.
// Both directions are full O(width*height) passes; the surface is the slow side.

use crate::error::{Error, Result};
use crate::surface::{Surface, keep_paint};
use crate::types::PixelBuffer;
use tracing::{debug, trace};

/// Fresh, zeroed buffer sized to the surface as it is right now.
pub fn rebind(surface: &dyn Surface) -> PixelBuffer {
    let (w, h) = (surface.width(), surface.height());
    debug!(width = w, height = h, "allocating buffer for surface");
    PixelBuffer::new(w, h)
}

fn check_dimensions(buffer: &PixelBuffer, surface: &dyn Surface) -> Result<()> {
    let actual = (surface.width(), surface.height());
    if buffer.dimensions() != actual {
        return Err(Error::DimensionMismatch { expected: buffer.dimensions(), actual });
    }
    Ok(())
}

/// Read every surface pixel into `buffer`.
/// On a read failure the buffer keeps whatever was copied so far.
pub fn sync_from_surface(surface: &dyn Surface, buffer: &mut PixelBuffer) -> Result<()> {
    check_dimensions(buffer, surface)?;
    let (w, h) = buffer.dimensions();
    for y in 0..h {
        for x in 0..w {
            let color = surface.get_pixel(x, y)?;
            buffer.set(x, y, color);
        }
    }
    trace!(width = w, height = h, "buffer synced from surface");
    Ok(())
}

/// Paint every buffer pixel onto the surface (paint color + point per pixel).
/// The surface's paint color is put back afterwards, also when a draw fails.
pub fn sync_to_surface(buffer: &PixelBuffer, surface: &mut dyn Surface) -> Result<()> {
    check_dimensions(buffer, surface)?;
    let result = keep_paint(surface, |surface| paint_all(buffer, surface));
    surface.invalidate();
    result
}

fn paint_all(buffer: &PixelBuffer, surface: &mut dyn Surface) -> Result<()> {
    let w = buffer.width();
    let mut current = None;
    for (idx, &color) in buffer.pixels().iter().enumerate() {
        // Only touch the paint color when it actually changes.
        if current != Some(color) {
            surface.set_paint_color(color);
            current = Some(color);
        }
        surface.draw_point((idx % w) as i32, (idx / w) as i32)?;
    }
    trace!(pixels = buffer.pixels().len(), "buffer painted onto surface");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SoftwareSurface;

    /// Draws `points_left` points, then every further point fails.
    struct RunsDry {
        inner: SoftwareSurface,
        points_left: usize,
    }

    impl Surface for RunsDry {
        fn width(&self) -> usize {
            self.inner.width()
        }

        fn height(&self) -> usize {
            self.inner.height()
        }

        fn get_pixel(&self, x: usize, y: usize) -> Result<u32> {
            self.inner.get_pixel(x, y)
        }

        fn set_pixel(&mut self, x: usize, y: usize, color: u32) -> Result<()> {
            self.inner.set_pixel(x, y, color)
        }

        fn paint_color(&self) -> u32 {
            self.inner.paint_color()
        }

        fn set_paint_color(&mut self, color: u32) {
            self.inner.set_paint_color(color)
        }

        fn draw_point(&mut self, x: i32, y: i32) -> Result<()> {
            if self.points_left == 0 {
                return Err(Error::Surface("out of ink".into()));
            }
            self.points_left -= 1;
            self.inner.draw_point(x, y)
        }

        fn draw_circle(&mut self, x: i32, y: i32, radius: f32, filled: bool) -> Result<()> {
            self.inner.draw_circle(x, y, radius, filled)
        }

        fn clear(&mut self) {
            self.inner.clear()
        }

        fn invalidate(&mut self) {
            self.inner.invalidate()
        }
    }

    #[test]
    fn failed_draw_still_restores_paint_and_invalidates() {
        let src = PixelBuffer::filled(3, 2, 0xFF11_1111);
        let inner = SoftwareSurface::new(3, 2, 0xFFFF_FFFF);
        let mut surface = RunsDry { inner: inner.clone(), points_left: 2 };
        surface.set_paint_color(0xFF00_00FF);

        assert_eq!(
            sync_to_surface(&src, &mut surface),
            Err(Error::Surface("out of ink".into()))
        );
        assert_eq!(surface.paint_color(), 0xFF00_00FF);
        assert_eq!(inner.invalidations(), 1);
        // the first two points made it before the failure
        assert_eq!(inner.get_pixel(1, 0).unwrap(), 0xFF11_1111);
        assert_eq!(inner.get_pixel(2, 0).unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn round_trip_through_the_surface() {
        let mut src = PixelBuffer::filled(3, 2, 0xFF11_1111);
        src.set(2, 1, 0xFF22_2222);
        let mut surface = SoftwareSurface::new(3, 2, 0xFFFF_FFFF);
        surface.set_paint_color(0xFF00_00FF);

        sync_to_surface(&src, &mut surface).unwrap();
        assert_eq!(surface.paint_color(), 0xFF00_00FF);
        assert_eq!(surface.invalidations(), 1);

        let mut back = rebind(&surface);
        assert_eq!(back.pixels(), &[0; 6]);
        sync_from_surface(&surface, &mut back).unwrap();
        assert_eq!(back, src);
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let surface = SoftwareSurface::new(4, 4, 0);
        let mut small = PixelBuffer::new(2, 2);
        assert_eq!(
            sync_from_surface(&surface, &mut small),
            Err(Error::DimensionMismatch { expected: (2, 2), actual: (4, 4) })
        );
    }
}
