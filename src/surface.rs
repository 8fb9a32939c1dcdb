// The drawing surface the engine renders into.
// The host owns the visible view; the engine only sees this trait.
// `SoftwareSurface` is an in-memory implementation the demo window presents
// every frame (and the tests inspect).

use crate::error::{Error, Result};
use crate::types::PixelBuffer;
use std::sync::{Arc, Mutex, MutexGuard};

/// Primitives the engine needs from a host surface.
pub trait Surface: Send {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Current color at (x,y).
    fn get_pixel(&self, x: usize, y: usize) -> Result<u32>;
    /// Write one pixel directly, ignoring the paint color.
    fn set_pixel(&mut self, x: usize, y: usize, color: u32) -> Result<()>;

    fn paint_color(&self) -> u32;
    fn set_paint_color(&mut self, color: u32);

    /// One pixel in the paint color.
    fn draw_point(&mut self, x: i32, y: i32) -> Result<()>;
    /// A circle in the paint color; parts outside the surface are clipped.
    fn draw_circle(&mut self, x: i32, y: i32, radius: f32, filled: bool) -> Result<()>;

    /// Wipe everything back to the surface background.
    fn clear(&mut self);
    /// Ask the host to repaint.
    fn invalidate(&mut self);
}

/// Puts the saved paint color back when dropped, also during unwinding.
struct PaintScope<'a> {
    surface: &'a mut dyn Surface,
    saved: u32,
}

impl Drop for PaintScope<'_> {
    fn drop(&mut self) {
        self.surface.set_paint_color(self.saved);
    }
}

/// Run `f` against the surface and restore its paint color afterwards,
/// whether `f` returns an error or panics.
pub(crate) fn keep_paint<R>(
    surface: &mut dyn Surface,
    f: impl FnOnce(&mut dyn Surface) -> R,
) -> R {
    let saved = surface.paint_color();
    let mut scope = PaintScope { surface, saved };
    f(&mut *scope.surface)
}

struct Canvas {
    frame: PixelBuffer,
    background: u32,
    paint: u32,
    invalidations: u64,
}

impl Canvas {
    #[inline]
    fn put(&mut self, x: i32, y: i32, color: u32) {
        if self.frame.contains(x, y) {
            self.frame.set(x as usize, y as usize, color);
        }
    }
}

/// Shared in-memory surface. Clones point at the same pixels, so a window
/// thread can present the frame while a worker thread fills it.
#[derive(Clone)]
pub struct SoftwareSurface {
    width: usize,
    height: usize,
    canvas: Arc<Mutex<Canvas>>,
}

impl SoftwareSurface {
    /// A surface cleared to `background`; paint color starts as opaque black.
    pub fn new(width: usize, height: usize, background: u32) -> Self {
        Self::from_buffer(PixelBuffer::filled(width, height, background), background)
    }

    /// Start from existing pixels (e.g. a decoded picture).
    pub fn from_buffer(frame: PixelBuffer, background: u32) -> Self {
        let (width, height) = frame.dimensions();
        let canvas = Canvas { frame, background, paint: 0xFF00_0000, invalidations: 0 };
        Self { width, height, canvas: Arc::new(Mutex::new(canvas)) }
    }

    /// Copy of the visible pixels.
    pub fn frame(&self) -> PixelBuffer {
        self.guard().frame.clone()
    }

    /// Run `f` against the visible pixels without copying them.
    pub fn with_frame<R>(&self, f: impl FnOnce(&PixelBuffer) -> R) -> R {
        f(&self.guard().frame)
    }

    /// How many times `invalidate` was called.
    pub fn invalidations(&self) -> u64 {
        self.guard().invalidations
    }

    fn lock(&self) -> Result<MutexGuard<'_, Canvas>> {
        self.canvas
            .lock()
            .map_err(|_| Error::Surface("canvas lock poisoned".into()))
    }

    // Infallible accessors keep working after a panic elsewhere.
    fn guard(&self) -> MutexGuard<'_, Canvas> {
        self.canvas.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Surface for SoftwareSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get_pixel(&self, x: usize, y: usize) -> Result<u32> {
        self.lock()?.frame.get(x, y).ok_or_else(|| {
            Error::Surface(format!("read ({x}, {y}) outside {}x{}", self.width, self.height))
        })
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) -> Result<()> {
        if self.lock()?.frame.set(x, y, color) {
            Ok(())
        } else {
            Err(Error::Surface(format!("write ({x}, {y}) outside {}x{}", self.width, self.height)))
        }
    }

    fn paint_color(&self) -> u32 {
        self.guard().paint
    }

    fn set_paint_color(&mut self, color: u32) {
        self.guard().paint = color;
    }

    fn draw_point(&mut self, x: i32, y: i32) -> Result<()> {
        let mut canvas = self.lock()?;
        let paint = canvas.paint;
        canvas.put(x, y, paint);
        Ok(())
    }

    fn draw_circle(&mut self, cx: i32, cy: i32, radius: f32, filled: bool) -> Result<()> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::Surface(format!("circle radius {radius}")));
        }
        let mut canvas = self.lock()?;
        let paint = canvas.paint;
        let r = radius.ceil() as i32;
        let r2 = radius * radius;
        let (w, h) = canvas.frame.dimensions();
        let max_x = w.min(i32::MAX as usize) as i32 - 1;
        let max_y = h.min(i32::MAX as usize) as i32 - 1;

        // Scan the bounding box, already clipped to the frame.
        for y in cy.saturating_sub(r).max(0)..=cy.saturating_add(r).min(max_y) {
            for x in cx.saturating_sub(r).max(0)..=cx.saturating_add(r).min(max_x) {
                let dx = x as f32 - cx as f32;
                let dy = y as f32 - cy as f32;
                let d2 = dx * dx + dy * dy;
                let inside = if filled {
                    d2 <= r2
                } else {
                    (d2.sqrt() - radius).abs() < 0.5
                };
                if inside {
                    canvas.put(x, y, paint);
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        let mut canvas = self.guard();
        let (w, h) = canvas.frame.dimensions();
        canvas.frame = PixelBuffer::filled(w, h, canvas.background);
    }

    fn invalidate(&mut self) {
        self.guard().invalidations += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: u32 = 0xFFFF_FFFF;
    const RED: u32 = 0xFFFF_0000;

    fn count(frame: &PixelBuffer, color: u32) -> usize {
        frame.pixels().iter().filter(|&&c| c == color).count()
    }

    #[test]
    fn radius_one_filled_circle_is_a_plus() {
        let mut s = SoftwareSurface::new(5, 5, WHITE);
        s.set_paint_color(RED);
        s.draw_circle(2, 2, 1.0, true).unwrap();
        let f = s.frame();
        assert_eq!(count(&f, RED), 5);
        assert_eq!(f.get(1, 1), Some(WHITE));
        assert_eq!(f.get(2, 1), Some(RED));
    }

    #[test]
    fn circles_clip_at_the_edges() {
        let mut s = SoftwareSurface::new(4, 4, WHITE);
        s.set_paint_color(RED);
        s.draw_circle(0, 0, 2.0, true).unwrap();
        // quarter disc of radius 2: (0,0) (1,0) (2,0) (0,1) (1,1) (0,2)
        assert_eq!(count(&s.frame(), RED), 6);
    }

    #[test]
    fn clear_restores_background_and_keeps_paint() {
        let mut s = SoftwareSurface::new(3, 3, WHITE);
        s.set_paint_color(RED);
        s.draw_point(1, 1).unwrap();
        s.clear();
        assert_eq!(count(&s.frame(), WHITE), 9);
        assert_eq!(s.paint_color(), RED);
    }

    #[test]
    fn out_of_range_reads_fail_and_points_clip() {
        let mut s = SoftwareSurface::new(2, 2, WHITE);
        assert!(s.get_pixel(2, 0).is_err());
        assert!(s.set_pixel(0, 5, RED).is_err());
        assert!(s.draw_point(-1, 0).is_ok());
        assert_eq!(count(&s.frame(), WHITE), 4);
    }

    #[test]
    fn clones_share_pixels() {
        let mut a = SoftwareSurface::new(2, 2, WHITE);
        let b = a.clone();
        a.set_pixel(1, 1, RED).unwrap();
        a.invalidate();
        assert_eq!(b.get_pixel(1, 1).unwrap(), RED);
        assert_eq!(b.invalidations(), 1);
    }
}
