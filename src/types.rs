// Core types shared by the fill engine, the history and the surface bridge.

use crate::error::{Error, Result};

/// Pack 8-bit channels into one 0xAARRGGBB color.
#[inline]
pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// The engine's private raster: `width * height` packed ARGB colors, row-major.
/// Dimensions never change after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>, // length = width * height, each entry 0xAARRGGBB
}

impl PixelBuffer {
    /// All-zero (transparent black) buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    /// Wrap existing pixels; the length has to match the dimensions.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(Error::invalid(
                "pixels",
                format!("{} values for a {width}x{height} buffer", pixels.len()),
            ));
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// True if (x,y) is a cell of this buffer. Takes signed coordinates so that
    /// neighbor arithmetic can step off the left/top edge without wrapping.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Write one cell. Returns false (and writes nothing) when out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.pixels[y * self.width + x] = color;
        true
    }

    /// Heap bytes held by the pixel storage.
    pub fn byte_size(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<u32>()
    }
}

/// A frozen copy of a `PixelBuffer`, as kept on the undo/redo stacks.
/// There is no way to mutate it; the only way back to a buffer is to consume it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot(PixelBuffer);

impl Snapshot {
    /// Deep-copy the buffer.
    pub fn capture(buffer: &PixelBuffer) -> Self {
        Self(buffer.clone())
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.0
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.0.dimensions()
    }

    pub fn byte_size(&self) -> usize {
        self.0.byte_size()
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.0
    }
}

/// Freeze a buffer nobody else holds; no copy needed.
impl From<PixelBuffer> for Snapshot {
    fn from(buffer: PixelBuffer) -> Self {
        Self(buffer)
    }
}

/// How a fill walks the region and what it paints per cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FillMode {
    /// Every 4-connected cell, one radius-1 dot per cell.
    Plain,
    /// Step `density` cells at a time; leaves a lattice of dots when > 1.
    Density { density: u32 },
    /// Step 1, but stamp a filled circle of `radius` on the surface per cell.
    Circle { radius: f32 },
    /// Paint a (2*point_size+1)^2 square per cell, stepping `density` cells.
    SquareBrush { point_size: u32, density: u32 },
}

impl FillMode {
    /// Reject parameters that would loop forever or draw nonsense.
    pub fn validate(&self) -> Result<()> {
        match *self {
            FillMode::Plain => Ok(()),
            FillMode::Density { density } | FillMode::SquareBrush { density, .. } => {
                if density == 0 {
                    return Err(Error::invalid("density", density));
                }
                Ok(())
            }
            FillMode::Circle { radius } => {
                if !radius.is_finite() || radius < 0.0 {
                    return Err(Error::invalid("radius", radius));
                }
                Ok(())
            }
        }
    }

    /// Queue step between neighbors.
    pub fn step(&self) -> i32 {
        match *self {
            FillMode::Plain | FillMode::Circle { .. } => 1,
            FillMode::Density { density } | FillMode::SquareBrush { density, .. } => {
                density.min(i32::MAX as u32) as i32
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FillMode::Plain => "PLAIN",
            FillMode::Density { .. } => "DENSITY",
            FillMode::Circle { .. } => "CIRCLE",
            FillMode::SquareBrush { .. } => "BRUSH",
        }
    }
}

/// One fill to run. Coordinates are signed so bad seeds can be reported as such.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillRequest {
    pub x: i32,
    pub y: i32,
    pub color: u32,
    pub mode: FillMode,
}

impl FillRequest {
    pub fn plain(x: i32, y: i32, color: u32) -> Self {
        Self { x, y, color, mode: FillMode::Plain }
    }

    pub fn density(x: i32, y: i32, color: u32, density: u32) -> Self {
        Self { x, y, color, mode: FillMode::Density { density } }
    }

    pub fn circle(x: i32, y: i32, color: u32, radius: f32) -> Self {
        Self { x, y, color, mode: FillMode::Circle { radius } }
    }

    pub fn square_brush(x: i32, y: i32, color: u32, point_size: u32, density: u32) -> Self {
        Self { x, y, color, mode: FillMode::SquareBrush { point_size, density } }
    }
}

/// What a fill did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillReport {
    pub mode: FillMode,
    /// Color of the seed before the fill (the color the region was matched on).
    pub original: u32,
    /// Buffer cells written, counting overlapping brush squares once per write.
    pub painted: usize,
    /// False when the seed already had the requested color.
    pub changed: bool,
}

/// Result of a public engine operation that may be skipped on an unbound engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T = ()> {
    Done(T),
    Ignored(&'static str),
}

impl<T> Outcome<T> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(v) => Some(v),
            Outcome::Ignored(_) => None,
        }
    }
}
