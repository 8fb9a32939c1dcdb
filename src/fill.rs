// Region fill over the engine buffer.
//
// All four modes share one breadth-first walk: pop a cell, check it is still
// the seed's original color, paint it, push the four neighbors `step` cells
// away. Plain mode also keeps a visited grid. The other modes rely on the
// color check alone: a painted cell no longer matches the original color, so
// it can never be admitted twice, and no w*h grid has to be allocated.
//
// Draw calls go to the surface as each cell is painted, so a window that
// repaints mid-fill shows the region growing.

use crate::error::{Error, Result};
use crate::surface::{Surface, keep_paint};
use crate::types::{FillMode, FillReport, FillRequest, PixelBuffer};
use std::collections::VecDeque;
use tracing::debug;

/// Validate the request against the buffer and return the seed's current color.
pub fn seed_color(buffer: &PixelBuffer, request: &FillRequest) -> Result<u32> {
    request.mode.validate()?;
    if !buffer.contains(request.x, request.y) {
        return Err(Error::OutOfBounds {
            x: request.x,
            y: request.y,
            width: buffer.width(),
            height: buffer.height(),
        });
    }
    // contains() guarantees the lookup hits
    buffer
        .get(request.x as usize, request.y as usize)
        .ok_or(Error::Unbound("seed lookup"))
}

/// Run one fill. The buffer is mutated in place and the surface drawn as we go.
/// A seed that already has the requested color leaves everything untouched.
/// On a surface error the fill stops where it is; nothing is rolled back.
pub fn fill(
    buffer: &mut PixelBuffer,
    surface: &mut dyn Surface,
    request: &FillRequest,
) -> Result<FillReport> {
    let original = seed_color(buffer, request)?;
    let mut report = FillReport { mode: request.mode, original, painted: 0, changed: false };
    if original == request.color {
        debug!(color = original, "seed already has the fill color");
        return Ok(report);
    }

    let seed = (request.x, request.y);
    let color = request.color;
    debug!(x = seed.0, y = seed.1, mode = request.mode.name(), "fill start");

    report.painted = match request.mode {
        FillMode::Plain => with_paint(surface, color, |surface| {
            let mut visited = vec![false; buffer.width() * buffer.height()];
            walk(buffer, seed, original, 1, Some(&mut visited), |buffer, x, y| {
                buffer.set(x as usize, y as usize, color);
                surface.draw_circle(x, y, 1.0, true)?;
                Ok(1)
            })
        })?,

        FillMode::Density { .. } => {
            walk(buffer, seed, original, request.mode.step(), None, |buffer, x, y| {
                buffer.set(x as usize, y as usize, color);
                surface.set_pixel(x as usize, y as usize, color)?;
                Ok(1)
            })?
        }

        FillMode::Circle { radius } => with_paint(surface, color, |surface| {
            walk(buffer, seed, original, 1, None, |buffer, x, y| {
                buffer.set(x as usize, y as usize, color);
                surface.draw_circle(x, y, radius, true)?;
                Ok(1)
            })
        })?,

        FillMode::SquareBrush { point_size, .. } => {
            let step = request.mode.step();
            walk(buffer, seed, original, step, None, |buffer, x, y| {
                paint_square(buffer, &mut *surface, x, y, point_size, color)
            })?
        }
    };
    report.changed = true;

    surface.invalidate();
    debug!(painted = report.painted, mode = request.mode.name(), "fill done");
    Ok(report)
}

/// Set the surface paint color for the duration of `f`, then put the old one back.
fn with_paint<R>(
    surface: &mut dyn Surface,
    color: u32,
    f: impl FnOnce(&mut dyn Surface) -> Result<R>,
) -> Result<R> {
    keep_paint(surface, |surface| {
        surface.set_paint_color(color);
        f(surface)
    })
}

/// Breadth-first walk from `seed`. `paint` is called once per admitted cell and
/// returns how many buffer cells it wrote.
fn walk(
    buffer: &mut PixelBuffer,
    seed: (i32, i32),
    original: u32,
    step: i32,
    mut visited: Option<&mut Vec<bool>>,
    mut paint: impl FnMut(&mut PixelBuffer, i32, i32) -> Result<usize>,
) -> Result<usize> {
    let width = buffer.width();
    let mut painted = 0;
    let mut queue = VecDeque::new();
    queue.push_back(seed);

    while let Some((x, y)) = queue.pop_front() {
        // 1) Admission: still the original color (and not seen, in plain mode).
        let idx = y as usize * width + x as usize;
        if let Some(seen) = visited.as_deref() {
            if seen[idx] {
                continue;
            }
        }
        if buffer.get(x as usize, y as usize) != Some(original) {
            continue;
        }

        // 2) Paint.
        painted += paint(buffer, x, y)?;
        if let Some(seen) = visited.as_deref_mut() {
            seen[idx] = true;
        }

        // 3) Neighbors `step` away; anything off the buffer is dropped here.
        for (dx, dy) in [(-step, 0), (step, 0), (0, -step), (0, step)] {
            let (Some(nx), Some(ny)) = (x.checked_add(dx), y.checked_add(dy)) else {
                continue;
            };
            if buffer.contains(nx, ny) {
                queue.push_back((nx, ny));
            }
        }
    }
    Ok(painted)
}

/// Fill the square [x-half, x+half] x [y-half, y+half], clipped to the buffer,
/// into both the buffer and the surface. Cells of any color are overwritten.
fn paint_square(
    buffer: &mut PixelBuffer,
    surface: &mut dyn Surface,
    x: i32,
    y: i32,
    half: u32,
    color: u32,
) -> Result<usize> {
    let half = half.min(i32::MAX as u32) as i64;
    let (w, h) = (buffer.width() as i64, buffer.height() as i64);
    let (x, y) = (x as i64, y as i64);

    let (x0, x1) = ((x - half).max(0), (x + half).min(w - 1));
    let (y0, y1) = ((y - half).max(0), (y + half).min(h - 1));

    let mut written = 0;
    for sy in y0..=y1 {
        for sx in x0..=x1 {
            let (sx, sy) = (sx as usize, sy as usize);
            buffer.set(sx, sy, color);
            surface.set_pixel(sx, sy, color)?;
            written += 1;
        }
    }
    Ok(written)
}
