// Window + software overlay for the demo host.
// 1) A window that shows the drawing surface.
// 2) Edge-triggered mouse/key input so one click is one fill.
// 3) A crosshair and a tiny 5x7 bitmap font for the HUD, drawn on a copy of
//    the frame so they never end up in the engine's buffer.

use flood_canvas::{Error, PixelBuffer};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,
    mouse_was_down: bool,
}

impl Drawer {
    /// Create a window sized to the surface.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::Window(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window, mouse_was_down: false })
    }

    /// Push this frame's pixels to the screen. minifb ignores the alpha byte.
    pub fn present(&mut self, frame: &PixelBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(frame.pixels(), frame.width(), frame.height())
            .map_err(|e| Error::Window(e.to_string()))
    }

    /// Returns false when the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Mouse position in window pixels (clamped to the window).
    pub fn mouse_pos(&self) -> Option<(i32, i32)> {
        self.window
            .get_mouse_pos(MouseMode::Clamp)
            .map(|(x, y)| (x.max(0.0) as i32, y.max(0.0) as i32))
    }

    /// True once per left-button press, on the frame the button goes down.
    pub fn left_clicked(&mut self) -> bool {
        let down = self.window.get_mouse_down(MouseButton::Left);
        let clicked = down && !self.mouse_was_down;
        self.mouse_was_down = down;
        clicked
    }

    pub fn pressed_once(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }
}

/* ---------- Overlay: crosshair, color swatch, HUD text ---------- */

#[inline]
fn put_pixel(fb: &mut PixelBuffer, x: i32, y: i32, color: u32) {
    if fb.contains(x, y) {
        fb.set(x as usize, y as usize, color);
    }
}

/// Four arms around (cx,cy) with a 2px hole, so the seed pixel stays visible.
pub fn draw_crosshair(fb: &mut PixelBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    for d in 2..=size {
        put_pixel(fb, cx - d, cy, color);
        put_pixel(fb, cx + d, cy, color);
        put_pixel(fb, cx, cy - d, color);
        put_pixel(fb, cx, cy + d, color);
    }
}

/// Solid square with a 1px black border; shows the current fill color.
pub fn draw_swatch(fb: &mut PixelBuffer, x: i32, y: i32, size: i32, color: u32) {
    for sy in y..y + size {
        for sx in x..x + size {
            let edge = sx == x || sy == y || sx == x + size - 1 || sy == y + size - 1;
            put_pixel(fb, sx, sy, if edge { 0xFF00_0000 } else { color });
        }
    }
}

/// 5x7 glyphs for what the HUD prints: digits, mode names, UNDO/REDO.
/// Seven rows top to bottom, bit 4 is the leftmost column.
const FONT: &[(char, [u8; 7])] = &[
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1E, 0x01, 0x01, 0x0E, 0x01, 0x01, 0x1E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    ('A', [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('B', [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E]),
    ('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    ('D', [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C]),
    ('E', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F]),
    ('H', [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('I', [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    ('N', [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11]),
    ('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    ('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('Y', [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04]),
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('|', [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    (':', [0x00, 0x04, 0x00, 0x00, 0x04, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00]),
];

fn glyph(ch: char) -> Option<&'static [u8; 7]> {
    FONT.iter().find(|(c, _)| *c == ch).map(|(_, rows)| rows)
}

/// Shadow pass at +1,+1 in black, then the glyph itself.
fn draw_glyph(fb: &mut PixelBuffer, x: i32, y: i32, rows: &[u8; 7], color: u32) {
    for (shade, offset) in [(0xFF00_0000, 1), (color, 0)] {
        for (row, bits) in (0i32..).zip(rows) {
            for col in 0..5 {
                if (*bits >> (4 - col)) & 1 == 1 {
                    put_pixel(fb, x + col + offset, y + row + offset, shade);
                }
            }
        }
    }
}

/// Left-aligned HUD text, 6px advance. Lowercase is shown as uppercase and
/// characters without a glyph leave a blank cell.
pub fn draw_text(fb: &mut PixelBuffer, x: i32, y: i32, text: &str, color: u32) {
    for (i, ch) in (0i32..).zip(text.chars()) {
        if let Some(rows) = glyph(ch.to_ascii_uppercase()) {
            draw_glyph(fb, x + i * 6, y, rows, color);
        }
    }
}
