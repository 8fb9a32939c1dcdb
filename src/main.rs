// What you SEE:
// • A white page (or the picture passed with --open).
// • Left click: flood fill at the cursor with the current mode and color.
// • 1 plain, 2 density, 3 circle, 4 square brush. C cycles the color.
// • U undo, R redo, S save state, M clear memory. ESC quits.
// The HUD shows the mode and how deep the undo/redo stacks are.

mod draw;
mod picture;

use clap::Parser;
use draw::{draw_crosshair, draw_swatch, draw_text, Drawer};
use flood_canvas::{
    EngineConfig, EngineHandle, Error, Event, FillMode, FillRequest, SoftwareSurface,
};
use minifb::Key;
use std::path::PathBuf;
use tracing::{info, warn};

const PAGE: u32 = 0xFFFF_FFFF;
const PALETTE: [u32; 6] =
    [0xFF00_0000, 0xFFE5_3935, 0xFF1E_88E5, 0xFF43_A047, 0xFFFD_D835, 0xFFFF_FFFF];

#[derive(Parser, Debug)]
#[command(name = "flood-canvas", about = "Flood fill playground with undo/redo")]
struct Args {
    /// Page width when no picture is opened
    #[arg(long, default_value_t = 640)]
    width: usize,
    /// Page height when no picture is opened
    #[arg(long, default_value_t = 480)]
    height: usize,
    /// Start from this picture instead of a blank page
    #[arg(long)]
    open: Option<PathBuf>,
    /// Engine config (TOML: max_states, diagnostics)
    #[arg(long)]
    config: Option<PathBuf>,
    /// First fill color, RRGGBB or AARRGGBB (a leading # is fine)
    #[arg(long, value_parser = parse_color)]
    color: Option<u32>,
    /// Step for density and square-brush fills
    #[arg(long, default_value_t = 4)]
    density: u32,
    /// Stamp radius for circle fills
    #[arg(long, default_value_t = 3.0)]
    radius: f32,
    /// Square half-size for square-brush fills
    #[arg(long, default_value_t = 1)]
    point_size: u32,
}

fn parse_color(s: &str) -> Result<u32, String> {
    let hex = s.trim_start_matches('#');
    let value = u32::from_str_radix(hex, 16).map_err(|e| format!("{s}: {e}"))?;
    match hex.len() {
        6 => Ok(0xFF00_0000 | value),
        8 => Ok(value),
        _ => Err(format!("{s}: expected RRGGBB or AARRGGBB")),
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
    let args = Args::parse();

    /* --- Config + surface ---
       The surface is shared: the engine thread draws into it, we present it. */
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let surface = match &args.open {
        Some(path) => SoftwareSurface::from_buffer(picture::load(path)?, PAGE),
        None => SoftwareSurface::new(args.width, args.height, PAGE),
    };
    let (w, h) = surface.with_frame(|f| f.dimensions());

    /* --- Engine thread ---
       Every fill/undo/redo runs there, one at a time, in click order. */
    let engine = EngineHandle::spawn(config);
    engine.bind_surface(surface.clone())?;
    let mut drawer = Drawer::new("Flood Canvas", w, h)?;

    let modes = [
        FillMode::Plain,
        FillMode::Density { density: args.density },
        FillMode::Circle { radius: args.radius },
        FillMode::SquareBrush { point_size: args.point_size, density: args.density },
    ];
    let mut mode = modes[0];
    let mut color_idx = 0;
    let mut color = args.color.unwrap_or(PALETTE[0]);

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        /* 1) Inputs → commands (never blocks; results come back as events) */
        for (key, m) in [Key::Key1, Key::Key2, Key::Key3, Key::Key4].into_iter().zip(modes) {
            if drawer.pressed_once(key) {
                mode = m;
                info!(mode = mode.name(), "mode selected");
            }
        }
        if drawer.pressed_once(Key::C) {
            color_idx = (color_idx + 1) % PALETTE.len();
            color = PALETTE[color_idx];
        }
        if drawer.pressed_once(Key::U) {
            engine.undo()?;
        }
        if drawer.pressed_once(Key::R) {
            engine.redo()?;
        }
        if drawer.pressed_once(Key::S) {
            engine.save_state()?;
        }
        if drawer.pressed_once(Key::M) {
            engine.clear_memory()?;
        }

        let mouse = drawer.mouse_pos();
        if drawer.left_clicked() {
            if let Some((x, y)) = mouse {
                engine.fill(FillRequest { x, y, color, mode })?;
            }
        }

        /* 2) Events from the engine thread */
        while let Some(event) = engine.try_event() {
            match event {
                Event::FillCompleted(report) => {
                    info!(painted = report.painted, changed = report.changed, "fill completed")
                }
                Event::FillFailed(msg) | Event::Error(msg) => warn!("{msg}"),
                other => info!(?other, "engine event"),
            }
        }

        /* 3) Frame = surface (possibly mid-fill) + overlay */
        let mut screen = surface.frame();
        if let Some((mx, my)) = mouse {
            draw_crosshair(&mut screen, mx, my, 10, 0xFF80_8080);
        }
        let (undo, redo) = engine.history_depth();
        let hud = format!("{} | UNDO {} REDO {}", mode.name(), undo, redo);
        draw_swatch(&mut screen, 8, 6, 11, color);
        draw_text(&mut screen, 24, 8, &hud, 0xFFFF_FFFF);

        /* 4) Present */
        drawer.present(&screen)?;
    }

    // Dropping the handle lets queued commands finish and joins the thread.
    engine.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_color;

    #[test]
    fn colors_parse_with_or_without_alpha() {
        assert_eq!(parse_color("#FF0000"), Ok(0xFFFF_0000));
        assert_eq!(parse_color("80112233"), Ok(0x8011_2233));
        assert!(parse_color("123").is_err());
        assert!(parse_color("zzzzzz").is_err());
    }
}
