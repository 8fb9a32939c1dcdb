// The one owner of the buffer, the history stacks and the bound surface.
// Every operation that touches them is a `&mut self` method here, so whoever
// holds the `Engine` (normally the worker thread) is the only writer.

use crate::bridge;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::fill;
use crate::history::History;
use crate::surface::Surface;
use crate::types::{FillReport, FillRequest, Outcome, PixelBuffer, Snapshot};
use tracing::{debug, info};

pub struct Engine {
    config: EngineConfig,
    surface: Option<Box<dyn Surface>>,
    buffer: Option<PixelBuffer>,
    history: History,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Which stack a history step pops from.
#[derive(Clone, Copy, Debug)]
enum Step {
    Undo,
    Redo,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let history = History::new(config.max_states);
        Self { config, surface: None, buffer: None, history }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The working buffer; `None` before binding and after `clear_memory`.
    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.buffer.as_ref()
    }

    pub fn surface(&self) -> Option<&dyn Surface> {
        self.surface.as_deref()
    }

    /// Surface attached and a buffer to work on.
    pub fn is_bound(&self) -> bool {
        self.surface.is_some() && self.buffer.is_some()
    }

    /// Attach a surface and allocate a fresh buffer of its size.
    /// Snapshots from the previous surface are dropped with it.
    pub fn bind_surface(&mut self, surface: Box<dyn Surface>) -> (usize, usize) {
        let buffer = bridge::rebind(surface.as_ref());
        let dims = buffer.dimensions();
        if self.history.undo_len() + self.history.redo_len() > 0 {
            debug!(
                undo = self.history.undo_len(),
                redo = self.history.redo_len(),
                "rebinding, history dropped"
            );
        }
        self.history.clear();
        self.buffer = Some(buffer);
        self.surface = Some(surface);
        info!(width = dims.0, height = dims.1, "surface bound");
        dims
    }

    /// Pull the surface into the buffer, push a copy onto undo and forget redo.
    /// After `clear_memory` this allocates the buffer again.
    pub fn save_state(&mut self) -> Result<Outcome> {
        let Some(surface) = self.surface.as_deref() else {
            return Ok(ignored("save_state", "no surface bound"));
        };
        let buffer = self.buffer.get_or_insert_with(|| bridge::rebind(surface));
        bridge::sync_from_surface(surface, buffer)?;
        self.history.record(Snapshot::capture(buffer));
        debug!(undo = self.history.undo_len(), "state saved");
        Ok(Outcome::Done(()))
    }

    /// Fill a region. The pre-fill state goes onto undo unless the seed
    /// already has the requested color, in which case nothing is recorded.
    pub fn fill(&mut self, request: &FillRequest) -> Result<Outcome<FillReport>> {
        let (Some(surface), Some(buffer)) = (self.surface.as_deref_mut(), self.buffer.as_mut())
        else {
            return Ok(ignored("fill", "no surface or buffer bound"));
        };

        // 1) Reject bad seeds/params before the expensive surface read.
        fill::seed_color(buffer, request)?;

        // 2) Bring the buffer up to date with what is on screen.
        bridge::sync_from_surface(surface, buffer)?;

        // 3) Nothing to do: keep history clean.
        if fill::seed_color(buffer, request)? == request.color {
            debug!(x = request.x, y = request.y, "fill skipped, seed already has the color");
            return fill::fill(buffer, surface, request).map(Outcome::Done);
        }

        // 4) Snapshot, then mutate.
        self.history.record(Snapshot::capture(buffer));
        fill::fill(buffer, surface, request).map(Outcome::Done)
    }

    pub fn undo(&mut self) -> Result<Outcome> {
        self.step(Step::Undo)
    }

    pub fn redo(&mut self) -> Result<Outcome> {
        self.step(Step::Redo)
    }

    fn step(&mut self, step: Step) -> Result<Outcome> {
        let op = match step {
            Step::Undo => "undo",
            Step::Redo => "redo",
        };
        let (Some(surface), Some(buffer)) = (self.surface.as_deref_mut(), self.buffer.as_mut())
        else {
            return Ok(ignored(op, "no surface or buffer bound"));
        };

        let next = match step {
            Step::Undo => self.history.peek_undo(),
            Step::Redo => self.history.peek_redo(),
        };
        let Some(next) = next else {
            return Ok(ignored(op, "history empty"));
        };

        // The host may have resized its surface since the snapshot was taken.
        // Nothing is cleared or popped unless all three sizes agree.
        let live = (surface.width(), surface.height());
        for actual in [live, next.dimensions()] {
            if actual != buffer.dimensions() {
                return Err(Error::DimensionMismatch { expected: buffer.dimensions(), actual });
            }
        }

        let popped = match step {
            Step::Undo => self.history.pop_undo(),
            Step::Redo => self.history.pop_redo(),
        };
        let Some(snapshot) = popped else {
            return Ok(ignored(op, "history empty"));
        };

        surface.clear();
        let current = Snapshot::from(std::mem::replace(buffer, snapshot.into_buffer()));
        match step {
            Step::Undo => self.history.push_redo(current),
            Step::Redo => self.history.push_undo(current),
        };
        bridge::sync_to_surface(buffer, surface)?;

        debug!(
            op,
            undo = self.history.undo_len(),
            redo = self.history.redo_len(),
            "history step"
        );
        Ok(Outcome::Done(()))
    }

    /// Drop both stacks and the buffer and wipe the surface. The surface stays
    /// attached; fills are ignored until `save_state` or a rebind.
    pub fn clear_memory(&mut self) -> Outcome {
        let freed = self.history.memory_bytes()
            + self.buffer.as_ref().map_or(0, PixelBuffer::byte_size);
        self.history.clear();
        self.buffer = None;
        if let Some(surface) = self.surface.as_deref_mut() {
            surface.clear();
            surface.invalidate();
        }
        info!(freed_bytes = freed, "memory cleared");
        Outcome::Done(())
    }
}

fn ignored<T>(op: &'static str, reason: &'static str) -> Outcome<T> {
    debug!(op, reason, "operation ignored");
    Outcome::Ignored(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SoftwareSurface;
    use std::sync::{Arc, Mutex};

    const WHITE: u32 = 0xFFFF_FFFF;
    const BLACK: u32 = 0xFF00_0000;
    const RED: u32 = 0xFFFF_0000;

    /// A host view whose page the test can swap for one of another size.
    struct Resizable(Arc<Mutex<SoftwareSurface>>);

    impl Surface for Resizable {
        fn width(&self) -> usize {
            self.0.lock().unwrap().width()
        }

        fn height(&self) -> usize {
            self.0.lock().unwrap().height()
        }

        fn get_pixel(&self, x: usize, y: usize) -> Result<u32> {
            self.0.lock().unwrap().get_pixel(x, y)
        }

        fn set_pixel(&mut self, x: usize, y: usize, color: u32) -> Result<()> {
            self.0.lock().unwrap().set_pixel(x, y, color)
        }

        fn paint_color(&self) -> u32 {
            self.0.lock().unwrap().paint_color()
        }

        fn set_paint_color(&mut self, color: u32) {
            self.0.lock().unwrap().set_paint_color(color)
        }

        fn draw_point(&mut self, x: i32, y: i32) -> Result<()> {
            self.0.lock().unwrap().draw_point(x, y)
        }

        fn draw_circle(&mut self, x: i32, y: i32, radius: f32, filled: bool) -> Result<()> {
            self.0.lock().unwrap().draw_circle(x, y, radius, filled)
        }

        fn clear(&mut self) {
            self.0.lock().unwrap().clear()
        }

        fn invalidate(&mut self) {
            self.0.lock().unwrap().invalidate()
        }
    }

    fn bound(w: usize, h: usize) -> (Engine, SoftwareSurface) {
        let surface = SoftwareSurface::new(w, h, WHITE);
        let mut engine = Engine::default();
        engine.bind_surface(Box::new(surface.clone()));
        (engine, surface)
    }

    #[test]
    fn unbound_operations_are_ignored() {
        let mut engine = Engine::default();
        assert!(engine.fill(&FillRequest::plain(0, 0, BLACK)).unwrap().is_ignored());
        assert!(engine.undo().unwrap().is_ignored());
        assert!(engine.redo().unwrap().is_ignored());
        assert!(engine.save_state().unwrap().is_ignored());
        assert!(!engine.is_bound());
    }

    #[test]
    fn four_by_four_fill_and_undo() {
        let (mut engine, surface) = bound(4, 4);
        let report = engine.fill(&FillRequest::plain(0, 0, BLACK)).unwrap().done().unwrap();
        assert_eq!(report.painted, 16);
        assert!(engine.buffer().unwrap().pixels().iter().all(|&c| c == BLACK));
        assert_eq!(engine.history().undo_len(), 1);

        assert_eq!(engine.undo().unwrap(), Outcome::Done(()));
        assert!(engine.buffer().unwrap().pixels().iter().all(|&c| c == WHITE));
        assert!(surface.frame().pixels().iter().all(|&c| c == WHITE));
        assert_eq!(engine.history().redo_len(), 1);
    }

    #[test]
    fn same_color_fill_records_nothing() {
        let (mut engine, _surface) = bound(3, 3);
        let report = engine.fill(&FillRequest::plain(1, 1, WHITE)).unwrap().done().unwrap();
        assert!(!report.changed);
        assert_eq!(engine.history().undo_len(), 0);
    }

    #[test]
    fn bad_seed_is_an_error_and_records_nothing() {
        let (mut engine, _surface) = bound(3, 3);
        assert!(matches!(
            engine.fill(&FillRequest::plain(3, 3, BLACK)),
            Err(Error::OutOfBounds { .. })
        ));
        assert_eq!(engine.history().undo_len(), 0);
    }

    #[test]
    fn fill_reads_what_is_on_the_surface() {
        let (mut engine, mut surface) = bound(3, 1);
        // drawn by the host behind the engine's back
        surface.set_pixel(1, 0, BLACK).unwrap();
        let report = engine.fill(&FillRequest::plain(0, 0, 0xFF00_FF00)).unwrap().done().unwrap();
        assert_eq!(report.painted, 1);
        assert_eq!(engine.buffer().unwrap().get(2, 0), Some(WHITE));
    }

    #[test]
    fn clear_memory_unbinds_until_saved_again() {
        let (mut engine, surface) = bound(2, 2);
        engine.fill(&FillRequest::plain(0, 0, BLACK)).unwrap();
        assert_eq!(engine.clear_memory(), Outcome::Done(()));
        assert_eq!(engine.history().undo_len() + engine.history().redo_len(), 0);
        assert!(engine.buffer().is_none());
        assert!(surface.frame().pixels().iter().all(|&c| c == WHITE));
        assert!(engine.fill(&FillRequest::plain(0, 0, BLACK)).unwrap().is_ignored());

        engine.save_state().unwrap();
        assert!(engine.is_bound());
        assert_eq!(engine.history().undo_len(), 1);
        assert!(!engine.fill(&FillRequest::plain(0, 0, BLACK)).unwrap().is_ignored());
    }

    #[test]
    fn rebinding_drops_history() {
        let (mut engine, _surface) = bound(2, 2);
        engine.fill(&FillRequest::plain(0, 0, BLACK)).unwrap();
        let dims = engine.bind_surface(Box::new(SoftwareSurface::new(5, 3, WHITE)));
        assert_eq!(dims, (5, 3));
        assert_eq!(engine.surface().map(|s| (s.width(), s.height())), Some((5, 3)));
        assert!(!engine.history().can_undo());
        assert!(engine.undo().unwrap().is_ignored());
    }

    #[test]
    fn history_step_onto_a_resized_surface_leaves_page_and_stacks_alone() {
        let page = Arc::new(Mutex::new(SoftwareSurface::new(2, 2, WHITE)));
        let mut engine = Engine::default();
        engine.bind_surface(Box::new(Resizable(Arc::clone(&page))));
        engine.fill(&FillRequest::plain(0, 0, BLACK)).unwrap();
        engine.undo().unwrap();

        // the host swaps in a bigger page and draws on it
        let bigger = SoftwareSurface::new(3, 3, WHITE);
        *page.lock().unwrap() = bigger.clone();
        page.lock().unwrap().set_pixel(1, 1, RED).unwrap();

        for result in [engine.redo(), engine.redo()] {
            assert_eq!(
                result,
                Err(Error::DimensionMismatch { expected: (2, 2), actual: (3, 3) })
            );
        }
        assert_eq!((engine.history().undo_len(), engine.history().redo_len()), (0, 1));
        assert_eq!(bigger.get_pixel(1, 1).unwrap(), RED);
        assert_eq!(bigger.invalidations(), 0);
        assert_eq!(engine.buffer().map(PixelBuffer::dimensions), Some((2, 2)));
    }
}
