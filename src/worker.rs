// Background owner of the engine.
//
// The host fires commands and never waits on them; results come back as
// events. One thread runs every command in submission order, so two fills
// issued back to back can never touch the buffer, the stacks or the surface
// at the same time.

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::surface::Surface;
use crate::types::{FillReport, FillRequest, Outcome};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Notifications sent back to the host.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    SurfaceBound { width: usize, height: usize },
    FillCompleted(FillReport),
    FillFailed(String),
    StateSaved,
    Undone,
    Redone,
    MemoryCleared,
    /// Generic error report; also carries skipped operations when diagnostics are on.
    Error(String),
}

type Query = Box<dyn FnOnce(&Engine) + Send>;

enum Command {
    Bind(Box<dyn Surface>),
    Fill(FillRequest),
    Undo,
    Redo,
    SaveState,
    ClearMemory,
    Query(Query),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Bind(_) => "BindSurface",
            Command::Fill(_) => "Fill",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::SaveState => "SaveState",
            Command::ClearMemory => "ClearMemory",
            Command::Query(_) => "Query",
        }
    }
}

/// Undo/redo depth as of the last finished command; readable without a round trip.
#[derive(Default)]
struct Depth {
    undo: AtomicUsize,
    redo: AtomicUsize,
}

/// Handle to the engine thread. Dropping it stops the thread after the
/// commands already queued have run.
pub struct EngineHandle {
    commands: Option<Sender<Command>>,
    events: Receiver<Event>,
    depth: Arc<Depth>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn spawn(config: EngineConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let depth = Arc::new(Depth::default());

        let engine = Engine::new(config);
        let thread_depth = Arc::clone(&depth);
        let thread = thread::spawn(move || run(engine, command_rx, event_tx, thread_depth));

        Self { commands: Some(command_tx), events: event_rx, depth, thread: Some(thread) }
    }

    pub fn bind_surface(&self, surface: impl Surface + 'static) -> Result<()> {
        self.send(Command::Bind(Box::new(surface)))
    }

    pub fn fill(&self, request: FillRequest) -> Result<()> {
        self.send(Command::Fill(request))
    }

    pub fn undo(&self) -> Result<()> {
        self.send(Command::Undo)
    }

    pub fn redo(&self) -> Result<()> {
        self.send(Command::Redo)
    }

    pub fn save_state(&self) -> Result<()> {
        self.send(Command::SaveState)
    }

    pub fn clear_memory(&self) -> Result<()> {
        self.send(Command::ClearMemory)
    }

    /// Run `f` on the engine thread after everything queued so far, and wait
    /// for its answer.
    pub fn query<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&Engine) -> R + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        self.send(Command::Query(Box::new(move |engine: &Engine| {
            let _ = tx.send(f(engine));
        })))?;
        rx.recv().map_err(|_| Error::WorkerStopped)
    }

    /// (undo, redo) depth after the last finished command.
    pub fn history_depth(&self) -> (usize, usize) {
        (self.depth.undo.load(Ordering::Acquire), self.depth.redo.load(Ordering::Acquire))
    }

    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    pub fn try_event(&self) -> Option<Event> {
        self.events.try_recv().ok()
    }

    pub fn next_event(&self, timeout: Duration) -> Option<Event> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stop accepting commands, let the queue drain, join the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn send(&self, command: Command) -> Result<()> {
        let name = command.name();
        let sender = self.commands.as_ref().ok_or(Error::WorkerStopped)?;
        sender.send(command).map_err(|_| {
            warn!(command = name, "engine thread is gone");
            Error::WorkerStopped
        })
    }

    fn stop(&mut self) {
        // closing the channel ends the loop in `run`
        self.commands.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("engine thread panicked outside a command");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(mut engine: Engine, commands: Receiver<Command>, events: Sender<Event>, depth: Arc<Depth>) {
    debug!("engine thread started");
    while let Ok(command) = commands.recv() {
        let name = command.name();
        let result = panic::catch_unwind(AssertUnwindSafe(|| execute(&mut engine, command)));
        let event = match result {
            Ok(event) => event,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                error!(command = name, %msg, "command panicked");
                Some(Event::Error(format!("{name} - Error: {msg}")))
            }
        };

        depth.undo.store(engine.history().undo_len(), Ordering::Release);
        depth.redo.store(engine.history().redo_len(), Ordering::Release);

        if let Some(event) = event {
            // Nobody listening is fine; keep serving commands.
            let _ = events.send(event);
        }
    }
    debug!("engine thread stopped");
}

fn execute(engine: &mut Engine, command: Command) -> Option<Event> {
    let diagnostics = engine.config().diagnostics;
    match command {
        Command::Bind(surface) => {
            let (width, height) = engine.bind_surface(surface);
            Some(Event::SurfaceBound { width, height })
        }
        Command::Fill(request) => match engine.fill(&request) {
            Ok(Outcome::Done(report)) => Some(Event::FillCompleted(report)),
            Ok(Outcome::Ignored(reason)) => ignored("Fill", reason, diagnostics),
            Err(e) => {
                warn!(error = %e, "fill failed");
                Some(Event::FillFailed(format!("Fill - Error: {e}")))
            }
        },
        Command::Undo => finish("Undo", engine.undo(), Event::Undone, diagnostics),
        Command::Redo => finish("Redo", engine.redo(), Event::Redone, diagnostics),
        Command::SaveState => {
            finish("SaveState", engine.save_state(), Event::StateSaved, diagnostics)
        }
        Command::ClearMemory => {
            engine.clear_memory();
            Some(Event::MemoryCleared)
        }
        Command::Query(f) => {
            f(&*engine);
            None
        }
    }
}

fn finish(op: &str, result: Result<Outcome>, done: Event, diagnostics: bool) -> Option<Event> {
    match result {
        Ok(Outcome::Done(())) => Some(done),
        Ok(Outcome::Ignored(reason)) => ignored(op, reason, diagnostics),
        Err(e) => {
            warn!(op, error = %e, "operation failed");
            Some(Event::Error(format!("{op} - Error: {e}")))
        }
    }
}

fn ignored(op: &str, reason: &str, diagnostics: bool) -> Option<Event> {
    debug!(op, reason, "operation ignored");
    diagnostics.then(|| Event::Error(format!("{op} ignored: {reason}")))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
