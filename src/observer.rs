//! Trace hooks for the engine.
//!
//! The engine buffers every [`RuntimeEvent`] for the next snapshot and also
//! hands it, as it happens, to an optional observer. Any
//! `FnMut(u64, &RuntimeEvent)` closure is an observer.

use crate::types::RuntimeEvent;

pub trait EngineObserver {
    /// Called synchronously at each trace point with the tick it occurred on.
    fn on_event(&mut self, tick: u64, event: &RuntimeEvent);
}

impl<F> EngineObserver for F
where
    F: FnMut(u64, &RuntimeEvent),
{
    fn on_event(&mut self, tick: u64, event: &RuntimeEvent) {
        self(tick, event)
    }
}

/// Observer that writes one JSON object per event.
pub struct JsonLinesObserver<W: std::io::Write> {
    writer: W,
    failed: bool,
}

impl<W: std::io::Write> JsonLinesObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    /// `true` once a write has failed; later events are dropped.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: std::io::Write> EngineObserver for JsonLinesObserver<W> {
    fn on_event(&mut self, tick: u64, event: &RuntimeEvent) {
        if self.failed {
            return;
        }
        let line = serde_json::json!({ "tick": tick, "event": event });
        if writeln!(self.writer, "{line}").is_err() {
            self.failed = true;
        }
    }
}
