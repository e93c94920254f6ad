use crate::reference::Interface;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn TraceSink>>> = const { RefCell::new(None) };
}

///
/// TraceEvent
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TraceEvent {
    LocationParsed {
        catalog: String,
        table: String,
    },
    FilterParsed {
        cached: bool,
    },
    PathComposed {
        joins: usize,
        aliases: usize,
    },
    RequestIssued {
        interface: Interface,
        uri: String,
    },
    RequestFailed {
        status: u16,
    },
    SourceDropped {
        key: String,
        reason: String,
    },
}

///
/// TraceSink
///

pub trait TraceSink {
    fn on_event(&self, event: &TraceEvent);
}

///
/// TracingSink
///
/// Default sink. Forwards events to `tracing`.
///

pub struct TracingSink;

impl TraceSink for TracingSink {
    fn on_event(&self, event: &TraceEvent) {
        match event {
            TraceEvent::LocationParsed { catalog, table } => {
                tracing::debug!(catalog = %catalog, table = %table, "location parsed");
            }
            TraceEvent::FilterParsed { cached } => {
                tracing::trace!(cached, "filter parsed");
            }
            TraceEvent::PathComposed { joins, aliases } => {
                tracing::debug!(joins, aliases, "path composed");
            }
            TraceEvent::RequestIssued { interface, uri } => {
                tracing::debug!(interface = %interface, uri = %uri, "request issued");
            }
            TraceEvent::RequestFailed { status } => {
                tracing::warn!(status, "request failed");
            }
            TraceEvent::SourceDropped { key, reason } => {
                tracing::info!(key = %key, reason = %reason, "source definition dropped");
            }
        }
    }
}

pub(crate) fn record(event: TraceEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match sink {
        Some(sink) => sink.on_event(&event),
        None => TracingSink.on_event(&event),
    }
}

///
/// SinkGuard
///
/// Installs a sink for the current thread until dropped, then restores
/// the previous one. Needed where the scope spans `.await` points on a
/// current-thread runtime.
///

pub struct SinkGuard {
    previous: Option<Rc<dyn TraceSink>>,
}

impl SinkGuard {
    #[must_use]
    pub fn install(sink: Rc<dyn TraceSink>) -> Self {
        let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));

        Self { previous }
    }
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        SINK_OVERRIDE.with(|cell| {
            *cell.borrow_mut() = previous;
        });
    }
}

/// Run a closure with a temporary sink override.
pub fn with_sink<T>(sink: Rc<dyn TraceSink>, f: impl FnOnce() -> T) -> T {
    let _guard = SinkGuard::install(sink);

    f()
}
