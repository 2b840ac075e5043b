//! Synchronous kernel event bus.
//!
//! The bus is a typed dispatch table: one ordered listener list per
//! [`EventKind`]. [`EventBus::emit`] invokes every listener registered for
//! the event's kind, in subscription order, before returning. Nothing is
//! queued, dropped, reordered or deferred.
//!
//! # Reentrancy
//!
//! Listeners run while the kernel is mid-operation. A listener must not call
//! back into the kernel that is dispatching to it. Through `&mut` access this
//! is rejected at compile time; through a shared handle (e.g. a mutex around
//! the kernel) it deadlocks. Either way the behaviour is undefined for the
//! model and must not be relied upon.
//!
//! # Usage
//!
//! ```rust
//! # use sanctum_kernel::{Kernel, EventKind, KernelEvent};
//! let mut kernel = Kernel::new();
//! kernel.on(EventKind::ProcessCreated, |event| {
//!     if let KernelEvent::ProcessCreated { process } = event {
//!         println!("started {}", process.name);
//!     }
//! });
//! kernel.create_process("Terminal", "terminal");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Pid, Process, Window, WindowId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// The five kinds of event the kernel emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    WindowCreated,
    WindowClosed,
    WindowUpdated,
    ProcessCreated,
    ProcessTerminated,
}

impl EventKind {
    /// Every kind, in dispatch-table order.
    pub const ALL: [EventKind; 5] = [
        EventKind::WindowCreated,
        EventKind::WindowClosed,
        EventKind::WindowUpdated,
        EventKind::ProcessCreated,
        EventKind::ProcessTerminated,
    ];

    /// Wire name, e.g. `"window:created"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WindowCreated => "window:created",
            Self::WindowClosed => "window:closed",
            Self::WindowUpdated => "window:updated",
            Self::ProcessCreated => "process:created",
            Self::ProcessTerminated => "process:terminated",
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::WindowCreated => 0,
            Self::WindowClosed => 1,
            Self::WindowUpdated => 2,
            Self::ProcessCreated => 3,
            Self::ProcessTerminated => 4,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event emitted by the kernel after its tables have been updated.
///
/// Window payloads always carry the full resulting record so observers can
/// replace their copy wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelEvent {
    WindowCreated { window: Window },
    WindowClosed { id: WindowId, pid: Pid },
    WindowUpdated { window: Window },
    ProcessCreated { process: Process },
    ProcessTerminated { pid: Pid },
}

impl KernelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WindowCreated { .. } => EventKind::WindowCreated,
            Self::WindowClosed { .. } => EventKind::WindowClosed,
            Self::WindowUpdated { .. } => EventKind::WindowUpdated,
            Self::ProcessCreated { .. } => EventKind::ProcessCreated,
            Self::ProcessTerminated { .. } => EventKind::ProcessTerminated,
        }
    }
}

// ---------------------------------------------------------------------------
// Event bus
// ---------------------------------------------------------------------------

/// A registered event handler.
pub type Listener = Box<dyn FnMut(&KernelEvent) + Send>;

/// Handle returned by [`EventBus::on`], used to deregister a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Typed dispatch table of kernel listeners.
pub struct EventBus {
    slots: [Vec<(ListenerId, Listener)>; 5],
    next_id: u64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            next_id: 1,
        }
    }

    /// Register `listener` for `kind`. Listeners for the same kind run in
    /// registration order.
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&KernelEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.slots[kind.slot()].push((id, Box::new(listener)));
        tracing::trace!(event = %kind, listener = id.0, "kernel listener registered");
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        for slot in &mut self.slots {
            if let Some(pos) = slot.iter().position(|(lid, _)| *lid == id) {
                drop(slot.remove(pos));
                return true;
            }
        }
        false
    }

    /// Dispatch `event` to every listener of its kind and return how many
    /// ran.
    pub fn emit(&mut self, event: &KernelEvent) -> usize {
        let kind = event.kind();
        let slot = &mut self.slots[kind.slot()];
        for (_, listener) in slot.iter_mut() {
            listener(event);
        }
        tracing::trace!(event = %kind, listeners = slot.len(), "kernel event dispatched");
        slot.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.slots[kind.slot()].len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            map.entry(&kind.as_str(), &self.listener_count(kind));
        }
        map.finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn terminated(pid: Pid) -> KernelEvent {
        KernelEvent::ProcessTerminated { pid }
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let mut bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            bus.on(EventKind::ProcessTerminated, move |_| {
                log.lock().unwrap().push(tag);
            });
        }

        assert_eq!(bus.emit(&terminated(1)), 3);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn dispatch_is_per_kind() {
        let mut bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        bus.on(EventKind::WindowClosed, move |_| *h.lock().unwrap() += 1);

        assert_eq!(bus.emit(&terminated(1)), 0);
        assert_eq!(*hits.lock().unwrap(), 0);

        bus.emit(&KernelEvent::WindowClosed {
            id: WindowId::from("w"),
            pid: 1,
        });
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn off_removes_listener() {
        let mut bus = EventBus::new();
        let id = bus.on(EventKind::ProcessTerminated, |_| {});
        assert_eq!(bus.listener_count(EventKind::ProcessTerminated), 1);

        assert!(bus.off(id));
        assert!(!bus.off(id));
        assert_eq!(bus.listener_count(EventKind::ProcessTerminated), 0);
    }

    #[test]
    fn event_kind_names() {
        let names: Vec<&str> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "window:created",
                "window:closed",
                "window:updated",
                "process:created",
                "process:terminated"
            ]
        );
        assert_eq!(terminated(4).kind(), EventKind::ProcessTerminated);
    }
}
