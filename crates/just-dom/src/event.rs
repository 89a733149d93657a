//! Events and listener dispatch.
//!
//! Dispatch walks the propagation path computed when the event is fired:
//! capture listeners from the root down, then the target, then bubble
//! listeners back up when the event bubbles. A shadow root ends the path
//! unless the event is `composed`, in which case it continues at the host and
//! the target seen by outer listeners is the host.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::node::{Node, NodeKind};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

pub type ListenerId = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventInit {
    pub bubbles: bool,
    pub composed: bool,
    pub cancelable: bool,
}

impl EventInit {
    pub fn bubbling() -> Self {
        Self {
            bubbles: true,
            composed: true,
            cancelable: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

pub struct Event {
    event_type: String,
    init: EventInit,
    detail: Option<Rc<dyn Any>>,
    target: RefCell<Option<Node>>,
    current_target: RefCell<Option<Node>>,
    phase: Cell<EventPhase>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_stopped: Cell<bool>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, init: EventInit) -> Self {
        Self {
            event_type: event_type.into(),
            init,
            detail: None,
            target: RefCell::new(None),
            current_target: RefCell::new(None),
            phase: Cell::new(EventPhase::None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_stopped: Cell::new(false),
        }
    }

    pub fn with_detail<T: Any>(mut self, detail: T) -> Self {
        self.detail = Some(Rc::new(detail));
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn init(&self) -> EventInit {
        self.init
    }

    pub fn detail<T: Any>(&self) -> Option<&T> {
        self.detail.as_ref().and_then(|detail| detail.downcast_ref::<T>())
    }

    pub fn target(&self) -> Option<Node> {
        self.target.borrow().clone()
    }

    pub fn current_target(&self) -> Option<Node> {
        self.current_target.borrow().clone()
    }

    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// Has no effect on events that are not cancelable.
    pub fn prevent_default(&self) {
        if self.init.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_stopped.set(true);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("type", &self.event_type)
            .field("init", &self.init)
            .field("phase", &self.phase.get())
            .field("default_prevented", &self.default_prevented.get())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
}

type ListenerCallback = Rc<dyn Fn(&Event)>;

#[derive(Clone)]
pub(crate) struct Listener {
    id: ListenerId,
    event_type: String,
    capture: bool,
    once: bool,
    handler_slot: bool,
    callback: ListenerCallback,
    removed: Rc<Cell<bool>>,
}

impl Node {
    pub fn add_event_listener(
        &self,
        event_type: &str,
        options: ListenerOptions,
        callback: impl Fn(&Event) + 'static,
    ) -> ListenerId {
        self.push_listener(event_type, options, false, Rc::new(callback))
    }

    fn push_listener(
        &self,
        event_type: &str,
        options: ListenerOptions,
        handler_slot: bool,
        callback: ListenerCallback,
    ) -> ListenerId {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.borrow_mut().push(Listener {
            id,
            event_type: event_type.to_string(),
            capture: options.capture,
            once: options.once,
            handler_slot,
            callback,
            removed: Rc::new(Cell::new(false)),
        });
        id
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        match listeners.iter().position(|listener| listener.id == id) {
            Some(index) => {
                listeners.remove(index).removed.set(true);
                true
            }
            None => false,
        }
    }

    /// Installs the single `on<event>` style handler for `event_type`,
    /// replacing any previous one.
    pub fn set_event_handler(&self, event_type: &str, callback: impl Fn(&Event) + 'static) {
        self.clear_event_handler(event_type);
        self.push_listener(event_type, ListenerOptions::default(), true, Rc::new(callback));
    }

    pub fn clear_event_handler(&self, event_type: &str) {
        self.inner.listeners.borrow_mut().retain(|listener| {
            let matches = listener.handler_slot && listener.event_type == event_type;
            if matches {
                listener.removed.set(true);
            }
            !matches
        });
    }

    pub fn has_event_handler(&self, event_type: &str) -> bool {
        self.inner
            .listeners
            .borrow()
            .iter()
            .any(|listener| listener.handler_slot && listener.event_type == event_type)
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.event_type == event_type)
            .count()
    }

    /// Dispatches `event` with this node as target. Returns `false` when a
    /// listener canceled it.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        let path = self.propagation_path(event.init.composed);
        *event.target.borrow_mut() = Some(self.clone());
        event.propagation_stopped.set(false);
        event.immediate_stopped.set(false);

        for (node, target) in path.iter().rev() {
            if event.propagation_stopped.get() {
                break;
            }
            let at_target = node.ptr_eq(target);
            event.phase.set(if at_target {
                EventPhase::AtTarget
            } else {
                EventPhase::Capturing
            });
            *event.target.borrow_mut() = Some(target.clone());
            node.invoke_listeners(event, true);
        }

        for (node, target) in path.iter() {
            if event.propagation_stopped.get() {
                break;
            }
            let at_target = node.ptr_eq(target);
            if !at_target && !event.init.bubbles {
                continue;
            }
            event.phase.set(if at_target {
                EventPhase::AtTarget
            } else {
                EventPhase::Bubbling
            });
            *event.target.borrow_mut() = Some(target.clone());
            node.invoke_listeners(event, false);
        }

        event.phase.set(EventPhase::None);
        *event.current_target.borrow_mut() = None;
        *event.target.borrow_mut() = Some(self.clone());
        !event.default_prevented.get()
    }

    /// Pairs each node on the path with the target as seen from that node.
    fn propagation_path(&self, composed: bool) -> Vec<(Node, Node)> {
        let mut path = Vec::new();
        let mut target = self.clone();
        let mut current = Some(self.clone());
        while let Some(node) = current {
            path.push((node.clone(), target.clone()));
            current = match node.kind() {
                NodeKind::ShadowRoot(_) if composed => {
                    let host = node.shadow_host();
                    if let Some(host) = &host {
                        target = host.clone();
                    }
                    host
                }
                NodeKind::ShadowRoot(_) => None,
                _ => node.parent(),
            };
        }
        path
    }

    /// Runs the capture or the non-capture listeners registered for the
    /// event's type. At the target, capture listeners run in the first pass.
    fn invoke_listeners(&self, event: &Event, capture: bool) {
        let snapshot: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.event_type == event.event_type)
            .filter(|listener| listener.capture == capture)
            .cloned()
            .collect();
        if snapshot.is_empty() {
            return;
        }
        *event.current_target.borrow_mut() = Some(self.clone());
        for listener in snapshot {
            if listener.removed.get() {
                continue;
            }
            if listener.once {
                self.remove_event_listener(listener.id);
            }
            (listener.callback)(event);
            if event.immediate_stopped.get() {
                break;
            }
        }
    }
}
