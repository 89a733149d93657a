//! Named actions: the event shape components use to talk to their ancestors.

use std::fmt;
use std::rc::Rc;

use just_dom::{Event, EventInit, ListenerOptions, Node};

use crate::host::Host;
use crate::value::Value;

pub type ActionHandler = Rc<dyn Fn(&Event, &Host)>;

/// One entry of a class's `actions` table.
#[derive(Clone)]
pub struct ActionConfig {
    pub handler: ActionHandler,
    pub options: ListenerOptions,
}

impl fmt::Debug for ActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionConfig")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionOptions {
    pub bubbles: bool,
    pub composed: bool,
    pub cancelable: bool,
}

impl Default for ActionOptions {
    fn default() -> Self {
        Self {
            bubbles: true,
            composed: true,
            cancelable: true,
        }
    }
}

impl From<ActionOptions> for EventInit {
    fn from(options: ActionOptions) -> Self {
        EventInit {
            bubbles: options.bubbles,
            composed: options.composed,
            cancelable: options.cancelable,
        }
    }
}

/// Dispatches `name` on `node` with `payload` as the detail. Returns false if
/// a listener cancelled it.
pub fn dispatch_action(
    node: &Node,
    name: &str,
    payload: Value,
    options: Option<ActionOptions>,
) -> bool {
    let init = EventInit::from(options.unwrap_or_default());
    log::trace!("dispatching action '{name}' on {}", node.describe());
    node.dispatch_event(&Event::new(name, init).with_detail(payload))
}

/// The payload of an action event, `Null` for plain events.
pub fn action_payload(event: &Event) -> Value {
    event.detail::<Value>().cloned().unwrap_or_default()
}
