use std::any::Any;

use just_dom::{ListenerId, ListenerOptions};

use crate::action::ActionHandler;
use crate::host::Host;
use crate::unit::{Unit, UnitSignature};

/// Installs the class's `actions` as listeners on the host element and
/// removes every one of them on disconnect.
#[derive(Debug, Default)]
pub struct ActionUnit {
    listeners: Vec<(String, ListenerId)>,
}

impl ActionUnit {
    pub fn signature() -> UnitSignature {
        UnitSignature::new(|_host| Ok(ActionUnit::default()))
    }

    pub(crate) fn add_action(
        &mut self,
        host: &Host,
        event: &str,
        handler: ActionHandler,
        options: ListenerOptions,
    ) -> ListenerId {
        let weak = host.downgrade();
        let id = host.element().add_event_listener(event, options, move |event| {
            if let Some(host) = weak.upgrade() {
                handler(event, &host);
            }
        });
        self.listeners.push((event.to_string(), id));
        id
    }

    /// Event names with an installed listener, in installation order.
    pub fn events(&self) -> Vec<&str> {
        self.listeners.iter().map(|(event, _)| event.as_str()).collect()
    }
}

impl Unit for ActionUnit {
    fn on_init(&mut self, host: &Host) {
        let resolved = host.class().resolved();
        for (event, config) in &resolved.actions {
            self.add_action(host, event, config.handler.clone(), config.options);
        }
    }

    fn on_disconnect(&mut self, host: &Host) {
        for (event, id) in self.listeners.drain(..) {
            if !host.element().remove_event_listener(id) {
                log::trace!("'{event}' listener was already gone");
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
