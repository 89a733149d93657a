//! Per-element instance state and the bridge from document reactions to
//! lifecycle hooks.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use just_dom::{Document, ElementReactions, Node};

use crate::class::ElementClass;
use crate::error::ConfigError;
use crate::host::Host;
use crate::state::StateStore;
use crate::unit::{LifecycleHook, UnitContainer};
use crate::units::shadow::ShadowParts;

/// Everything the runtime keeps for one upgraded element.
///
/// The element itself is not held here; the document owns the instance
/// through the element's reactions slot.
pub(crate) struct ElementInstance {
    me: Weak<ElementInstance>,
    pub(crate) class: ElementClass,
    pub(crate) state: StateStore,
    pub(crate) container: RefCell<Option<UnitContainer>>,
    pub(crate) shadow: RefCell<ShadowParts>,
    pending: RefCell<VecDeque<LifecycleHook>>,
    invoking: Cell<bool>,
    disconnected: Cell<bool>,
}

impl ElementInstance {
    /// Builds the instance for `element`: state seeded from the class,
    /// property defaults applied, units attached, then `Init` fired.
    pub(crate) fn construct(class: &ElementClass, element: &Node) -> Result<Host, ConfigError> {
        if class.is_abstract() {
            return Err(ConfigError::AbstractClass {
                class: class.name().to_string(),
            });
        }
        let resolved = class.resolved();
        let instance = Rc::new_cyclic(|me| ElementInstance {
            me: me.clone(),
            class: class.clone(),
            state: StateStore::new(resolved.default_state.clone()),
            container: RefCell::new(None),
            shadow: RefCell::new(ShadowParts::default()),
            pending: RefCell::new(VecDeque::new()),
            invoking: Cell::new(false),
            disconnected: Cell::new(false),
        });
        let host = Host::new(element.clone(), instance);
        log::trace!("constructing {} as '{}'", element.describe(), class.name());

        for (property, config) in &resolved.properties {
            if let Some(default) = &config.default {
                host.set_property(property, config, default.clone());
            }
        }

        let mut container = UnitContainer::new();
        container.attach(&host, &resolved.units)?;
        *host.instance().container.borrow_mut() = Some(container);

        host.invoke_lifecycle_hook(LifecycleHook::Init);
        Ok(host)
    }

    fn host_for(&self, element: &Node) -> Option<Host> {
        self.me
            .upgrade()
            .map(|instance| Host::new(element.clone(), instance))
    }

    /// Runs `hook` on every unit in attachment order, then the class's host
    /// hook. A request made while another hook is running is queued behind
    /// it.
    pub(crate) fn invoke(&self, host: &Host, hook: LifecycleHook) {
        self.pending.borrow_mut().push_back(hook);
        if self.invoking.replace(true) {
            log::trace!("{} queued behind the running hook", hook.name());
            return;
        }
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(hook) = next else {
                break;
            };
            self.run(host, hook);
        }
        self.invoking.set(false);
    }

    fn run(&self, host: &Host, hook: LifecycleHook) {
        if hook == LifecycleHook::Disconnect && self.disconnected.replace(true) {
            log::trace!("{} already disconnected", host.element().describe());
            return;
        }
        log::trace!("{} {}", host.element().describe(), hook.name());

        let slots = self
            .container
            .borrow()
            .as_ref()
            .map(UnitContainer::slots)
            .unwrap_or_default();
        for slot in slots {
            match slot.try_borrow_mut() {
                Ok(mut unit) => unit.run_hook(hook, host),
                Err(_) => log::warn!(
                    "unit on {} is busy, skipping {}",
                    host.element().describe(),
                    hook.name()
                ),
            }
        }

        let host_hook = self.class.resolved().hooks.get(&hook).cloned();
        if let Some(callback) = host_hook {
            callback(host);
        }

        if hook == LifecycleHook::Disconnect {
            let units = self.container.borrow_mut().take();
            drop(units);
        }
    }
}

impl ElementReactions for ElementInstance {
    fn connected(&self, element: &Node) {
        if !element.is_connected() {
            return;
        }
        if let Some(host) = self.host_for(element) {
            host.invoke_lifecycle_hook(LifecycleHook::Connect);
        }
    }

    fn disconnected(&self, element: &Node) {
        if element.is_connected() {
            return;
        }
        if let Some(host) = self.host_for(element) {
            host.invoke_lifecycle_hook(LifecycleHook::Disconnect);
        }
    }

    fn adopted(&self, element: &Node, _old_document: &Document, _new_document: &Document) {
        if let Some(host) = self.host_for(element) {
            host.invoke_lifecycle_hook(LifecycleHook::Adopted);
        }
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
