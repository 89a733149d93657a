//! `Host`: the handle component code uses to reach its element, state,
//! units and shadow parts.

use std::fmt;
use std::rc::{Rc, Weak};

use just_dom::{Event, ListenerId, ListenerOptions, Node, WeakNode};

use crate::action::{self, ActionHandler, ActionOptions};
use crate::class::ElementClass;
use crate::lifecycle::ElementInstance;
use crate::state::StateStore;
use crate::unit::{LifecycleHook, Unit};
use crate::units::actions::ActionUnit;
use crate::units::shadow::ActionTarget;
use crate::value::Value;

/// An upgraded element together with its runtime instance. Cheap to clone.
#[derive(Clone)]
pub struct Host {
    element: Node,
    instance: Rc<ElementInstance>,
}

impl Host {
    pub(crate) fn new(element: Node, instance: Rc<ElementInstance>) -> Self {
        Self { element, instance }
    }

    /// The host of an element upgraded by this runtime.
    pub fn from_node(node: &Node) -> Option<Host> {
        let instance = node
            .reactions()?
            .into_any()
            .downcast::<ElementInstance>()
            .ok()?;
        Some(Host::new(node.clone(), instance))
    }

    pub(crate) fn instance(&self) -> &ElementInstance {
        &self.instance
    }

    pub(crate) fn instance_handle(&self) -> Rc<ElementInstance> {
        self.instance.clone()
    }

    pub fn element(&self) -> &Node {
        &self.element
    }

    pub fn class(&self) -> &ElementClass {
        &self.instance.class
    }

    pub fn state(&self) -> &StateStore {
        &self.instance.state
    }

    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.state().get(key)
    }

    pub fn set_state(&self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.state().set(key, value.into())
    }

    pub fn is_connected(&self) -> bool {
        self.element.is_connected()
    }

    pub fn ptr_eq(&self, other: &Host) -> bool {
        Rc::ptr_eq(&self.instance, &other.instance)
    }

    pub fn downgrade(&self) -> WeakHost {
        WeakHost {
            element: self.element.downgrade(),
            instance: Rc::downgrade(&self.instance),
        }
    }

    /// Runs `hook` on every attached unit, then on the class.
    pub fn invoke_lifecycle_hook(&self, hook: LifecycleHook) {
        self.instance.invoke(self, hook);
    }

    /// Emits a named action from this element; see [`action::dispatch_action`].
    pub fn dispatch_action(&self, name: &str, payload: impl Into<Value>, options: Option<ActionOptions>) -> bool {
        action::dispatch_action(&self.element, name, payload.into(), options)
    }

    /// Adds an action handler at runtime. It is removed with the class's own
    /// actions on disconnect. Returns `None` once the units are torn down.
    pub fn add_action(
        &self,
        event: &str,
        handler: impl Fn(&Event, &Host) + 'static,
    ) -> Option<ListenerId> {
        let handler: ActionHandler = Rc::new(handler);
        self.with_unit_mut(|unit: &mut ActionUnit| {
            unit.add_action(self, event, handler, ListenerOptions::default())
        })
    }

    pub fn shadow_root(&self) -> Option<Node> {
        self.instance.shadow.borrow().root.clone()
    }

    /// Shadow descendant whose camel-cased id is `key`.
    pub fn id(&self, key: &str) -> Option<Node> {
        self.instance.shadow.borrow().ids.get(key).cloned()
    }

    pub fn ids(&self) -> Vec<(String, Node)> {
        clone_entries(&self.instance.shadow.borrow().ids)
    }

    /// `<slot>` whose camel-cased name is `key`; unnamed slots are `default`.
    pub fn slot(&self, key: &str) -> Option<Node> {
        self.instance.shadow.borrow().slots.get(key).cloned()
    }

    pub fn slots(&self) -> Vec<(String, Node)> {
        clone_entries(&self.instance.shadow.borrow().slots)
    }

    pub fn target(&self, action: &str) -> Option<ActionTarget> {
        self.instance.shadow.borrow().targets.get(action).cloned()
    }

    pub fn targets(&self) -> Vec<(String, ActionTarget)> {
        clone_entries(&self.instance.shadow.borrow().targets)
    }

    pub fn has_unit<U: Unit>(&self) -> bool {
        self.instance
            .container
            .borrow()
            .as_ref()
            .map(|container| container.contains::<U>())
            .unwrap_or(false)
    }

    /// Borrows the attached unit of type `U`. `None` when absent, torn down
    /// or currently running a hook.
    pub fn with_unit<U: Unit, R>(&self, f: impl FnOnce(&U) -> R) -> Option<R> {
        let slot = self.instance.container.borrow().as_ref()?.slot::<U>()?;
        let unit = slot.try_borrow().ok()?;
        unit.as_any().downcast_ref::<U>().map(f)
    }

    pub fn with_unit_mut<U: Unit, R>(&self, f: impl FnOnce(&mut U) -> R) -> Option<R> {
        let slot = self.instance.container.borrow().as_ref()?.slot::<U>()?;
        let mut unit = slot.try_borrow_mut().ok()?;
        unit.as_any_mut().downcast_mut::<U>().map(f)
    }
}

fn clone_entries<T: Clone>(map: &indexmap::IndexMap<String, T>) -> Vec<(String, T)> {
    map.iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("element", &self.element)
            .field("class", &self.class().name())
            .finish()
    }
}

/// Non-owning host handle for listeners and observers installed on the
/// element itself.
#[derive(Clone)]
pub struct WeakHost {
    element: WeakNode,
    instance: Weak<ElementInstance>,
}

impl WeakHost {
    pub fn upgrade(&self) -> Option<Host> {
        Some(Host::new(self.element.upgrade()?, self.instance.upgrade()?))
    }
}
