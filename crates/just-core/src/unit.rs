//! Protocol/plugin units and the per-instance container that orders them.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::host::Host;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    /// During construction, before the element is connected.
    Init,
    Connect,
    Disconnect,
    /// The element moved to another document.
    Adopted,
    /// The shadow unit finished populating the shadow root.
    AttachShadow,
}

impl LifecycleHook {
    pub fn name(self) -> &'static str {
        match self {
            LifecycleHook::Init => "onInit",
            LifecycleHook::Connect => "onConnect",
            LifecycleHook::Disconnect => "onDisconnect",
            LifecycleHook::Adopted => "onAdopted",
            LifecycleHook::AttachShadow => "onAttachShadow",
        }
    }
}

/// A behavior fragment owned by one host. Every hook defaults to a no-op.
pub trait Unit: Any {
    fn on_init(&mut self, _host: &Host) {}

    fn on_connect(&mut self, _host: &Host) {}

    fn on_disconnect(&mut self, _host: &Host) {}

    fn on_adopted(&mut self, _host: &Host) {}

    fn on_attach_shadow(&mut self, _host: &Host) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Unit {
    pub(crate) fn run_hook(&mut self, hook: LifecycleHook, host: &Host) {
        match hook {
            LifecycleHook::Init => self.on_init(host),
            LifecycleHook::Connect => self.on_connect(host),
            LifecycleHook::Disconnect => self.on_disconnect(host),
            LifecycleHook::Adopted => self.on_adopted(host),
            LifecycleHook::AttachShadow => self.on_attach_shadow(host),
        }
    }
}

pub type UnitFactory = Rc<dyn Fn(&Host) -> Result<Box<dyn Unit>, ConfigError>>;

/// Unit type plus a factory capturing the unit's immutable configuration.
#[derive(Clone)]
pub struct UnitSignature {
    kind: TypeId,
    name: &'static str,
    factory: UnitFactory,
}

impl UnitSignature {
    pub fn new<U: Unit>(factory: impl Fn(&Host) -> Result<U, ConfigError> + 'static) -> Self {
        Self {
            kind: TypeId::of::<U>(),
            name: std::any::type_name::<U>(),
            factory: Rc::new(move |host| Ok(Box::new(factory(host)?) as Box<dyn Unit>)),
        }
    }

    pub fn kind(&self) -> TypeId {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for UnitSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnitSignature").field(&self.name).finish()
    }
}

pub(crate) type UnitSlot = Rc<RefCell<Box<dyn Unit>>>;

/// Units in attachment order, at most one per unit type.
#[derive(Default)]
pub struct UnitContainer {
    units: IndexMap<TypeId, UnitSlot>,
}

impl UnitContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates one unit per signature, in order. Types already present
    /// are skipped.
    pub fn attach(&mut self, host: &Host, signatures: &[UnitSignature]) -> Result<(), ConfigError> {
        for signature in signatures {
            if self.units.contains_key(&signature.kind) {
                log::trace!("unit {} already attached, skipping", signature.name);
                continue;
            }
            let unit = (signature.factory)(host)?;
            self.units
                .insert(signature.kind, Rc::new(RefCell::new(unit)));
        }
        Ok(())
    }

    pub fn contains<U: Unit>(&self) -> bool {
        self.units.contains_key(&TypeId::of::<U>())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub(crate) fn slots(&self) -> Vec<UnitSlot> {
        self.units.values().cloned().collect()
    }

    pub(crate) fn slot<U: Unit>(&self) -> Option<UnitSlot> {
        self.units.get(&TypeId::of::<U>()).cloned()
    }
}

impl fmt::Debug for UnitContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitContainer")
            .field("units", &self.units.len())
            .finish()
    }
}
