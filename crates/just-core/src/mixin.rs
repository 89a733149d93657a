//! Memoized, identity-tagged composition of behavior fragments onto classes.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::class::{ClassId, ElementClass};
use crate::collections::map::{HashMap, HashSet};
use crate::error::ConfigError;
use crate::host::Host;

pub type MixinId = usize;

static NEXT_MIXIN_ID: AtomicUsize = AtomicUsize::new(1);

type Composer = Rc<dyn Fn(&MixinRegistry, &ElementClass) -> Result<ElementClass, ConfigError>>;

struct MixinInner {
    id: MixinId,
    name: String,
    composer: Composer,
    marker: OnceCell<ElementClass>,
}

/// Opaque identity token wrapping a composer. Two mixins are the same only
/// if they are clones of one handle.
#[derive(Clone)]
pub struct Mixin {
    inner: Rc<MixinInner>,
}

impl Mixin {
    /// `composer` receives the registry (to compose dependencies first) and
    /// the base class, and returns the derived class.
    pub fn new(
        name: impl Into<String>,
        composer: impl Fn(&MixinRegistry, &ElementClass) -> Result<ElementClass, ConfigError> + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(MixinInner {
                id: NEXT_MIXIN_ID.fetch_add(1, Ordering::Relaxed),
                name: name.into(),
                composer: Rc::new(composer),
                marker: OnceCell::new(),
            }),
        }
    }

    pub fn id(&self) -> MixinId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn ptr_eq(&self, other: &Mixin) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether `class` or one of its ancestors was composed with this mixin.
    pub fn detect(&self, class: &ElementClass) -> bool {
        class.has_identity(self.id())
    }

    pub fn detect_instance(&self, host: &Host) -> bool {
        self.detect(host.class())
    }

    /// Abstract class carrying only this identity. It can be extended but
    /// never defined or constructed.
    pub fn marker(&self) -> ElementClass {
        self.inner
            .marker
            .get_or_init(|| {
                let marker = ElementClass::builder(format!("{}Marker", self.name()))
                    .abstract_class()
                    .build();
                marker.tag_identity(self.id());
                marker
            })
            .clone()
    }
}

impl PartialEq for Mixin {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Mixin {}

impl fmt::Debug for Mixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixin")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Cache of composed classes keyed by `(base class, mixin)`.
#[derive(Default)]
pub struct MixinRegistry {
    cache: RefCell<HashMap<(ClassId, MixinId), ElementClass>>,
    composing: RefCell<HashSet<(ClassId, MixinId)>>,
}

impl MixinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `mixin` to `base` at most once.
    ///
    /// Returns `base` itself when the identity is already satisfied by it or
    /// an ancestor, and the cached class when the pair was composed before.
    pub fn compose(&self, base: &ElementClass, mixin: &Mixin) -> Result<ElementClass, ConfigError> {
        if mixin.detect(base) {
            return Ok(base.clone());
        }
        let key = (base.id(), mixin.id());
        if let Some(composed) = self.cache.borrow().get(&key) {
            return Ok(composed.clone());
        }
        if !self.composing.borrow_mut().insert(key) {
            return Err(ConfigError::CyclicMixin {
                mixin: mixin.name().to_string(),
                class: base.name().to_string(),
            });
        }

        let result = (mixin.inner.composer)(self, base);
        self.composing.borrow_mut().remove(&key);
        let mut composed = result?;

        if composed.ptr_eq(base) || self.is_shared(&composed) {
            composed = composed
                .extend(format!("{}({})", mixin.name(), base.name()))
                .build();
        }
        composed.tag_identity(mixin.id());
        log::debug!(
            "composed mixin '{}' onto '{}' as '{}'",
            mixin.name(),
            base.name(),
            composed.name()
        );
        self.cache.borrow_mut().insert(key, composed.clone());
        Ok(composed)
    }

    /// Starts a left fold of mixins over `base`.
    pub fn mix<'a>(&'a self, base: &ElementClass) -> Mix<'a> {
        Mix {
            registry: self,
            base: base.clone(),
        }
    }

    fn is_shared(&self, class: &ElementClass) -> bool {
        self.cache.borrow().values().any(|cached| cached.ptr_eq(class))
    }

    pub fn is_cached(&self, base: &ElementClass, mixin: &Mixin) -> bool {
        self.cache.borrow().contains_key(&(base.id(), mixin.id()))
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

impl fmt::Debug for MixinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinRegistry")
            .field("cached", &self.len())
            .finish()
    }
}

pub struct Mix<'a> {
    registry: &'a MixinRegistry,
    base: ElementClass,
}

impl Mix<'_> {
    pub fn with<'m>(self, mixins: impl IntoIterator<Item = &'m Mixin>) -> Result<ElementClass, ConfigError> {
        mixins
            .into_iter()
            .try_fold(self.base, |class, mixin| self.registry.compose(&class, mixin))
    }
}

#[cfg(test)]
#[path = "tests/mixin_tests.rs"]
mod tests;
