//! The process-wide registries and the built-in mixins, bundled in one value
//! that is created at startup and passed by reference.

use std::cell::RefCell;
use std::rc::Rc;

use just_dom::{is_valid_custom_element_name, DefineOptions, Document, DomError, ElementReactions, Node};

use crate::class::ElementClass;
use crate::collections::map::HashMap;
use crate::error::{ConfigError, TransformError};
use crate::lifecycle::ElementInstance;
use crate::mixin::{Mix, Mixin, MixinRegistry};
use crate::transform::{Transform, TransformRegistry};
use crate::units::{ActionUnit, AttributeUnit, ShadowUnit};

/// Identities of the behavior every runtime component is built from.
#[derive(Clone, Debug)]
pub struct BuiltinMixins {
    pub lifecycle: Mixin,
    /// Lifecycle plus the action unit.
    pub actionable: Mixin,
    /// Lifecycle plus the attribute unit.
    pub stateful: Mixin,
    /// Actionable and Stateful.
    pub core: Mixin,
    /// The shadow unit; requires Core.
    pub shadow: Mixin,
}

impl BuiltinMixins {
    fn new() -> Self {
        let lifecycle = Mixin::new("Lifecycle", |_registry, base| {
            Ok(base.extend(format!("Lifecycle({})", base.name())).build())
        });

        let actionable = {
            let lifecycle = lifecycle.clone();
            Mixin::new("Actionable", move |registry, base| {
                let base = registry.compose(base, &lifecycle)?;
                Ok(base
                    .extend(format!("Actionable({})", base.name()))
                    .unit(ActionUnit::signature())
                    .build())
            })
        };

        let stateful = {
            let lifecycle = lifecycle.clone();
            Mixin::new("Stateful", move |registry, base| {
                let base = registry.compose(base, &lifecycle)?;
                Ok(base
                    .extend(format!("Stateful({})", base.name()))
                    .unit(AttributeUnit::signature())
                    .build())
            })
        };

        let core = {
            let actionable = actionable.clone();
            let stateful = stateful.clone();
            Mixin::new("Core", move |registry, base| {
                registry.mix(base).with([&actionable, &stateful])
            })
        };

        let shadow = {
            let core = core.clone();
            Mixin::new("Shadow", move |_registry, base| {
                if !core.detect(base) {
                    return Err(ConfigError::MissingRequirement {
                        mixin: "Shadow".to_string(),
                        required: core.name().to_string(),
                        class: base.name().to_string(),
                    });
                }
                Ok(base
                    .extend(format!("Shadow({})", base.name()))
                    .unit(ShadowUnit::signature())
                    .build())
            })
        };

        Self {
            lifecycle,
            actionable,
            stateful,
            core,
            shadow,
        }
    }
}

pub struct Runtime {
    mixins: MixinRegistry,
    transforms: TransformRegistry,
    builtins: BuiltinMixins,
    html_element: ElementClass,
    builtin_elements: RefCell<HashMap<String, ElementClass>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            mixins: MixinRegistry::new(),
            transforms: TransformRegistry::new(),
            builtins: BuiltinMixins::new(),
            html_element: ElementClass::html_element(),
            builtin_elements: RefCell::new(HashMap::default()),
        }
    }

    pub fn mixins(&self) -> &MixinRegistry {
        &self.mixins
    }

    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    pub fn builtins(&self) -> &BuiltinMixins {
        &self.builtins
    }

    /// The transform registered for `type_for`.
    pub fn transform(&self, type_for: &str) -> Result<Rc<dyn Transform>, TransformError> {
        self.transforms.get(type_for)
    }

    pub fn register_transform(&self, transform: impl Transform + 'static) -> Rc<dyn Transform> {
        self.transforms.register(transform)
    }

    pub fn compose(&self, base: &ElementClass, mixin: &Mixin) -> Result<ElementClass, ConfigError> {
        self.mixins.compose(base, mixin)
    }

    pub fn mix(&self, base: &ElementClass) -> Mix<'_> {
        self.mixins.mix(base)
    }

    pub fn html_element(&self) -> &ElementClass {
        &self.html_element
    }

    /// The generic element class with Core and Shadow applied; the base of
    /// autonomous components.
    pub fn core_element(&self) -> ElementClass {
        self.mix(&self.html_element)
            .with([&self.builtins.core, &self.builtins.shadow])
            .expect("built-in mixins compose onto the generic element")
    }

    /// Root class for the built-in `tag`, one per tag.
    pub fn builtin_element(&self, tag: &str) -> ElementClass {
        let tag = tag.to_ascii_lowercase();
        self.builtin_elements
            .borrow_mut()
            .entry(tag.clone())
            .or_insert_with(|| ElementClass::builtin_element(&tag))
            .clone()
    }

    /// Core and Shadow applied to the built-in `tag`; the base of customized
    /// built-ins such as `<nav is="page-nav">`.
    pub fn core_builtin(&self, tag: &str) -> ElementClass {
        self.mix(&self.builtin_element(tag))
            .with([&self.builtins.core, &self.builtins.shadow])
            .expect("built-in mixins compose onto built-in elements")
    }

    /// Registers `class` under `tag` in `document`.
    ///
    /// The class must be concrete, carry the Core identity, and declare the
    /// same extended tag as `options`. Elements constructed from it that fail
    /// surface as [`DomError::Construct`].
    pub fn define(
        &self,
        document: &Document,
        tag: &str,
        class: &ElementClass,
        options: DefineOptions,
    ) -> Result<(), ConfigError> {
        if !is_valid_custom_element_name(tag) {
            return Err(ConfigError::InvalidTagName {
                tag: tag.to_string(),
            });
        }
        if class.is_abstract() {
            return Err(ConfigError::AbstractClass {
                class: class.name().to_string(),
            });
        }
        if !self.builtins.core.detect(class) {
            return Err(ConfigError::MissingCoreIdentity {
                class: class.name().to_string(),
            });
        }
        let found = options.extends.as_deref().map(str::to_ascii_lowercase);
        if class.extends_tag() != found.as_deref() {
            return Err(ConfigError::MissingExtends {
                class: class.name().to_string(),
                expected: class.extends_tag().map(str::to_string),
                found,
            });
        }

        let constructed = class.clone();
        let constructor = move |element: &Node| -> Result<Rc<dyn ElementReactions>, DomError> {
            match ElementInstance::construct(&constructed, element) {
                Ok(host) => Ok(host.instance_handle() as Rc<dyn ElementReactions>),
                Err(err) => Err(DomError::Construct {
                    element: element.local_name().unwrap_or_default().to_string(),
                    message: err.to_string(),
                }),
            }
        };
        document.define(tag, constructor, options)?;
        log::debug!("'{tag}' defined as class '{}'", class.name());
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("mixins", &self.mixins)
            .field("transforms", &self.transforms)
            .finish()
    }
}
