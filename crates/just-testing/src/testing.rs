use std::cell::RefCell;
use std::rc::Rc;

use just_core::{ConfigError, ElementClass, Host, Runtime};
use just_dom::{DefineOptions, Document, DomError, Node};

/// Headless harness for exercising components in tests.
///
/// Owns a fresh [`Runtime`] and [`Document`], mounts elements under the
/// document body and drives the deferred mutation delivery that attribute
/// binding depends on.
pub struct ComponentTestRule {
    runtime: Runtime,
    document: Document,
}

impl ComponentTestRule {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            runtime: Runtime::new(),
            document: Document::new(),
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn body(&self) -> Node {
        self.document.body()
    }

    /// The runtime's core element; the usual base for test components.
    pub fn core_element(&self) -> ElementClass {
        self.runtime.core_element()
    }

    pub fn define(&self, tag: &str, class: &ElementClass) -> Result<(), ConfigError> {
        self.runtime
            .define(&self.document, tag, class, DefineOptions::default())
    }

    /// Defines a customized built-in `<extends is="tag">`.
    pub fn define_builtin(
        &self,
        tag: &str,
        extends: &str,
        class: &ElementClass,
    ) -> Result<(), ConfigError> {
        self.runtime
            .define(&self.document, tag, class, DefineOptions::extends(extends))
    }

    /// Creates `tag` without connecting it.
    pub fn create(&self, tag: &str) -> Result<Host, DomError> {
        let element = self.document.try_create_element(tag)?;
        Ok(Host::from_node(&element).unwrap_or_else(|| panic!("<{tag}> is not a defined component")))
    }

    /// Creates `tag` and appends it to the body.
    pub fn mount(&self, tag: &str) -> Result<Host, DomError> {
        let host = self.create(tag)?;
        self.body().append_child(host.element())?;
        Ok(host)
    }

    /// Parses `markup` and appends the result to the body, returning the
    /// top-level nodes.
    pub fn mount_markup(&self, markup: &str) -> Result<Vec<Node>, DomError> {
        let fragment = self.document.parse_fragment(markup)?;
        let nodes = fragment.children();
        self.body().append_child(&fragment)?;
        Ok(nodes)
    }

    pub fn unmount(&self, host: &Host) {
        host.element().remove();
    }

    /// Delivers pending mutation records until the document is quiet.
    /// Returns the number of delivered batches.
    pub fn pump_until_idle(&self) -> usize {
        self.document.flush_mutations()
    }

    /// Host of the first body descendant that is an upgraded `tag`.
    pub fn find(&self, tag: &str) -> Option<Host> {
        self.body()
            .elements_by_tag(tag)
            .iter()
            .find_map(Host::from_node)
    }
}

impl Default for ComponentTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `ComponentTestRule`.
pub fn run_test_document<R>(f: impl FnOnce(&ComponentTestRule) -> R) -> R {
    let rule = ComponentTestRule::new();
    f(&rule)
}

/// Shared, clonable list of strings for recording callback order.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// Returns and clears the recorded entries.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use just_core::{AttributeConfig, Value};

    #[test]
    fn mount_connects_and_unmount_disconnects() {
        run_test_document(|rule| {
            let log = CallLog::new();
            let class = {
                let (connect, disconnect) = (log.clone(), log.clone());
                rule.core_element()
                    .extend("Probe")
                    .on_connect(move |_host| connect.push("connect"))
                    .on_disconnect(move |_host| disconnect.push("disconnect"))
                    .build()
            };
            rule.define("x-probe", &class).unwrap();

            let host = rule.mount("x-probe").unwrap();
            assert!(host.is_connected());
            assert!(rule.find("x-probe").unwrap().ptr_eq(&host));

            rule.unmount(&host);
            assert_eq!(log.take(), vec!["connect", "disconnect"]);
        });
    }

    #[test]
    fn pump_delivers_attribute_changes() {
        run_test_document(|rule| {
            let class = rule
                .core_element()
                .extend("Labelled")
                .attribute("label", AttributeConfig::new())
                .build();
            rule.define("x-labelled", &class).unwrap();

            let nodes = rule.mount_markup(r#"<x-labelled label="a"></x-labelled>"#).unwrap();
            let host = Host::from_node(&nodes[0]).unwrap();
            assert_eq!(host.get("label"), Value::from("a"));

            host.element().set_attribute("label", "b");
            assert_eq!(host.get("label"), Value::from("a"));
            assert_eq!(rule.pump_until_idle(), 1);
            assert_eq!(host.get("label"), Value::from("b"));
        });
    }
}
