use std::any::Any;

use indexmap::IndexMap;
use just_dom::{MutationKind, MutationObserver, MutationRecord, ObserveOptions};

use crate::case::prop_to_attr;
use crate::host::Host;
use crate::unit::{Unit, UnitSignature};

/// Keeps the class's `attributes` in sync between the element's attributes
/// and the state store.
#[derive(Default)]
pub struct AttributeUnit {
    observer: Option<MutationObserver>,
}

impl AttributeUnit {
    pub fn signature() -> UnitSignature {
        UnitSignature::new(|_host| Ok(AttributeUnit::default()))
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }
}

/// Attribute name → property name for every configured attribute.
fn observed_attributes(host: &Host) -> IndexMap<String, String> {
    host.class()
        .resolved()
        .attributes
        .keys()
        .map(|property| (prop_to_attr(property), property.clone()))
        .collect()
}

fn apply_records(host: &Host, observed: &IndexMap<String, String>, records: &[MutationRecord]) {
    let resolved = host.class().resolved();
    for (index, record) in records.iter().enumerate() {
        if record.kind != MutationKind::Attributes {
            continue;
        }
        let Some(attribute) = record.attribute_name.as_deref() else {
            continue;
        };
        let Some(property) = observed.get(attribute) else {
            continue;
        };
        let Some(config) = resolved.attributes.get(property) else {
            continue;
        };

        // The value this mutation wrote is what the next write to the same
        // attribute replaced; the last write left the current value.
        let new_value = records[index + 1..]
            .iter()
            .find(|later| later.attribute_name.as_deref() == Some(attribute))
            .map(|later| later.old_value.clone())
            .unwrap_or_else(|| host.element().get_attribute(attribute));
        if new_value == record.old_value {
            continue;
        }
        host.apply_attribute_change(property, config, new_value.as_deref());
    }
}

impl Unit for AttributeUnit {
    fn on_init(&mut self, host: &Host) {
        let observed = observed_attributes(host);
        if observed.is_empty() {
            return;
        }

        let resolved = host.class().resolved();
        for (attribute, property) in &observed {
            let (Some(raw), Some(config)) = (
                host.element().get_attribute(attribute),
                resolved.attributes.get(property),
            ) else {
                continue;
            };
            let value = match &config.transform {
                Some(transform) => transform.extract(&raw.into()).into_value(),
                None => raw.into(),
            };
            host.state().set(property, value);
        }

        let filter = observed.keys().cloned().collect();
        let weak = host.downgrade();
        let observer = MutationObserver::new(move |records, _observer| {
            if let Some(host) = weak.upgrade() {
                apply_records(&host, &observed, records);
            }
        });
        observer.observe(host.element(), ObserveOptions::attributes_with_old_value(filter));
        self.observer = Some(observer);
    }

    fn on_connect(&mut self, host: &Host) {
        let resolved = host.class().resolved();
        for (property, config) in &resolved.attributes {
            let Some(default) = config.default.clone() else {
                continue;
            };
            if host.element().has_attribute(&prop_to_attr(property)) {
                continue;
            }
            if let Err(err) = host.set(property, default) {
                log::error!("default for {}.{property} rejected: {err}", host.element().describe());
            }
        }
    }

    fn on_disconnect(&mut self, _host: &Host) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
