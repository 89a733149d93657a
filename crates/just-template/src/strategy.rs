//! Strategy signatures and the built-in delegated strategies.

use std::rc::Rc;

use indexmap::IndexMap;
use just_core::{dispatch_action, Value};
use just_dom::Node;

use crate::error::RenderError;

/// A strategy named by a segment's hook attribute. Receives the segment, the
/// render context and the template element's parent, if any.
pub type Strategy = Rc<dyn Fn(&Node, &Value, Option<&Node>) -> Result<(), RenderError>>;

/// A strategy applied to hooked segments carrying its attribute. Receives
/// the segment, the attribute's value and the render context. Returns
/// whether the attribute was consumed; an unconsumed attribute stays on the
/// segment.
pub type DelegatedStrategy = Rc<dyn Fn(&Node, &str, &Value) -> Result<bool, RenderError>>;

pub const ATTR: &str = "attr";
pub const TEXT: &str = "text";
pub const ACTION: &str = "action";

pub(crate) fn builtin_delegated() -> IndexMap<String, DelegatedStrategy> {
    let mut table: IndexMap<String, DelegatedStrategy> = IndexMap::new();
    table.insert(ATTR.to_string(), Rc::new(fill_attribute));
    table.insert(TEXT.to_string(), Rc::new(fill_text));
    table.insert(ACTION.to_string(), Rc::new(bind_action));
    table
}

fn lookup<'a>(context: &'a Value, key: &str) -> Option<&'a Value> {
    context.get(key).filter(|value| !value.is_missing())
}

fn split_pair(value: &str) -> Option<(&str, &str)> {
    value
        .split_once(':')
        .filter(|(left, right)| !left.is_empty() && !right.is_empty())
}

/// `attr="href:url"` sets `href` to the context's `url`. Missing context
/// values leave the attribute untouched.
pub fn fill_attribute(segment: &Node, value: &str, context: &Value) -> Result<bool, RenderError> {
    let Some((attribute, key)) = split_pair(value) else {
        log::warn!("ignoring attr=\"{value}\" on {}", segment.describe());
        return Ok(false);
    };
    if let Some(found) = lookup(context, key) {
        segment.set_attribute(attribute, found.to_string());
    }
    Ok(true)
}

/// `text="title"` replaces the segment's children with the context's `title`.
pub fn fill_text(segment: &Node, key: &str, context: &Value) -> Result<bool, RenderError> {
    let text = lookup(context, key).map(Value::to_string).unwrap_or_default();
    segment.set_text_content(&text);
    Ok(true)
}

/// `action="click:select"` makes a click on the segment dispatch the
/// `select` action with the render context as payload.
pub fn bind_action(segment: &Node, value: &str, context: &Value) -> Result<bool, RenderError> {
    let Some((event, action)) = split_pair(value) else {
        log::warn!("ignoring action=\"{value}\" on {}", segment.describe());
        return Ok(false);
    };
    let weak = segment.downgrade();
    let action = action.to_string();
    let payload = context.clone();
    segment.set_event_handler(event, move |_event| {
        if let Some(segment) = weak.upgrade() {
            dispatch_action(&segment, &action, payload.clone(), None);
        }
    });
    Ok(true)
}
