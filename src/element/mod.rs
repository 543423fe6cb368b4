//! Virtual element model and factory.
//!
//! An [`Element`] is an immutable description of one node: a tag name or a
//! component reference, its attributes, its event registrations and its
//! ordered children. Elements are rebuilt on every render call and never
//! mutated afterwards; the builder methods consume and return a new value.
//!
//! # Construction
//!
//! ```ignore
//! let p = create_elem("p", None, children![
//!     "A paragraph",
//!     create_elem("img", attrs! { "src" => "foo", "class" => "bar" }, ()),
//! ]);
//!
//! // builder style
//! let button = Element::tag("button")
//!     .attr("class", "primary")
//!     .on("click", Handler::new(|cx| cx.set_state(json!({ "open": true }))))
//!     .child("Open");
//! ```

mod attrs;
mod select;

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::component::{Component, ComponentRef, Handler};

pub use attrs::{AttrValue, Attributes};

// =============================================================================
// Node Name
// =============================================================================

/// What an element stands for: a plain tag or a component definition.
#[derive(Clone, PartialEq)]
pub enum NodeName {
    Tag(String),
    Component(ComponentRef),
}

impl NodeName {
    /// Tag name or component display name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tag(tag) => tag,
            Self::Component(c) => c.name(),
        }
    }

    /// Component reference, if this node is a component.
    pub fn as_component(&self) -> Option<&ComponentRef> {
        match self {
            Self::Component(c) => Some(c),
            Self::Tag(_) => None,
        }
    }
}

impl fmt::Debug for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "{tag:?}"),
            Self::Component(c) => write!(f, "<{}>", c.name()),
        }
    }
}

impl PartialEq<&str> for NodeName {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Self::Tag(tag) if tag == other)
    }
}

impl From<&str> for NodeName {
    fn from(tag: &str) -> Self {
        Self::Tag(tag.to_string())
    }
}

impl From<String> for NodeName {
    fn from(tag: String) -> Self {
        Self::Tag(tag)
    }
}

impl From<ComponentRef> for NodeName {
    fn from(c: ComponentRef) -> Self {
        Self::Component(c)
    }
}

// =============================================================================
// Children
// =============================================================================

/// A flattened child: text, number or nested element.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Text(String),
    Number(f64),
    Element(Element),
}

impl Child {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }
}

impl PartialEq<&str> for Child {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

impl Serialize for Child {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => AttrValue::Number(*n).serialize(serializer),
            Self::Element(e) => e.serialize(serializer),
        }
    }
}

/// Children argument accepted by the factory: possibly nested, possibly
/// containing `None` entries. Flattened into `Vec<Child>` on construction.
#[derive(Debug, Clone, Default)]
pub enum ChildArg {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Element(Element),
    List(Vec<ChildArg>),
}

impl ChildArg {
    /// Flatten into `out`, preserving order and dropping empty entries.
    fn flatten_into(self, out: &mut Vec<Child>) {
        match self {
            Self::Empty => {}
            Self::Text(s) => out.push(Child::Text(s)),
            Self::Number(n) => out.push(Child::Number(n)),
            Self::Element(e) => out.push(Child::Element(e)),
            Self::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }

    pub fn flatten(self) -> Vec<Child> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }
}

impl From<()> for ChildArg {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<&str> for ChildArg {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ChildArg {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for ChildArg {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<f64> for ChildArg {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

macro_rules! child_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ChildArg {
            fn from(n: $ty) -> Self {
                Self::Number(n as f64)
            }
        })*
    };
}

child_from_int!(i32, i64, u32, u64, usize);

impl From<Element> for ChildArg {
    fn from(e: Element) -> Self {
        Self::Element(e)
    }
}

impl From<Child> for ChildArg {
    fn from(c: Child) -> Self {
        match c {
            Child::Text(s) => Self::Text(s),
            Child::Number(n) => Self::Number(n),
            Child::Element(e) => Self::Element(e),
        }
    }
}

impl<T: Into<ChildArg>> From<Option<T>> for ChildArg {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Empty, Into::into)
    }
}

impl<T: Into<ChildArg>> From<Vec<T>> for ChildArg {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ChildArg>, const N: usize> From<[T; N]> for ChildArg {
    fn from(items: [T; N]) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Build a heterogeneous [`ChildArg::List`].
///
/// # Usage
/// ```ignore
/// let kids = children!["count: ", 3, create_elem("b", None, "!")];
/// ```
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        $crate::element::ChildArg::List(vec![$($crate::element::ChildArg::from($child)),*])
    };
}

// =============================================================================
// Event Registration
// =============================================================================

/// One `(event, handler)` entry of an element's registration list.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBinding {
    /// Lowercase DOM event name without the `on` prefix (`click`).
    pub event: String,
    pub handler: Handler,
}

/// Normalize `onClick`/`click` to `click`.
fn normalize_event_name(name: &str) -> String {
    let stripped = name
        .strip_prefix("on")
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
        .unwrap_or(name);
    stripped.to_ascii_lowercase()
}

// =============================================================================
// Element
// =============================================================================

/// Immutable virtual node.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub node_name: NodeName,
    pub attributes: Attributes,
    pub events: Vec<EventBinding>,
    pub children: Vec<Child>,
}

/// Build an element from a node name, optional attributes and a possibly
/// nested children argument.
///
/// Nested child lists are flattened in order, `None` entries are dropped and
/// the `select` autocomplete rule is applied.
pub fn create_elem(
    node_name: impl Into<NodeName>,
    attributes: impl Into<Option<Attributes>>,
    children: impl Into<ChildArg>,
) -> Element {
    let mut element = Element {
        node_name: node_name.into(),
        attributes: attributes.into().unwrap_or_default(),
        events: Vec::new(),
        children: children.into().flatten(),
    };
    select::apply_autocomplete_rule(&mut element);
    element
}

impl Element {
    /// Empty plain-tag element.
    pub fn tag(name: impl Into<String>) -> Self {
        create_elem(NodeName::Tag(name.into()), None, ())
    }

    /// Empty component element.
    pub fn component<C: Component>(component: C) -> Self {
        create_elem(ComponentRef::new(component), None, ())
    }

    /// Set one attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Register an event handler (`"click"` or `"onClick"`).
    pub fn on(mut self, event: &str, handler: Handler) -> Self {
        let event = normalize_event_name(event);
        self.events.retain(|b| b.event != event);
        self.events.push(EventBinding { event, handler });
        self
    }

    /// Append one child argument (flattened).
    pub fn child(mut self, child: impl Into<ChildArg>) -> Self {
        child.into().flatten_into(&mut self.children);
        select::apply_autocomplete_rule(&mut self);
        self
    }

    /// Append several children.
    pub fn children<I, C>(self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ChildArg>,
    {
        self.child(ChildArg::List(children.into_iter().map(Into::into).collect()))
    }

    /// True when this is a plain tag with the given name.
    pub fn is_tag(&self, name: &str) -> bool {
        self.node_name == name
    }

    pub fn is_component(&self) -> bool {
        matches!(self.node_name, NodeName::Component(_))
    }

    /// Concatenated text of all text and number descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(children: &[Child], out: &mut String) {
    for child in children {
        match child {
            Child::Text(s) => out.push_str(s),
            Child::Number(n) => out.push_str(&crate::utils::html::format_number(*n)),
            Child::Element(e) => collect_text(&e.children, out),
        }
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("nodeName", self.node_name.as_str())?;
        map.serialize_entry("attributes", &self.attributes)?;
        map.serialize_entry("children", &self.children)?;
        map.end()
    }
}

// =============================================================================
// Tests
// =============================================================================
