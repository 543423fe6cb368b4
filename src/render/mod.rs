//! HTML renderer.
//!
//! Walks an element tree depth-first and writes HTML, resolving component
//! nodes against the root's instance arena on the way:
//!
//! ```text
//! render_instance(id)
//!   ├── definition.render(cx) -> Element
//!   ├── plain tag   -> open tag (+ data-component-id on the render root)
//!   │                  attributes, data-on<event> tokens, children, close
//!   └── component   -> reuse instance at (parent, slot path) if same type,
//!                      else construct; render_instance(child)
//! ```
//!
//! A renderer is single-use: it records which instances it rendered and
//! which child instances lost their slot, and the reconciler decides what to
//! do with them once the pass is known to have succeeded.

pub(crate) mod tokens;

use std::sync::Arc;

use crate::component::instance::{Instance, SlotPath};
use crate::component::{HookCx, InstanceId, Props, RenderCx, StateHandle};
use crate::element::{AttrValue, Child, Element, NodeName};
use crate::runtime::{RootShared, RootTree};
use crate::utils::html::{escape, escape_attr, format_number, is_void_element};
use crate::utils::id::IdGen;

pub(crate) use tokens::TokenTable;

/// Bookkeeping of one render walk.
#[derive(Debug, Default)]
pub(crate) struct RenderOutcome {
    /// Instances whose `render` ran, in call order.
    pub rendered: Vec<InstanceId>,
    /// Child instances whose slot disappeared or changed type.
    pub dropped: Vec<InstanceId>,
}

/// Per-instance walk state.
struct Scope {
    owner: InstanceId,
    depth: usize,
    /// Slots of the previous render not yet claimed.
    previous: Vec<(SlotPath, InstanceId)>,
    children: Vec<(SlotPath, InstanceId)>,
    tokens: Vec<String>,
    path: SlotPath,
}

pub(crate) struct Renderer<'a> {
    tree: &'a mut RootTree,
    ids: &'a IdGen,
    root: &'a Arc<RootShared>,
    outcome: RenderOutcome,
}

impl<'a> Renderer<'a> {
    pub fn new(tree: &'a mut RootTree, ids: &'a IdGen, root: &'a Arc<RootShared>) -> Self {
        Self {
            tree,
            ids,
            root,
            outcome: RenderOutcome::default(),
        }
    }

    pub fn finish(self) -> RenderOutcome {
        self.outcome
    }

    /// Construct the root instance for a component element and render it.
    ///
    /// Returns `None` when `element` is not a component node.
    pub fn mount_root(&mut self, id: &str, element: &Element) -> Option<String> {
        let definition = element.node_name.as_component()?.clone();
        let props = Props::from_element(element);
        let instance = Instance::new(id.to_string(), definition, props, None, SlotPath::new(), 0);
        self.tree.insert(instance);
        Some(self.render_instance(id))
    }

    /// Re-render one instance's subtree.
    pub fn render_instance(&mut self, id: &str) -> String {
        let Some(instance) = self.tree.get_mut(id) else {
            return String::new();
        };
        let definition = instance.definition.clone();
        let props = instance.props.clone();
        let state = instance.state.clone();
        let depth = instance.depth;
        let previous = std::mem::take(&mut instance.children);
        let old_tokens = std::mem::take(&mut instance.tokens);
        self.tree.tokens.revoke(&old_tokens);

        let handle = StateHandle::new(self.root, id);
        let element = definition
            .definition()
            .render(&RenderCx::new(&props, &state, handle));

        let mut scope = Scope {
            owner: id.to_string(),
            depth,
            previous,
            children: Vec::new(),
            tokens: Vec::new(),
            path: SlotPath::new(),
        };
        let mut out = String::new();
        match &element.node_name {
            NodeName::Tag(tag) => self.write_tag(&element, tag, &mut scope, &mut out, Some(id)),
            NodeName::Component(_) => {
                out.push_str("<div");
                write_attr(&mut out, "data-component-id", id);
                out.push('>');
                self.write_component(&element, &mut scope, &mut out);
                out.push_str("</div>");
            }
        }

        self.outcome
            .dropped
            .extend(scope.previous.into_iter().map(|(_, old)| old));
        if let Some(instance) = self.tree.get_mut(id) {
            instance.children = scope.children;
            instance.tokens = scope.tokens;
            instance.mark_rendered();
        }
        crate::debug!("render"; "{} <{}> ({} bytes)", id, definition.name(), out.len());
        self.outcome.rendered.push(id.to_string());
        out
    }

    fn write_child(&mut self, child: &Child, scope: &mut Scope, out: &mut String) {
        match child {
            Child::Text(text) => out.push_str(&escape(text)),
            Child::Number(n) => out.push_str(&format_number(*n)),
            Child::Element(el) => match &el.node_name {
                NodeName::Tag(tag) => self.write_tag(el, tag, scope, out, None),
                NodeName::Component(_) => self.write_component(el, scope, out),
            },
        }
    }

    fn write_tag(
        &mut self,
        el: &Element,
        tag: &str,
        scope: &mut Scope,
        out: &mut String,
        component_id: Option<&str>,
    ) {
        out.push('<');
        out.push_str(tag);
        if let Some(id) = component_id {
            write_attr(out, "data-component-id", id);
        }
        for (key, value) in el.attributes.iter() {
            match value {
                AttrValue::Bool(true) => {
                    out.push(' ');
                    out.push_str(key);
                }
                AttrValue::Bool(false) => {}
                other => write_attr(out, key, &other.to_attr_text()),
            }
        }
        for binding in &el.events {
            let owner = binding.handler.owner().unwrap_or(scope.owner.as_str()).to_string();
            let token = self.ids.next_id();
            write_attr(out, &format!("data-on{}", binding.event), &token);
            let handler = binding.handler.clone().owned_by(&owner);
            self.tree.tokens.register(token.clone(), owner, handler);
            scope.tokens.push(token);
        }
        out.push('>');

        if is_void_element(tag) {
            return;
        }
        for (i, child) in el.children.iter().enumerate() {
            scope.path.push(i as u32);
            self.write_child(child, scope, out);
            scope.path.pop();
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    /// Resolve the instance for a component node at the current slot and
    /// render it.
    fn write_component(&mut self, el: &Element, scope: &mut Scope, out: &mut String) {
        let Some(definition) = el.node_name.as_component() else {
            return;
        };
        let mut next_props = Props::from_element(el);
        next_props.bind_handlers(&scope.owner);

        let reused = scope
            .previous
            .iter()
            .position(|(slot, id)| {
                *slot == scope.path
                    && self
                        .tree
                        .get(id)
                        .is_some_and(|inst| inst.definition.same_type(definition))
            })
            .map(|pos| scope.previous.swap_remove(pos).1);

        let id = match reused {
            Some(id) => {
                self.receive_props(&id, next_props);
                id
            }
            None => {
                let id = self.ids.next_id();
                let instance = Instance::new(
                    id.clone(),
                    definition.clone(),
                    next_props,
                    Some(scope.owner.clone()),
                    scope.path.clone(),
                    scope.depth + 1,
                );
                crate::debug!("render"; "constructed <{}> {} under {}", definition.name(), id, scope.owner);
                self.tree.insert(instance);
                id
            }
        };

        scope.children.push((scope.path.clone(), id.clone()));
        let html = self.render_instance(&id);
        out.push_str(&html);
    }

    /// Fire `component_will_receive_props`, then swap the props in.
    fn receive_props(&mut self, id: &str, next: Props) {
        let Some(instance) = self.tree.get(id) else {
            return;
        };
        let definition = instance.definition.clone();
        {
            let cx = HookCx::new(
                &instance.props,
                &instance.state,
                StateHandle::new(self.root, id),
            );
            definition.definition().component_will_receive_props(&next, &cx);
        }
        if let Some(instance) = self.tree.get_mut(id) {
            instance.props = next;
        }
    }
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}
