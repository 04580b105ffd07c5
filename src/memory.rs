//! An in-process DOM backed by an [`indextree`] arena.
//!
//! [`MemoryDom`] implements just enough of the browser's behaviour for the reconciler to be
//! exercised (and used) outside of a browser: typed built-in properties that reflect to
//! attributes, custom element definitions, event dispatch with bubbling, CSS selector
//! matching and HTML parsing and serialization.
//!
//! Markup assigned through [`Dom::set_inner_html`] is parsed by html5ever into ordinary nodes,
//! so it can be queried, loaded and serialized like anything the reconciler created.
//!
//! Nodes the reconciler [releases](`Dom::release`), and children replaced through `textContent`
//! or inner HTML, are freed. Their [`NodeId`]s go stale and read as detached and empty.

use crate::{
	dom::{Dom, NodeKind, HTML_NAMESPACE},
	vdom::{Listener, Primitive, PropValue},
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use html5ever::{LocalName, Namespace, QualName};
use indextree::{Arena, Node as ArenaNode, NodeError};
use std::{borrow::Cow, rc::Rc};
use thiserror::Error;
use tracing::{instrument, trace};

mod markup;
mod selector;

pub use indextree::NodeId;

/// Properties every [`MemoryDom`] element exposes.
pub const BUILTIN_PROPERTIES: [&str; 9] = ["id", "className", "title", "hidden", "value", "checked", "disabled", "selected", "textContent"];

#[derive(Debug, Error)]
pub enum MemoryDomError {
	#[error("node is not a child of the given parent")]
	NotAChild,

	#[error("node is not an element")]
	NotAnElement,

	#[error("no such listener is attached")]
	UnknownListener,

	#[error("invalid tree mutation: {0}")]
	Tree(#[from] NodeError),
}

/// What a listener receives from [`MemoryDom::dispatch_event`].
#[derive(Debug, Clone)]
pub struct MemoryEvent {
	pub name: String,
	pub target: NodeId,
	/// The node whose listener is currently running. Differs from `target` while bubbling.
	pub current_target: NodeId,
}

#[derive(Debug)]
pub struct MemoryListenerHandle(u64);

/// Behaviour of a custom element, registered with [`MemoryDom::define_element`].
///
/// Assigning one of its [`properties`](`ElementDefinition::property`) renders the element,
/// which bumps its [`render_count`](`MemoryDom::render_count`) and runs the render hook.
#[derive(Clone, Default)]
pub struct ElementDefinition {
	properties: Vec<Cow<'static, str>>,
	suspends_rendering: bool,
	on_render: Option<Rc<dyn Fn(&MemoryDom, NodeId)>>,
}

impl ElementDefinition {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn property(mut self, name: impl Into<Cow<'static, str>>) -> Self {
		self.properties.push(name.into());
		self
	}

	/// Lets the element defer rendering while it is suspended, rendering at most once on resume.
	#[must_use]
	pub fn suspends_rendering(mut self) -> Self {
		self.suspends_rendering = true;
		self
	}

	#[must_use]
	pub fn on_render(mut self, on_render: impl 'static + Fn(&MemoryDom, NodeId)) -> Self {
		self.on_render = Some(Rc::new(on_render));
		self
	}

	fn has_property(&self, name: &str) -> bool {
		self.properties.iter().any(|property| property == name)
	}
}

impl Debug for ElementDefinition {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ElementDefinition")
			.field("properties", &self.properties)
			.field("suspends_rendering", &self.suspends_rendering)
			.field("on_render", &self.on_render.is_some())
			.finish()
	}
}

enum Data {
	Document,
	Fragment,
	Text(String),
	/// Only ever parsed from markup.
	Comment(String),
	Element(ElementData),
}

struct ElementData {
	tag: String,
	namespace: String,
	attributes: Vec<(String, String)>,
	properties: HashMap<String, PropValue<MemoryDom>>,
	listeners: Vec<(String, u64, Listener<MemoryEvent>)>,
	definition: Option<Rc<ElementDefinition>>,
	suspended: bool,
	dirty: bool,
	render_count: usize,
}

impl ElementData {
	fn new(tag: String, namespace: String, definition: Option<Rc<ElementDefinition>>) -> Self {
		Self {
			tag,
			namespace,
			attributes: Vec::new(),
			properties: HashMap::new(),
			listeners: Vec::new(),
			definition,
			suspended: false,
			dirty: false,
			render_count: 0,
		}
	}

	fn qualified_name(&self) -> QualName {
		QualName::new(None, Namespace::from(self.namespace.as_str()), LocalName::from(self.tag.as_str()))
	}

	fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
	}

	fn set_attribute(&mut self, name: &str, value: String) {
		match self.attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, slot)) => *slot = value,
			None => self.attributes.push((name.to_owned(), value)),
		}
	}

	fn remove_attribute(&mut self, name: &str) {
		self.attributes.retain(|(n, _)| n != name);
	}
}

struct Inner {
	arena: RefCell<Arena<Data>>,
	document: NodeId,
	body: NodeId,
	definitions: RefCell<HashMap<String, Rc<ElementDefinition>>>,
	next_listener: Cell<u64>,
}

/// A shared handle to an in-memory document. Clones refer to the same document.
#[derive(Clone)]
pub struct MemoryDom(Rc<Inner>);

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl Debug for MemoryDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryDom")
			.field("nodes", &self.0.arena.borrow().count())
			.field("definitions", &self.0.definitions.borrow().len())
			.finish()
	}
}

impl MemoryDom {
	/// Creates a document containing an empty `<html><body></body></html>` skeleton.
	#[must_use]
	pub fn new() -> Self {
		let mut arena = Arena::new();
		let document = arena.new_node(Data::Document);
		let html = arena.new_node(Data::Element(ElementData::new("html".to_owned(), HTML_NAMESPACE.to_owned(), None)));
		let body = arena.new_node(Data::Element(ElementData::new("body".to_owned(), HTML_NAMESPACE.to_owned(), None)));
		document.append(html, &mut arena);
		html.append(body, &mut arena);
		Self(Rc::new(Inner {
			arena: RefCell::new(arena),
			document,
			body,
			definitions: RefCell::new(HashMap::new()),
			next_listener: Cell::new(0),
		}))
	}

	#[must_use]
	pub fn document(&self) -> NodeId {
		self.0.document
	}

	#[must_use]
	pub fn body(&self) -> NodeId {
		self.0.body
	}

	/// Registers a custom element. Applies to elements created afterwards whose tag or `is` value is `name`.
	///
	/// Returns `false` without changing anything if `name` is already defined.
	pub fn define_element(&self, name: impl Into<String>, definition: ElementDefinition) -> bool {
		let name = name.into();
		let mut definitions = self.0.definitions.borrow_mut();
		if definitions.contains_key(&name) {
			return false;
		}
		trace!(name = name.as_str(), "Defining custom element.");
		definitions.insert(name, Rc::new(definition));
		true
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.0.arena.borrow().get(node).and_then(ArenaNode::parent)
	}

	/// Whether `node` is (still) part of the document.
	#[must_use]
	pub fn is_connected(&self, node: NodeId) -> bool {
		self.root(node) == self.0.document
	}

	/// The topmost ancestor of `node`, or `node` itself if it's detached or was freed.
	fn root(&self, node: NodeId) -> NodeId {
		let arena = self.0.arena.borrow();
		if node.is_removed(&arena) {
			return node;
		}
		let root = node.ancestors(&*arena).last().unwrap_or(node);
		root
	}

	#[must_use]
	pub fn get_attribute(&self, element: NodeId, name: &str) -> Option<String> {
		self.with_element(element, |data| data.attribute(name).map(str::to_owned)).flatten()
	}

	/// The value last assigned to a stored (not attribute-reflecting) property.
	#[must_use]
	pub fn property(&self, element: NodeId, name: &str) -> Option<PropValue<MemoryDom>> {
		self.with_element(element, |data| data.properties.get(name).cloned()).flatten()
	}

	#[must_use]
	pub fn listener_count(&self, element: NodeId) -> usize {
		self.with_element(element, |data| data.listeners.len()).unwrap_or(0)
	}

	/// How often a custom element has rendered.
	#[must_use]
	pub fn render_count(&self, element: NodeId) -> usize {
		self.with_element(element, |data| data.render_count).unwrap_or(0)
	}

	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		markup::to_html(&self.0.arena.borrow(), node, false)
	}

	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		markup::to_html(&self.0.arena.borrow(), node, true)
	}

	#[must_use]
	pub fn text_content(&self, node: NodeId) -> String {
		let arena = self.0.arena.borrow();
		if node.is_removed(&arena) {
			return String::new();
		}
		let text: String = node
			.descendants(&*arena)
			.filter_map(|descendant| match arena.get(descendant).map(ArenaNode::get) {
				Some(Data::Text(text)) => Some(text.as_str()),
				_ => None,
			})
			.collect();
		text
	}

	/// Runs the `name` listeners of `target` and then those of its ancestors.
	///
	/// Returns how many listeners ran.
	#[instrument(skip(self))]
	pub fn dispatch_event(&self, target: NodeId, name: &str) -> usize {
		let path: Vec<(NodeId, Listener<MemoryEvent>)> = {
			let arena = self.0.arena.borrow();
			if target.is_removed(&arena) {
				return 0;
			}
			let path: Vec<_> = target
				.ancestors(&*arena)
				.flat_map(|node| {
					let listeners: Vec<Listener<MemoryEvent>> = match arena.get(node).map(ArenaNode::get) {
						Some(Data::Element(data)) => data.listeners.iter().filter(|(event, _, _)| event == name).map(|(_, _, listener)| listener.clone()).collect(),
						_ => Vec::new(),
					};
					listeners.into_iter().map(move |listener| (node, listener))
				})
				.collect();
			path
		};

		for (current_target, listener) in &path {
			listener.call(&MemoryEvent {
				name: name.to_owned(),
				target,
				current_target: *current_target,
			});
		}
		trace!("Ran {} listener(s).", path.len());
		path.len()
	}

	fn with_element<R>(&self, element: NodeId, f: impl FnOnce(&ElementData) -> R) -> Option<R> {
		match self.0.arena.borrow().get(element).map(ArenaNode::get) {
			Some(Data::Element(data)) => Some(f(data)),
			_ => None,
		}
	}

	fn with_element_mut<R>(&self, element: NodeId, f: impl FnOnce(&mut ElementData) -> R) -> Result<R, MemoryDomError> {
		match self.0.arena.borrow_mut().get_mut(element).map(ArenaNode::get_mut) {
			Some(Data::Element(data)) => Ok(f(data)),
			_ => Err(MemoryDomError::NotAnElement),
		}
	}

	/// Renders `element` now, or once it resumes if it is suspended.
	fn property_changed(&self, element: NodeId) -> Result<(), MemoryDomError> {
		let render_now = self.with_element_mut(element, |data| {
			if data.suspended {
				data.dirty = true;
				false
			} else {
				true
			}
		})?;
		if render_now {
			self.render(element);
		}
		Ok(())
	}

	fn render(&self, element: NodeId) {
		let hook = self
			.with_element_mut(element, |data| {
				data.render_count += 1;
				data.dirty = false;
				data.definition.as_ref().and_then(|definition| definition.on_render.clone())
			})
			.ok()
			.flatten();
		trace!(?element, "Rendering custom element.");
		if let Some(hook) = hook {
			hook(self, element);
		}
	}

	fn is_defined_property(&self, element: NodeId, name: &str) -> bool {
		self.with_element(element, |data| data.definition.as_ref().map_or(false, |definition| definition.has_property(name)))
			.unwrap_or(false)
	}

	fn element_data(&self, tag: &str, namespace: &str, is: Option<&str>) -> ElementData {
		let tag = if namespace == HTML_NAMESPACE { tag.to_ascii_lowercase() } else { tag.to_owned() };
		let definition = {
			let definitions = self.0.definitions.borrow();
			is.and_then(|is| definitions.get(is)).or_else(|| definitions.get(&tag)).cloned()
		};
		ElementData::new(tag, namespace.to_owned(), definition)
	}

	fn replace_children_with_text(&self, element: NodeId, text: &str) -> Result<(), MemoryDomError> {
		let mut arena = self.0.arena.borrow_mut();
		if !matches!(arena.get(element).map(ArenaNode::get), Some(Data::Element(_))) {
			return Err(MemoryDomError::NotAnElement);
		}
		free_children(&mut arena, element);
		if !text.is_empty() {
			let text = arena.new_node(Data::Text(text.to_owned()));
			element.checked_append(text, &mut *arena)?;
		}
		Ok(())
	}
}

impl Dom for MemoryDom {
	type Node = NodeId;
	type Event = MemoryEvent;
	type ListenerHandle = MemoryListenerHandle;
	type Error = MemoryDomError;

	fn create_text(&self, text: &str) -> Result<NodeId, MemoryDomError> {
		Ok(self.0.arena.borrow_mut().new_node(Data::Text(text.to_owned())))
	}

	fn create_fragment(&self) -> Result<NodeId, MemoryDomError> {
		Ok(self.0.arena.borrow_mut().new_node(Data::Fragment))
	}

	fn create_element(&self, tag: &str, namespace: Option<&str>, is: Option<&str>) -> Result<NodeId, MemoryDomError> {
		let data = self.element_data(tag, namespace.unwrap_or(HTML_NAMESPACE), is);
		Ok(self.0.arena.borrow_mut().new_node(Data::Element(data)))
	}

	fn kind(&self, node: &NodeId) -> NodeKind {
		match self.0.arena.borrow().get(*node).map(ArenaNode::get) {
			Some(Data::Element(_)) => NodeKind::Element,
			Some(Data::Text(_)) => NodeKind::Text,
			Some(Data::Fragment) => NodeKind::Fragment,
			Some(Data::Document | Data::Comment(_)) | None => NodeKind::Other,
		}
	}

	fn tag_name(&self, node: &NodeId) -> Option<String> {
		self.with_element(*node, |data| data.tag.clone())
	}

	fn namespace(&self, node: &NodeId) -> Option<String> {
		self.with_element(*node, |data| data.namespace.clone())
	}

	fn text(&self, node: &NodeId) -> Option<String> {
		match self.0.arena.borrow().get(*node).map(ArenaNode::get) {
			Some(Data::Text(text)) => Some(text.clone()),
			_ => None,
		}
	}

	fn child_nodes(&self, parent: &NodeId) -> Vec<NodeId> {
		let arena = self.0.arena.borrow();
		if parent.is_removed(&arena) {
			return Vec::new();
		}
		let children = parent.children(&*arena).collect();
		children
	}

	fn child_at(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
		self.child_nodes(parent).get(index).copied()
	}

	fn child_count(&self, parent: &NodeId) -> usize {
		self.child_nodes(parent).len()
	}

	fn root_node(&self, node: &NodeId) -> NodeId {
		self.root(*node)
	}

	fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) -> Result<(), MemoryDomError> {
		let mut arena = self.0.arena.borrow_mut();
		insert(&mut arena, *parent, *child, reference.copied())
	}

	fn remove_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryDomError> {
		let mut arena = self.0.arena.borrow_mut();
		if arena.get(*child).and_then(ArenaNode::parent) != Some(*parent) {
			return Err(MemoryDomError::NotAChild);
		}
		child.detach(&mut *arena);
		Ok(())
	}

	fn replace_child(&self, parent: &NodeId, new_child: &NodeId, old_child: &NodeId) -> Result<(), MemoryDomError> {
		if new_child == old_child {
			return Ok(());
		}
		let mut arena = self.0.arena.borrow_mut();
		insert(&mut arena, *parent, *new_child, Some(*old_child))?;
		old_child.detach(&mut *arena);
		Ok(())
	}

	fn attributes(&self, element: &NodeId) -> Vec<(String, String)> {
		self.with_element(*element, |data| data.attributes.clone()).unwrap_or_default()
	}

	fn set_attribute(&self, element: &NodeId, name: &str, value: &str) -> Result<(), MemoryDomError> {
		self.with_element_mut(*element, |data| data.set_attribute(name, value.to_owned()))
	}

	fn remove_attribute(&self, element: &NodeId, name: &str) -> Result<(), MemoryDomError> {
		self.with_element_mut(*element, |data| data.remove_attribute(name))
	}

	fn has_property(&self, element: &NodeId, name: &str) -> bool {
		BUILTIN_PROPERTIES.contains(&name) || self.is_defined_property(*element, name)
	}

	fn set_property(&self, element: &NodeId, name: &str, value: &PropValue<Self>) -> Result<(), MemoryDomError> {
		match name {
			"id" | "title" => self.with_element_mut(*element, |data| data.set_attribute(name, coerce_string(value))),
			"className" => self.with_element_mut(*element, |data| data.set_attribute("class", coerce_string(value))),
			"hidden" | "disabled" => self.with_element_mut(*element, |data| {
				if is_truthy(value) {
					data.set_attribute(name, String::new());
				} else {
					data.remove_attribute(name);
				}
			}),
			"textContent" => self.replace_children_with_text(*element, &coerce_string(value)),
			_ => {
				self.with_element_mut(*element, |data| data.properties.insert(name.to_owned(), value.clone()))?;
				if self.is_defined_property(*element, name) {
					self.property_changed(*element)?;
				}
				Ok(())
			}
		}
	}

	fn clear_property(&self, element: &NodeId, name: &str) -> Result<(), MemoryDomError> {
		match name {
			"id" | "title" | "hidden" | "disabled" => self.with_element_mut(*element, |data| data.remove_attribute(name)),
			"className" => self.with_element_mut(*element, |data| data.remove_attribute("class")),
			"textContent" => self.replace_children_with_text(*element, ""),
			_ => {
				let removed = self.with_element_mut(*element, |data| data.properties.remove(name))?;
				if removed.is_some() && self.is_defined_property(*element, name) {
					self.property_changed(*element)?;
				}
				Ok(())
			}
		}
	}

	fn add_event_listener(&self, element: &NodeId, event: &str, listener: &Listener<MemoryEvent>) -> Result<MemoryListenerHandle, MemoryDomError> {
		let id = self.0.next_listener.get();
		self.with_element_mut(*element, |data| data.listeners.push((event.to_owned(), id, listener.clone())))?;
		self.0.next_listener.set(id + 1);
		Ok(MemoryListenerHandle(id))
	}

	fn remove_event_listener(&self, element: &NodeId, event: &str, handle: MemoryListenerHandle) -> Result<(), MemoryDomError> {
		self.with_element_mut(*element, |data| {
			let position = data.listeners.iter().position(|(name, id, _)| name == event && *id == handle.0);
			position.map(|position| data.listeners.remove(position))
		})?
		.map(drop)
		.ok_or(MemoryDomError::UnknownListener)
	}

	fn set_inner_html(&self, element: &NodeId, html: &str) -> Result<(), MemoryDomError> {
		if self.kind(element) != NodeKind::Element {
			return Err(MemoryDomError::NotAnElement);
		}
		let parsed = markup::parse(html);
		let create = |name: &QualName, attributes: Vec<(String, String)>| {
			let is = attributes.iter().find(|(attribute, _)| attribute == "is").map(|(_, is)| is.as_str());
			let mut data = self.element_data(&name.local, &name.ns, is);
			data.attributes = attributes;
			data
		};

		let mut arena = self.0.arena.borrow_mut();
		free_children(&mut arena, *element);
		markup::append_parsed(&mut arena, *element, &parsed, &create)?;
		Ok(())
	}

	fn query_selector(&self, selector: &str) -> Option<NodeId> {
		let list = selector::parse(selector)?;
		let arena = self.0.arena.borrow();
		selector::first_match(&arena, self.0.document, &list)
	}

	/// Frees `node` and everything below it, unless something attached it again.
	fn release(&self, node: &NodeId) {
		let mut arena = self.0.arena.borrow_mut();
		if arena.get(*node).map_or(false, |node| node.parent().is_none()) {
			trace!(?node, "Freeing released subtree.");
			node.remove_subtree(&mut arena);
		}
	}

	fn suspend_rendering(&self, element: &NodeId) -> bool {
		self.with_element_mut(*element, |data| {
			let supported = data.definition.as_ref().map_or(false, |definition| definition.suspends_rendering);
			if supported {
				data.suspended = true;
			}
			supported
		})
		.unwrap_or(false)
	}

	fn resume_rendering(&self, element: &NodeId) {
		let dirty = self
			.with_element_mut(*element, |data| {
				data.suspended = false;
				data.dirty
			})
			.unwrap_or(false);
		if dirty {
			self.render(*element);
		}
	}
}

/// Inserts `child` before `reference` (or appends it), splicing the children of fragments.
fn insert(arena: &mut Arena<Data>, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), MemoryDomError> {
	if reference == Some(child) {
		return Ok(());
	}
	if let Some(reference) = reference {
		if arena.get(reference).and_then(ArenaNode::parent) != Some(parent) {
			return Err(MemoryDomError::NotAChild);
		}
	}

	let moved: Vec<NodeId> = match arena.get(child).map(ArenaNode::get) {
		Some(Data::Fragment) => child.children(arena).collect(),
		_ => vec![child],
	};
	for node in moved {
		match reference {
			Some(reference) => reference.checked_insert_before(node, arena)?,
			None => parent.checked_append(node, arena)?,
		}
	}
	Ok(())
}

fn coerce_string(value: &PropValue<MemoryDom>) -> String {
	match value {
		PropValue::String(string) => string.clone(),
		PropValue::Number(number) => Primitive::Number(*number).to_string(),
		PropValue::Boolean(boolean) => boolean.to_string(),
		PropValue::Callback(_) | PropValue::Object(_) => "[object]".to_owned(),
	}
}

fn is_truthy(value: &PropValue<MemoryDom>) -> bool {
	match value {
		PropValue::String(string) => !string.is_empty(),
		PropValue::Number(number) => *number != 0.0 && !number.is_nan(),
		PropValue::Boolean(boolean) => *boolean,
		PropValue::Callback(_) | PropValue::Object(_) => true,
	}
}

/// Frees every child of `parent` along with its subtree.
fn free_children(arena: &mut Arena<Data>, parent: NodeId) {
	let children: Vec<_> = parent.children(arena).collect();
	for child in children {
		child.remove_subtree(arena);
	}
}
