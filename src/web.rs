//! The browser DOM, through [`web_sys`].

use crate::{
	dom::{Dom, NodeKind},
	vdom::{Listener, PropValue},
};
use core::{
	cell::Cell,
	convert::TryFrom,
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
};
use std::borrow::Cow;
use js_sys::{Function, Reflect};
use thiserror::Error;
use tracing::{error, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, Event};

/// Hidden property each node handed to the reconciler is stamped with.
const ID_PROPERTY: &str = "__reconcileDomId";

/// Elements opt into rendering suspension by exposing these as methods, unless [`WebDom::with_suspension_methods`] names others.
pub const SUSPEND_RENDERING_METHOD: &str = "suspendRendering";
pub const RESUME_RENDERING_METHOD: &str = "resumeRendering";

/// Ids are stored as JavaScript numbers, which are exact up to here.
const MAX_SAFE_ID: u64 = (1 << 53) - 1;

thread_local! {
	static NEXT_ID: Cell<u64> = Cell::new(0);
}

#[derive(Debug, Error)]
pub enum WebDomError {
	#[error("JavaScript exception: {0:?}")]
	Js(JsValue),

	#[error("node is not an element")]
	NotAnElement,

	#[error("property value has no JavaScript representation")]
	UnsupportedValue,
}

impl From<JsValue> for WebDomError {
	fn from(value: JsValue) -> Self {
		Self::Js(value)
	}
}

/// A [`web_sys::Node`] with a stable identity for hashing.
///
/// Two `WebNode`s wrapping the same DOM node compare equal.
#[derive(Clone)]
pub struct WebNode {
	id: u64,
	node: web_sys::Node,
}

impl WebNode {
	#[must_use]
	pub fn new(node: web_sys::Node) -> Self {
		Self { id: identify(&node), node }
	}

	#[must_use]
	pub fn as_node(&self) -> &web_sys::Node {
		&self.node
	}

	#[must_use]
	pub fn into_node(self) -> web_sys::Node {
		self.node
	}

	fn as_element(&self) -> Result<&Element, WebDomError> {
		self.node.dyn_ref::<Element>().ok_or(WebDomError::NotAnElement)
	}
}

impl From<web_sys::Node> for WebNode {
	fn from(node: web_sys::Node) -> Self {
		Self::new(node)
	}
}

impl PartialEq for WebNode {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for WebNode {}

impl Hash for WebNode {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state)
	}
}

impl Debug for WebNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "WebNode({}, {})", self.id, self.node.node_name())
	}
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn identify(node: &web_sys::Node) -> u64 {
	let key = JsValue::from_str(ID_PROPERTY);
	if let Some(id) = Reflect::get(node, &key).ok().and_then(|id| id.as_f64()) {
		return id as u64;
	}

	let id = NEXT_ID.with(|next| {
		let id = next.get();
		if id == MAX_SAFE_ID {
			error!("Node ids exhausted. Identities are no longer unique.");
		}
		next.set((id + 1).min(MAX_SAFE_ID));
		id
	});
	if Reflect::set(node, &key, &JsValue::from_f64(id as f64)).is_err() {
		warn!("Failed to stamp node identity. It will be treated as new on each access.");
	}
	id
}

/// Owns the [`Closure`] forwarding to a [`Listener`]. Dropping it while the listener is still attached makes that listener throw.
pub struct WebListenerHandle(Closure<dyn Fn(Event)>);

impl Debug for WebListenerHandle {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("WebListenerHandle").finish()
	}
}

/// The document the reconciler creates nodes in.
#[derive(Debug, Clone)]
pub struct WebDom {
	document: Document,
	suspend_method: Cow<'static, str>,
	resume_method: Cow<'static, str>,
}

impl WebDom {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			suspend_method: Cow::Borrowed(SUSPEND_RENDERING_METHOD),
			resume_method: Cow::Borrowed(RESUME_RENDERING_METHOD),
		}
	}

	/// Looks for rendering suspension under other method names, for elements written against a different protocol.
	#[must_use]
	pub fn with_suspension_methods(mut self, suspend: impl Into<Cow<'static, str>>, resume: impl Into<Cow<'static, str>>) -> Self {
		self.suspend_method = suspend.into();
		self.resume_method = resume.into();
		self
	}

	/// The current window's document, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		web_sys::window()?.document().map(Self::new)
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	fn call_method(&self, element: &WebNode, name: &str) -> bool {
		let method = match Reflect::get(element.as_node(), &JsValue::from_str(name)) {
			Ok(method) => method,
			Err(_) => return false,
		};
		match method.dyn_ref::<Function>() {
			Some(method) => match method.call0(element.as_node()) {
				Ok(_) => true,
				Err(error) => {
					warn!("{} threw: {:?}", name, error);
					true
				}
			},
			None => false,
		}
	}
}

impl Dom for WebDom {
	type Node = WebNode;
	type Event = Event;
	type ListenerHandle = WebListenerHandle;
	type Error = WebDomError;

	fn create_text(&self, text: &str) -> Result<WebNode, WebDomError> {
		Ok(WebNode::new(self.document.create_text_node(text).into()))
	}

	fn create_fragment(&self) -> Result<WebNode, WebDomError> {
		Ok(WebNode::new(self.document.create_document_fragment().into()))
	}

	fn create_element(&self, tag: &str, namespace: Option<&str>, is: Option<&str>) -> Result<WebNode, WebDomError> {
		let element = match (namespace, is) {
			(None, None) => self.document.create_element(tag),
			// This isn't entirely modern, but is well-supported.
			(None, Some(is)) => self.document.create_element_with_str(tag, is),
			(Some(namespace), None) => self.document.create_element_ns(Some(namespace), tag),
			(Some(namespace), Some(is)) => self.document.create_element_ns_with_str(Some(namespace), tag, is),
		}?;
		Ok(WebNode::new(element.into()))
	}

	fn kind(&self, node: &WebNode) -> NodeKind {
		match node.as_node().node_type() {
			web_sys::Node::ELEMENT_NODE => NodeKind::Element,
			web_sys::Node::TEXT_NODE => NodeKind::Text,
			web_sys::Node::DOCUMENT_FRAGMENT_NODE => NodeKind::Fragment,
			_ => NodeKind::Other,
		}
	}

	fn tag_name(&self, node: &WebNode) -> Option<String> {
		node.as_node().dyn_ref::<Element>().map(Element::tag_name)
	}

	fn namespace(&self, node: &WebNode) -> Option<String> {
		node.as_node().dyn_ref::<Element>().and_then(Element::namespace_uri)
	}

	fn text(&self, node: &WebNode) -> Option<String> {
		if node.as_node().node_type() == web_sys::Node::TEXT_NODE {
			node.as_node().node_value()
		} else {
			None
		}
	}

	fn child_nodes(&self, parent: &WebNode) -> Vec<WebNode> {
		let child_nodes = parent.as_node().child_nodes();
		(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).map(WebNode::new).collect()
	}

	fn child_at(&self, parent: &WebNode, index: usize) -> Option<WebNode> {
		let index = u32::try_from(index).ok()?;
		parent.as_node().child_nodes().item(index).map(WebNode::new)
	}

	fn child_count(&self, parent: &WebNode) -> usize {
		parent.as_node().child_nodes().length() as usize
	}

	fn root_node(&self, node: &WebNode) -> WebNode {
		WebNode::new(node.as_node().get_root_node())
	}

	fn insert_before(&self, parent: &WebNode, child: &WebNode, reference: Option<&WebNode>) -> Result<(), WebDomError> {
		parent.as_node().insert_before(child.as_node(), reference.map(WebNode::as_node))?;
		Ok(())
	}

	fn remove_child(&self, parent: &WebNode, child: &WebNode) -> Result<(), WebDomError> {
		parent.as_node().remove_child(child.as_node())?;
		Ok(())
	}

	fn replace_child(&self, parent: &WebNode, new_child: &WebNode, old_child: &WebNode) -> Result<(), WebDomError> {
		parent.as_node().replace_child(new_child.as_node(), old_child.as_node())?;
		Ok(())
	}

	fn attributes(&self, element: &WebNode) -> Vec<(String, String)> {
		let attributes = match element.as_element() {
			Ok(element) => element.attributes(),
			Err(_) => return Vec::new(),
		};
		(0..attributes.length())
			.filter_map(|i| attributes.item(i))
			.map(|attribute| (attribute.name(), attribute.value()))
			.collect()
	}

	fn set_attribute(&self, element: &WebNode, name: &str, value: &str) -> Result<(), WebDomError> {
		element.as_element()?.set_attribute(name, value)?;
		Ok(())
	}

	fn remove_attribute(&self, element: &WebNode, name: &str) -> Result<(), WebDomError> {
		element.as_element()?.remove_attribute(name)?;
		Ok(())
	}

	fn has_property(&self, element: &WebNode, name: &str) -> bool {
		Reflect::has(element.as_node(), &JsValue::from_str(name)).unwrap_or(false)
	}

	fn set_property(&self, element: &WebNode, name: &str, value: &PropValue<Self>) -> Result<(), WebDomError> {
		let value = match value {
			PropValue::String(string) => JsValue::from_str(string),
			PropValue::Number(number) => JsValue::from_f64(*number),
			PropValue::Boolean(boolean) => JsValue::from_bool(*boolean),
			PropValue::Callback(listener) => {
				let listener = listener.clone();
				Closure::wrap(Box::new(move |event: Event| listener.call(&event)) as Box<dyn Fn(Event)>).into_js_value()
			}
			PropValue::Object(object) => object.downcast_ref::<JsValue>().cloned().ok_or(WebDomError::UnsupportedValue)?,
		};
		Reflect::set(element.as_node(), &JsValue::from_str(name), &value)?;
		Ok(())
	}

	/// Strings reset to `""`, booleans to `false` and anything else to `undefined`.
	fn clear_property(&self, element: &WebNode, name: &str) -> Result<(), WebDomError> {
		let key = JsValue::from_str(name);
		let current = Reflect::get(element.as_node(), &key)?;
		let unset = if current.is_string() {
			JsValue::from_str("")
		} else if current.as_bool().is_some() {
			JsValue::FALSE
		} else {
			JsValue::UNDEFINED
		};
		Reflect::set(element.as_node(), &key, &unset)?;
		Ok(())
	}

	fn add_event_listener(&self, element: &WebNode, event: &str, listener: &Listener<Event>) -> Result<WebListenerHandle, WebDomError> {
		let listener = listener.clone();
		let closure = Closure::wrap(Box::new(move |event: Event| listener.call(&event)) as Box<dyn Fn(Event)>);
		element
			.as_node()
			.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>())?;
		Ok(WebListenerHandle(closure))
	}

	fn remove_event_listener(&self, element: &WebNode, event: &str, handle: WebListenerHandle) -> Result<(), WebDomError> {
		element
			.as_node()
			.remove_event_listener_with_callback(event, handle.0.as_ref().unchecked_ref::<Function>())?;
		Ok(())
	}

	fn set_inner_html(&self, element: &WebNode, html: &str) -> Result<(), WebDomError> {
		element.as_element()?.set_inner_html(html);
		Ok(())
	}

	fn query_selector(&self, selector: &str) -> Option<WebNode> {
		match self.document.query_selector(selector) {
			Ok(found) => found.map(|element| WebNode::new(element.into())),
			Err(error) => {
				warn!("Invalid selector: {:?}", error);
				None
			}
		}
	}

	fn suspend_rendering(&self, element: &WebNode) -> bool {
		let supported = self.call_method(element, &self.suspend_method);
		if supported {
			trace!("Suspended rendering.");
		}
		supported
	}

	fn resume_rendering(&self, element: &WebNode) {
		if !self.call_method(element, &self.resume_method) {
			warn!("Element stopped supporting rendering suspension.");
		}
	}
}
