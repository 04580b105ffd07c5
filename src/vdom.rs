//! Virtual nodes: immutable descriptions of the desired DOM shape.
//!
//! These are plain data. The [`Reconciler`](`crate::Reconciler`) consumes them by reference
//! and never mutates them, so a tree can be rendered any number of times.

use crate::dom::Dom;
use core::{
	any::Any,
	fmt::{self, Debug, Display, Formatter},
};
use std::{borrow::Cow, cell::RefCell, rc::Rc};

/// A virtual node: text, an element descriptor or a fragment.
pub enum VNode<D: Dom> {
	/// Rendered as a text node containing the string coercion of the value.
	Primitive(Primitive),
	Element(Element<D>),
	/// Has no DOM representation of its own. Its children are spliced into the parent's child list.
	Fragment(Vec<VNode<D>>),
}

impl<D: Dom> VNode<D> {
	pub fn text(text: impl Into<Primitive>) -> Self {
		Self::Primitive(text.into())
	}

	pub fn element(tag: impl Into<Cow<'static, str>>) -> Element<D> {
		Element::new(tag)
	}

	pub fn fragment(children: impl IntoIterator<Item = VNode<D>>) -> Self {
		Self::Fragment(children.into_iter().collect())
	}

	/// The key this node is matched by across reconciliation passes, if any.
	///
	/// Only element descriptors can carry a key.
	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		match self {
			VNode::Element(element) => element.key.as_ref(),
			VNode::Primitive(_) | VNode::Fragment(_) => None,
		}
	}
}

impl<D: Dom> Clone for VNode<D> {
	fn clone(&self) -> Self {
		match self {
			VNode::Primitive(primitive) => VNode::Primitive(primitive.clone()),
			VNode::Element(element) => VNode::Element(element.clone()),
			VNode::Fragment(children) => VNode::Fragment(children.clone()),
		}
	}
}

impl<D: Dom> Debug for VNode<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			VNode::Primitive(primitive) => f.debug_tuple("Primitive").field(primitive).finish(),
			VNode::Element(element) => element.fmt(f),
			VNode::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
		}
	}
}

impl<D: Dom> From<Element<D>> for VNode<D> {
	fn from(element: Element<D>) -> Self {
		Self::Element(element)
	}
}

impl<D: Dom> From<Primitive> for VNode<D> {
	fn from(primitive: Primitive) -> Self {
		Self::Primitive(primitive)
	}
}

impl<D: Dom> From<&'static str> for VNode<D> {
	fn from(text: &'static str) -> Self {
		Self::Primitive(text.into())
	}
}

impl<D: Dom> From<String> for VNode<D> {
	fn from(text: String) -> Self {
		Self::Primitive(text.into())
	}
}

/// A single forest root or a sequence of them, normalised to a sequence by the reconciler.
pub enum Forest<'a, D: Dom> {
	Single(&'a VNode<D>),
	Many(&'a [VNode<D>]),
}

impl<'a, D: Dom> Forest<'a, D> {
	#[must_use]
	pub fn as_slice(&self) -> &'a [VNode<D>] {
		match *self {
			Forest::Single(node) => core::slice::from_ref(node),
			Forest::Many(nodes) => nodes,
		}
	}
}

impl<'a, D: Dom> From<&'a VNode<D>> for Forest<'a, D> {
	fn from(node: &'a VNode<D>) -> Self {
		Self::Single(node)
	}
}

impl<'a, D: Dom> From<&'a [VNode<D>]> for Forest<'a, D> {
	fn from(nodes: &'a [VNode<D>]) -> Self {
		Self::Many(nodes)
	}
}

impl<'a, D: Dom> From<&'a Vec<VNode<D>>> for Forest<'a, D> {
	fn from(nodes: &'a Vec<VNode<D>>) -> Self {
		Self::Many(nodes)
	}
}

impl<'a, D: Dom, const N: usize> From<&'a [VNode<D>; N]> for Forest<'a, D> {
	fn from(nodes: &'a [VNode<D>; N]) -> Self {
		Self::Many(nodes)
	}
}

/// Text content. Equality is by string coercion, see [`Display`].
#[derive(Debug, Clone)]
pub enum Primitive {
	String(Cow<'static, str>),
	Number(f64),
	Boolean(bool),
}

impl Display for Primitive {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Primitive::String(string) => f.write_str(string),
			Primitive::Boolean(boolean) => Display::fmt(boolean, f),
			Primitive::Number(number) => fmt_number(*number, f),
		}
	}
}

impl PartialEq for Primitive {
	fn eq(&self, other: &Self) -> bool {
		self.to_string() == other.to_string()
	}
}

/// Script-style number formatting: `1` rather than `1.0`, `NaN`, `Infinity`.
fn fmt_number(number: f64, f: &mut Formatter<'_>) -> fmt::Result {
	if number.is_nan() {
		f.write_str("NaN")
	} else if number.is_infinite() {
		f.write_str(if number > 0.0 { "Infinity" } else { "-Infinity" })
	} else if number == 0.0 {
		// Covers `-0.0`.
		f.write_str("0")
	} else {
		Display::fmt(&number, f)
	}
}

impl From<&'static str> for Primitive {
	fn from(string: &'static str) -> Self {
		Self::String(Cow::Borrowed(string))
	}
}

impl From<String> for Primitive {
	fn from(string: String) -> Self {
		Self::String(Cow::Owned(string))
	}
}

impl From<f64> for Primitive {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl From<i32> for Primitive {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}

impl From<bool> for Primitive {
	fn from(boolean: bool) -> Self {
		Self::Boolean(boolean)
	}
}

/// Stable sibling identity across reconciliation passes.
///
/// `Key::String("1")` and `Key::Integer(1)` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	String(Rc<str>),
	Integer(i64),
}

impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Key::String(string) => f.write_str(string),
			Key::Integer(integer) => Display::fmt(integer, f),
		}
	}
}

impl From<&str> for Key {
	fn from(string: &str) -> Self {
		Self::String(string.into())
	}
}

impl From<String> for Key {
	fn from(string: String) -> Self {
		Self::String(string.into())
	}
}

impl From<i64> for Key {
	fn from(integer: i64) -> Self {
		Self::Integer(integer)
	}
}

impl From<i32> for Key {
	fn from(integer: i32) -> Self {
		Self::Integer(integer.into())
	}
}

impl From<u32> for Key {
	fn from(integer: u32) -> Self {
		Self::Integer(integer.into())
	}
}

/// An element descriptor.
///
/// The reserved keys of a property bag are fields here: [`key`](`Element::key`),
/// [`node_ref`](`Element::node_ref`), [`children`](`Element::children`) and
/// [`Props::inner_html`].
pub struct Element<D: Dom> {
	pub tag: Cow<'static, str>,
	pub props: Props<D>,
	pub key: Option<Key>,
	pub node_ref: Option<Ref<D::Node>>,
	/// [`None`] leaves the live element's children alone, which is what custom elements that render
	/// their own content need. `Some(vec![])` clears them.
	pub children: Option<Vec<VNode<D>>>,
}

impl<D: Dom> Element<D> {
	pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
		Self {
			tag: tag.into(),
			props: Props::new(),
			key: None,
			node_ref: None,
			children: None,
		}
	}

	/// Sets a string-valued prop. Such props become attributes unless the element has a settable property of that name.
	#[must_use]
	pub fn attr(self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
		self.prop(name, PropValue::String(value.into()))
	}

	#[must_use]
	pub fn prop(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue<D>>) -> Self {
		self.props.insert(name, value.into());
		self
	}

	/// Binds a new listener under `name`, which should carry the event prefix (`onclick`).
	#[must_use]
	pub fn on(self, name: impl Into<Cow<'static, str>>, listener: impl 'static + Fn(&D::Event)) -> Self {
		self.listener(name, Listener::new(listener))
	}

	/// Like [`on`](`Element::on`), but with an existing [`Listener`] so that its identity can be kept across renders.
	#[must_use]
	pub fn listener(self, name: impl Into<Cow<'static, str>>, listener: Listener<D::Event>) -> Self {
		self.prop(name, PropValue::Callback(listener))
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn with_ref(mut self, node_ref: impl Into<Ref<D::Node>>) -> Self {
		self.node_ref = Some(node_ref.into());
		self
	}

	/// Raw HTML content. While set, [`children`](`Element::children`) are neither materialized nor diffed.
	#[must_use]
	pub fn inner_html(mut self, html: impl Into<String>) -> Self {
		self.props.inner_html = Some(html.into());
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<VNode<D>>) -> Self {
		self.children.get_or_insert_with(Vec::new).push(child.into());
		self
	}

	/// Appends children, skipping `None`s.
	///
	/// This marks the child list as present even if nothing is appended, so an empty iterator clears the element.
	#[must_use]
	pub fn children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Option<VNode<D>>>,
	{
		self.children
			.get_or_insert_with(Vec::new)
			.extend(children.into_iter().filter_map(Into::into));
		self
	}

	#[must_use]
	pub fn build(self) -> VNode<D> {
		VNode::Element(self)
	}
}

impl<D: Dom> Clone for Element<D> {
	fn clone(&self) -> Self {
		Self {
			tag: self.tag.clone(),
			props: self.props.clone(),
			key: self.key.clone(),
			node_ref: self.node_ref.clone(),
			children: self.children.clone(),
		}
	}
}

impl<D: Dom> Debug for Element<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("tag", &self.tag)
			.field("props", &self.props)
			.field("key", &self.key)
			.field("node_ref", &self.node_ref.as_ref().map(|_| "Ref"))
			.field("children", &self.children)
			.finish()
	}
}

/// The attribute/property/listener part of a property bag, in insertion order.
pub struct Props<D: Dom> {
	entries: Vec<(Cow<'static, str>, PropValue<D>)>,
	/// Raw HTML escape hatch (`dangerouslySetInnerHTML`).
	pub inner_html: Option<String>,
}

impl<D: Dom> Props<D> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			entries: Vec::new(),
			inner_html: None,
		}
	}

	/// Inserts or overwrites `name`, keeping the original position on overwrite.
	pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: PropValue<D>) {
		let name = name.into();
		match self.entries.iter_mut().find(|(n, _)| *n == name) {
			Some((_, slot)) => *slot = value,
			None => self.entries.push((name, value)),
		}
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&PropValue<D>> {
		self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
	}

	/// The value of `name` if it is a string.
	#[must_use]
	pub fn get_str(&self, name: &str) -> Option<&str> {
		match self.get(name) {
			Some(PropValue::String(string)) => Some(string),
			_ => None,
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue<D>)> {
		self.entries.iter().map(|(n, v)| (n.as_ref(), v))
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty() && self.inner_html.is_none()
	}
}

impl<D: Dom> Default for Props<D> {
	fn default() -> Self {
		Self::new()
	}
}

impl<D: Dom> Clone for Props<D> {
	fn clone(&self) -> Self {
		Self {
			entries: self.entries.clone(),
			inner_html: self.inner_html.clone(),
		}
	}
}

impl<D: Dom> Debug for Props<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.entries.iter().map(|(n, v)| (n, v))).finish()?;
		if let Some(html) = &self.inner_html {
			write!(f, " + inner_html({} bytes)", html.len())?;
		}
		Ok(())
	}
}

/// A prop value. Callables and objects compare by reference.
pub enum PropValue<D: Dom> {
	String(String),
	Number(f64),
	Boolean(bool),
	Callback(Listener<D::Event>),
	/// Host-specific payload, for example a `JsValue` for the web backend.
	Object(Rc<dyn Any>),
}

impl<D: Dom> PropValue<D> {
	#[must_use]
	pub fn as_callback(&self) -> Option<&Listener<D::Event>> {
		match self {
			PropValue::Callback(listener) => Some(listener),
			_ => None,
		}
	}
}

impl<D: Dom> Clone for PropValue<D> {
	fn clone(&self) -> Self {
		match self {
			PropValue::String(string) => PropValue::String(string.clone()),
			PropValue::Number(number) => PropValue::Number(*number),
			PropValue::Boolean(boolean) => PropValue::Boolean(*boolean),
			PropValue::Callback(listener) => PropValue::Callback(listener.clone()),
			PropValue::Object(object) => PropValue::Object(object.clone()),
		}
	}
}

impl<D: Dom> PartialEq for PropValue<D> {
	#[allow(clippy::float_cmp)]
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(PropValue::String(a), PropValue::String(b)) => a == b,
			(PropValue::Number(a), PropValue::Number(b)) => a == b,
			(PropValue::Boolean(a), PropValue::Boolean(b)) => a == b,
			(PropValue::Callback(a), PropValue::Callback(b)) => a.ptr_eq(b),
			(PropValue::Object(a), PropValue::Object(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl<D: Dom> Debug for PropValue<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			PropValue::String(string) => Debug::fmt(string, f),
			PropValue::Number(number) => Debug::fmt(number, f),
			PropValue::Boolean(boolean) => Debug::fmt(boolean, f),
			PropValue::Callback(listener) => listener.fmt(f),
			PropValue::Object(object) => write!(f, "Object({:p})", Rc::as_ptr(object)),
		}
	}
}

impl<D: Dom> From<&str> for PropValue<D> {
	fn from(string: &str) -> Self {
		Self::String(string.to_owned())
	}
}

impl<D: Dom> From<String> for PropValue<D> {
	fn from(string: String) -> Self {
		Self::String(string)
	}
}

impl<D: Dom> From<f64> for PropValue<D> {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl<D: Dom> From<i32> for PropValue<D> {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}

impl<D: Dom> From<bool> for PropValue<D> {
	fn from(boolean: bool) -> Self {
		Self::Boolean(boolean)
	}
}

impl<D: Dom> From<Listener<D::Event>> for PropValue<D> {
	fn from(listener: Listener<D::Event>) -> Self {
		Self::Callback(listener)
	}
}

/// An event listener. Identity is the allocation, so cloning keeps it the "same" listener.
pub struct Listener<E>(Rc<dyn Fn(&E)>);

impl<E> Listener<E> {
	pub fn new(f: impl 'static + Fn(&E)) -> Self {
		Self(Rc::new(f))
	}

	pub fn call(&self, event: &E) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl<E> Clone for Listener<E> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<E> Debug for Listener<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Listener({:p})", Rc::as_ptr(&self.0) as *const ())
	}
}

impl<E, F: 'static + Fn(&E)> From<F> for Listener<E> {
	fn from(f: F) -> Self {
		Self::new(f)
	}
}

/// Receives the live node once it is materialized or matched, and [`None`] on release.
pub enum Ref<N> {
	Callback(Rc<dyn Fn(Option<&N>)>),
	Box(RefBox<N>),
}

impl<N> Ref<N> {
	pub fn callback(f: impl 'static + Fn(Option<&N>)) -> Self {
		Self::Callback(Rc::new(f))
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Ref::Callback(a), Ref::Callback(b)) => Rc::ptr_eq(a, b),
			(Ref::Box(a), Ref::Box(b)) => a.ptr_eq(b),
			_ => false,
		}
	}
}

impl<N> Clone for Ref<N> {
	fn clone(&self) -> Self {
		match self {
			Ref::Callback(callback) => Ref::Callback(callback.clone()),
			Ref::Box(ref_box) => Ref::Box(ref_box.clone()),
		}
	}
}

impl<N> From<RefBox<N>> for Ref<N> {
	fn from(ref_box: RefBox<N>) -> Self {
		Self::Box(ref_box)
	}
}

impl<N> From<&RefBox<N>> for Ref<N> {
	fn from(ref_box: &RefBox<N>) -> Self {
		Self::Box(ref_box.clone())
	}
}

/// A shared slot a [`Ref`] can point into. Clones share the slot.
pub struct RefBox<N>(Rc<RefCell<Option<N>>>);

impl<N> RefBox<N> {
	#[must_use]
	pub fn new() -> Self {
		Self(Rc::new(RefCell::new(None)))
	}

	#[must_use]
	pub fn current(&self) -> Option<N>
	where
		N: Clone,
	{
		self.0.borrow().clone()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_none()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	pub(crate) fn slot(&self) -> &RefCell<Option<N>> {
		&self.0
	}
}

impl<N> Default for RefBox<N> {
	fn default() -> Self {
		Self::new()
	}
}

impl<N> Clone for RefBox<N> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<N: Debug> Debug for RefBox<N> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("RefBox").field(&*self.0.borrow()).finish()
	}
}
