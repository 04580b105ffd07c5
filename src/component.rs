//! A thin render-function wrapper around a host element.
//!
//! The reconciler itself only performs single passes. [`Component`] owns a live element and
//! re-renders into it whenever it receives new props.

use crate::{
	diff::{Reconciler, Result},
	dom::Dom,
	error::Error,
	vdom::VNode,
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashSet;
use std::borrow::Cow;
use tracing::{instrument, trace};

/// Tracks which custom element names have been registered with the host,
/// so that each is defined at most once.
#[derive(Debug, Default)]
pub struct ElementRegistry {
	defined: HashSet<String>,
}

impl ElementRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks `name` as defined.
	///
	/// Returns `true` if it wasn't before, in which case the caller should register it with the host.
	pub fn define(&mut self, name: &str) -> bool {
		if self.defined.contains(name) {
			trace!(name, "Already defined.");
			false
		} else {
			self.defined.insert(name.to_owned());
			true
		}
	}

	#[must_use]
	pub fn is_defined(&self, name: &str) -> bool {
		self.defined.contains(name)
	}
}

/// A host element plus the function that renders its content.
pub struct Component<D: Dom, P> {
	name: Cow<'static, str>,
	element: D::Node,
	render: Box<dyn Fn(&P) -> Vec<VNode<D>>>,
	props: Option<P>,
}

impl<D: Dom, P> Component<D, P> {
	/// Creates the component's element (named `name`) and appends it to `parent`. Nothing is rendered yet.
	///
	/// `on_define` runs the first time `name` is seen by `registry`, to register the element with the host.
	///
	/// # Errors
	///
	/// [`Error::InvalidVNode`] for an empty name, or host failures.
	#[instrument(skip(reconciler, registry, on_define, render))]
	pub fn mount(
		reconciler: &mut Reconciler<D>,
		registry: &mut ElementRegistry,
		name: impl Into<Cow<'static, str>> + Debug,
		parent: &D::Node,
		on_define: impl FnOnce(&D, &str),
		render: impl 'static + Fn(&P) -> Vec<VNode<D>>,
	) -> Result<Self, D> {
		let name = name.into();
		if name.is_empty() {
			return Err(Error::InvalidVNode {
				reason: "component name is empty",
			});
		}

		if registry.define(&name) {
			trace!("Defining component element.");
			on_define(reconciler.dom(), &name);
		}

		let dom = reconciler.dom();
		let element = dom.create_element(&name, None, None).map_err(Error::dom)?;
		dom.append_child(parent, &element).map_err(Error::dom)?;

		Ok(Self {
			name,
			element,
			render: Box::new(render),
			props: None,
		})
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn element(&self) -> &D::Node {
		&self.element
	}

	/// The props of the last successful render.
	#[must_use]
	pub fn props(&self) -> Option<&P> {
		self.props.as_ref()
	}

	/// Renders `props` into the component's element.
	///
	/// # Errors
	///
	/// Whatever [`Reconciler::reconcile`] fails with. The previous props are kept in that case.
	#[instrument(skip(self, reconciler, props), fields(name = &*self.name))]
	pub fn update(&mut self, reconciler: &mut Reconciler<D>, props: P) -> Result<(), D> {
		let content = (self.render)(&props);
		reconciler.reconcile(&self.element, &content)?;
		self.props = Some(props);
		Ok(())
	}

	/// Renders the current props again. Does nothing before the first [`update`](`Component::update`).
	///
	/// # Errors
	///
	/// Whatever [`Reconciler::reconcile`] fails with.
	pub fn rerender(&mut self, reconciler: &mut Reconciler<D>) -> Result<(), D> {
		match &self.props {
			Some(props) => {
				let content = (self.render)(props);
				reconciler.reconcile(&self.element, &content)
			}
			None => Ok(()),
		}
	}
}

impl<D: Dom, P: Debug> Debug for Component<D, P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("name", &self.name)
			.field("element", &self.element)
			.field("props", &self.props)
			.finish()
	}
}
