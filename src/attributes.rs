//! Attribute, property and listener deltas for a single element.

use crate::{
	diff::{Reconciler, Result},
	dom::{Dom, NodeKind},
	error::Error,
	vdom::{Listener, PropValue, Props},
};
use hashbrown::HashSet;
use tracing::{instrument, trace, warn};

/// Prop names that carry structure rather than element state. They are never applied as attributes or properties.
pub const RESERVED_PROPS: [&str; 4] = ["children", "key", "ref", "dangerouslySetInnerHTML"];

impl<D: Dom> Reconciler<D> {
	/// Applies exactly the delta between `old` and `new` onto `element`, and remembers `new` as its last applied props.
	///
	/// For each prop, in order of precedence:
	///
	/// 1. A callable under the event prefix (`onclick`) is attached as a listener for the remainder of the name,
	///    replacing a different previously attached listener for that event.
	/// 2. A name the element exposes as a settable property is assigned as such.
	/// 3. A string is set as an attribute.
	/// 4. Anything else is assigned as a property.
	///
	/// Props only present in `old` are undone the same way.
	///
	/// # Errors
	///
	/// [`Error::NotAnElement`] if `element` isn't an element, otherwise host failures.
	pub fn sync_properties(&mut self, element: &D::Node, new: &Props<D>, old: &Props<D>) -> Result<(), D> {
		self.sync_properties_inner(element, new, Some(old))
	}

	#[instrument(skip(self, new, old))]
	pub(crate) fn sync_properties_inner(&mut self, element: &D::Node, new: &Props<D>, old: Option<&Props<D>>) -> Result<(), D> {
		if self.dom.kind(element) != NodeKind::Element {
			return Err(Error::NotAnElement);
		}

		let empty = Props::new();
		let old = old.unwrap_or(&empty);

		for (name, value) in new.iter() {
			if RESERVED_PROPS.contains(&name) {
				warn!("Reserved prop {:?} in property bag. Skipping.", name);
				continue;
			}

			let previous = old.get(name);
			if previous == Some(value) {
				continue;
			}

			let event = self.options.event_name(name);
			if let (Some(event), PropValue::Callback(listener)) = (&event, value) {
				match previous {
					None | Some(PropValue::Callback(_)) => (),
					Some(_) if self.dom.has_property(element, name) => {
						trace!(name, "Clearing property replaced by a listener.");
						self.dom.clear_property(element, name).map_err(Error::dom)?
					}
					Some(_) => {
						trace!(name, "Removing attribute replaced by a listener.");
						self.dom.remove_attribute(element, name).map_err(Error::dom)?
					}
				}
				self.bind_listener(element, event, listener)?;
				continue;
			}
			if let (Some(event), Some(PropValue::Callback(_))) = (&event, previous) {
				self.unbind_listener(element, event)?;
			}

			if self.dom.has_property(element, name) {
				trace!(name, "Assigning property.");
				self.dom.set_property(element, name, value).map_err(Error::dom)?;
			} else if let PropValue::String(string) = value {
				if cfg!(feature = "dangerous-logging") {
					trace!(name, value = string.as_str(), "Setting attribute.");
				} else {
					trace!(name, "Setting attribute.");
				}
				self.dom.set_attribute(element, name, string).map_err(Error::dom)?;
			} else {
				trace!(name, "Assigning non-string value as property.");
				self.dom.set_property(element, name, value).map_err(Error::dom)?;
			}
		}

		let retained: HashSet<&str> = new.iter().map(|(name, _)| name).collect();
		for (name, value) in old.iter() {
			if retained.contains(name) || RESERVED_PROPS.contains(&name) {
				continue;
			}

			match (self.options.event_name(name), value) {
				(Some(event), PropValue::Callback(_)) => self.unbind_listener(element, &event)?,
				_ if self.dom.has_property(element, name) => {
					trace!(name, "Clearing property.");
					self.dom.clear_property(element, name).map_err(Error::dom)?
				}
				(_, PropValue::String(_)) => {
					trace!(name, "Removing attribute.");
					self.dom.remove_attribute(element, name).map_err(Error::dom)?
				}
				_ => self.dom.clear_property(element, name).map_err(Error::dom)?,
			}
		}

		if new.inner_html.is_some() || old.inner_html.is_some() {
			// The markup replaces whatever was rendered here before.
			for child in self.dom.child_nodes(element) {
				self.forget_subtree(&child)?;
			}
		}
		match (&new.inner_html, &old.inner_html) {
			(Some(html), _) => {
				trace!("Overwriting inner HTML ({} bytes).", html.len());
				self.dom.set_inner_html(element, html).map_err(Error::dom)?
			}
			(None, Some(_)) => {
				trace!("Clearing inner HTML.");
				self.dom.set_inner_html(element, "").map_err(Error::dom)?
			}
			(None, None) => (),
		}

		self.meta.entry(element.clone()).or_default().props = Some(new.clone());
		Ok(())
	}

	fn bind_listener(&mut self, element: &D::Node, event: &str, listener: &Listener<D::Event>) -> Result<(), D> {
		let meta = self.meta.entry(element.clone()).or_default();
		if let Some((current, _)) = meta.listeners.get(event) {
			if current.ptr_eq(listener) {
				trace!(event, "Listener unchanged.");
				return Ok(());
			}
		}

		if let Some((_, handle)) = meta.listeners.remove(event) {
			trace!(event, "Removing previous listener.");
			self.dom.remove_event_listener(element, event, handle).map_err(Error::dom)?;
		}
		trace!(event, "Adding listener.");
		let handle = self.dom.add_event_listener(element, event, listener).map_err(Error::dom)?;
		meta.listeners.insert(event.to_owned(), (listener.clone(), handle));
		Ok(())
	}

	fn unbind_listener(&mut self, element: &D::Node, event: &str) -> Result<(), D> {
		let removed = self.meta.get_mut(element).and_then(|meta| meta.listeners.remove(event));
		match removed {
			Some((_, handle)) => {
				trace!(event, "Removing listener.");
				self.dom.remove_event_listener(element, event, handle).map_err(Error::dom)
			}
			None => {
				warn!(event, "No listener attached for removed event prop.");
				Ok(())
			}
		}
	}
}
