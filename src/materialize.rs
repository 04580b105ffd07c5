use crate::{
	diff::{element_namespace, Reconciler, Result},
	dom::Dom,
	error::Error,
	vdom::{Element, VNode},
};
use tracing::{error, instrument, trace};

impl<D: Dom> Reconciler<D> {
	/// Creates a detached live subtree for `vnode`.
	///
	/// `namespace` is the inherited element namespace, [`None`] for HTML.
	/// Fragments materialize as fragment nodes, which splice their children on insertion.
	///
	/// The subtree stays tracked while detached, so it can be inserted after further passes.
	///
	/// # Errors
	///
	/// [`Error::InvalidVNode`] for an element descriptor without a usable tag, or host failures.
	pub fn materialize(&mut self, vnode: &VNode<D>, namespace: Option<&str>) -> Result<D::Node, D> {
		let node = self.materialize_node(vnode, namespace, self.options.get_depth_limit())?;
		self.roots.insert(node.clone());
		Ok(node)
	}

	#[instrument(skip(self, vnode))]
	pub(crate) fn materialize_node(&mut self, vnode: &VNode<D>, namespace: Option<&str>, depth_limit: usize) -> Result<D::Node, D> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return Err(Error::DepthLimitReached {
				limit: self.options.get_depth_limit(),
			});
		}

		match vnode {
			VNode::Primitive(primitive) => {
				if cfg!(feature = "dangerous-logging") {
					trace!("Creating text {:?}.", primitive.to_string());
				} else {
					trace!("Creating text.");
				}
				self.dom.create_text(&primitive.to_string()).map_err(Error::dom)
			}

			VNode::Fragment(children) => {
				trace!("Creating fragment with {} child(ren).", children.len());
				let fragment = self.dom.create_fragment().map_err(Error::dom)?;
				for child in children {
					let child = self.materialize_node(child, namespace, depth_limit - 1)?;
					self.dom.append_child(&fragment, &child).map_err(Error::dom)?;
				}
				Ok(fragment)
			}

			VNode::Element(element) => self.materialize_element(element, namespace, depth_limit),
		}
	}

	fn materialize_element(&mut self, element: &Element<D>, namespace: Option<&str>, depth_limit: usize) -> Result<D::Node, D> {
		if element.tag.is_empty() {
			error!("Element descriptor without tag.");
			return Err(Error::InvalidVNode {
				reason: "element descriptor has an empty tag",
			});
		}
		if element.tag.contains(char::is_whitespace) {
			error!("Element tag contains whitespace.");
			return Err(Error::InvalidVNode {
				reason: "element tag contains whitespace",
			});
		}

		let namespace = element_namespace(element, namespace);
		let is = element.props.get_str("is");
		trace!(tag = element.tag.as_ref(), ?namespace, ?is, "Creating element.");
		let node = self.dom.create_element(&element.tag, namespace, is).map_err(Error::dom)?;

		let suspended = self.dom.suspend_rendering(&node);
		let synced = self.sync_properties_inner(&node, &element.props, None);
		if suspended {
			self.dom.resume_rendering(&node);
		}
		synced?;

		self.stamp_key(&node, element.key.as_ref())?;
		self.transfer_ref(&node, element.node_ref.as_ref());

		match (&element.props.inner_html, &element.children) {
			(None, Some(children)) => {
				for child in children {
					let child = self.materialize_node(child, namespace, depth_limit - 1)?;
					self.dom.append_child(&node, &child).map_err(Error::dom)?;
				}
			}
			(Some(_), Some(children)) => trace!("Raw HTML set. Ignoring {} child descriptor(s).", children.len()),
			(_, None) => (),
		}

		Ok(node)
	}
}
