use crate::{
	dom::{Dom, NodeKind, HTML_NAMESPACE, SVG_NAMESPACE, SVG_ROOT_TAG},
	error::Error,
	meta::{attach_ref, detach_ref, NodeMeta},
	options::Options,
	vdom::{Element, Forest, Key, Primitive, Ref, VNode},
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::{HashMap, HashSet};
use tracing::{error, info, instrument, trace, trace_span, warn};

pub(crate) type Result<T, D> = core::result::Result<T, Error<<D as Dom>::Error>>;

/// Brings live DOM subtrees in line with virtual node forests.
///
/// A `Reconciler` owns the bookkeeping it needs to diff a node against what was last applied to it
/// (keys, applied props, refs and attached listeners), so the same instance should be used for
/// every pass over a given subtree. Different subtrees may share an instance.
///
/// # Correct Use
///
/// At most one pass may touch a given subtree at a time. Nodes the reconciler did not create are
/// adopted as they are: their attributes are left alone unless a prop of the same name is applied.
///
/// Nodes that leave the tree some other way (removed by the host, or overwritten by a custom
/// element's own rendering) are dropped from the bookkeeping at the end of the next pass, or on
/// [`release_detached`](`Reconciler::release_detached`).
pub struct Reconciler<D: Dom> {
	pub(crate) dom: D,
	pub(crate) options: Options,
	pub(crate) meta: HashMap<D::Node, NodeMeta<D>>,
	/// Root nodes of the trees reconciled into. Tracked nodes outside of these are stale.
	pub(crate) roots: HashSet<D::Node>,
}

impl<D: Dom> Debug for Reconciler<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Reconciler")
			.field("options", &self.options)
			.field("tracked_nodes", &self.meta.len())
			.field("roots", &self.roots.len())
			.finish()
	}
}

impl<D: Dom> Reconciler<D> {
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self::with_options(dom, Options::default())
	}

	#[must_use]
	pub fn with_options(dom: D, options: Options) -> Self {
		Self {
			dom,
			options,
			meta: HashMap::new(),
			roots: HashSet::new(),
		}
	}

	pub fn dom(&self) -> &D {
		&self.dom
	}

	pub fn options(&self) -> &Options {
		&self.options
	}

	/// How many live nodes the reconciler currently keeps bookkeeping for.
	#[must_use]
	pub fn tracked_nodes(&self) -> usize {
		self.meta.len()
	}

	/// Mutates `parent`'s child list in place to match `vnodes`, reusing existing nodes where possible.
	///
	/// # Errors
	///
	/// Fails if a child can't be materialized or the host rejects a mutation.
	/// Mutations applied before the failure remain.
	#[instrument(skip(self, vnodes))]
	pub fn reconcile<'a>(&mut self, parent: &D::Node, vnodes: impl Into<Forest<'a, D>>) -> Result<(), D>
	where
		D: 'a,
	{
		let vnodes = vnodes.into();
		let namespace = inherited_namespace(&self.dom, parent);
		self.roots.insert(self.dom.root_node(parent));
		self.reconcile_children(parent, vnodes.as_slice(), namespace.as_deref(), self.options.get_depth_limit())?;
		self.release_detached();
		info!("Tracked node count/capacity: {}/{}", self.meta.len(), self.meta.capacity());
		Ok(())
	}

	/// Drops the bookkeeping of tracked nodes that are no longer in any tree this reconciler renders into,
	/// releasing their refs and detaching their listeners.
	///
	/// Runs after each [`reconcile`](`Reconciler::reconcile`). Call it directly after removing rendered content by other means
	/// to release it without another pass.
	#[instrument(skip(self))]
	pub fn release_detached(&mut self) {
		let mut live_roots = HashSet::new();
		let mut detached = Vec::new();
		for node in self.meta.keys() {
			let root = self.dom.root_node(node);
			if self.roots.contains(&root) {
				live_roots.insert(root);
			} else {
				detached.push(node.clone());
			}
		}
		self.roots.retain(|root| live_roots.contains(root));

		for node in &detached {
			let meta = match self.meta.remove(node) {
				Some(meta) => meta,
				None => continue,
			};
			if let Some(node_ref) = &meta.node_ref {
				detach_ref(node_ref, node);
			}
			for (event, (_, handle)) in meta.listeners {
				if let Err(error) = self.dom.remove_event_listener(node, &event, handle) {
					warn!(event = event.as_str(), "Failed to detach listener from released node: {}", error);
				}
			}
		}
		if !detached.is_empty() {
			trace!("Released {} detached node(s).", detached.len());
		}
	}

	/// Like [`reconcile`](`Reconciler::reconcile`), but resolves the parent through [`Dom::query_selector`] first.
	///
	/// # Errors
	///
	/// [`Error::MountTargetNotFound`] before any mutation if nothing matches `selector`.
	#[instrument(skip(self, vnodes))]
	pub fn reconcile_selector<'a>(&mut self, selector: &str, vnodes: impl Into<Forest<'a, D>>) -> Result<(), D>
	where
		D: 'a,
	{
		let parent = match self.dom.query_selector(selector) {
			Some(parent) => parent,
			None => {
				error!("Mount target not found.");
				return Err(Error::MountTargetNotFound { selector: selector.to_owned() });
			}
		};
		self.reconcile(&parent, vnodes)
	}

	#[instrument(skip(self, children))]
	pub(crate) fn reconcile_children(&mut self, parent: &D::Node, children: &[VNode<D>], namespace: Option<&str>, depth_limit: usize) -> Result<(), D> {
		// Clearing a child list doesn't descend.
		if depth_limit == 0 && !children.is_empty() {
			error!("Depth limit reached");
			return Err(Error::DepthLimitReached {
				limit: self.options.get_depth_limit(),
			});
		}

		let mut flat = Vec::with_capacity(children.len());
		flatten(children, &mut flat);

		// Index existing children by key. Duplicates resolve to the last one.
		let existing = self.dom.child_nodes(parent);
		let mut keyed = HashMap::<Key, D::Node>::new();
		for node in &existing {
			if let Some(key) = self.key_of(node) {
				if keyed.insert(key.clone(), node.clone()).is_some() {
					warn!("Duplicate key among existing children. The last one wins.");
				}
			}
		}

		let mut wanted = HashSet::<&Key>::with_capacity(flat.len());
		for key in flat.iter().filter_map(|vnode| vnode.key()) {
			if !wanted.insert(key) {
				warn!("Duplicate key among new children. The last one wins.");
			}
		}

		// Prune stale keyed nodes first, so that positional matching below doesn't land on them.
		let stale: Vec<_> = existing
			.iter()
			.filter(|node| self.key_of(node).map_or(false, |key| !wanted.contains(key)))
			.cloned()
			.collect();
		for node in stale {
			let span = trace_span!("Removing stale keyed node", ?node);
			let _enter = span.enter();
			self.remove_node(parent, &node)?;
		}

		for (i, &vnode) in flat.iter().enumerate() {
			let current = self.dom.child_at(parent, i);
			let matched = match vnode.key() {
				Some(key) => keyed.get(key).cloned(),
				// A keyed node sitting here is still wanted elsewhere in this pass, so it isn't up for grabs.
				None => current.clone().filter(|node| !self.is_claimed(node, &wanted)),
			};

			match matched {
				Some(node) => {
					let span = trace_span!("Matched", i, ?node, keyed = vnode.key().is_some());
					let _enter = span.enter();
					if current.as_ref() != Some(&node) {
						trace!("Moving into position.");
						self.dom.insert_before(parent, &node, current.as_ref()).map_err(Error::dom)?;
					}
					self.update_node(parent, &node, vnode, namespace, depth_limit)?;
				}
				None => {
					let span = trace_span!("Creating", i);
					let _enter = span.enter();
					let node = self.materialize_node(vnode, namespace, depth_limit)?;
					self.dom.insert_before(parent, &node, current.as_ref()).map_err(Error::dom)?;
				}
			}
		}

		// Drop surplus unkeyed nodes from the tail.
		let unkeyed_wanted = flat.iter().filter(|vnode| vnode.key().is_none()).count();
		let unkeyed_present: Vec<_> = self.dom.child_nodes(parent).into_iter().filter(|node| self.key_of(node).is_none()).collect();
		let surplus = unkeyed_present.len().saturating_sub(unkeyed_wanted);
		if surplus > 0 {
			trace!("Removing {} surplus unkeyed node(s).", surplus);
		}
		for node in unkeyed_present.iter().rev().take(surplus) {
			self.remove_node(parent, node)?;
		}

		Ok(())
	}

	/// Updates `node` in place to match `vnode`, or replaces it wholesale if it can't be reused.
	#[instrument(skip(self, vnode))]
	fn update_node(&mut self, parent: &D::Node, node: &D::Node, vnode: &VNode<D>, namespace: Option<&str>, depth_limit: usize) -> Result<(), D> {
		match vnode {
			VNode::Primitive(primitive) => self.update_text(parent, node, primitive),

			VNode::Fragment(children) => {
				if self.dom.kind(node) == NodeKind::Fragment {
					self.reconcile_children(node, children, namespace, depth_limit - 1)
				} else {
					self.replace_node(parent, node, vnode, namespace, depth_limit)
				}
			}

			VNode::Element(element) => {
				let reusable = self.dom.kind(node) == NodeKind::Element && self.dom.tag_name(node).map_or(false, |tag| tag.eq_ignore_ascii_case(&element.tag));
				if reusable {
					self.update_element(node, element, namespace, depth_limit)
				} else {
					self.replace_node(parent, node, vnode, namespace, depth_limit)
				}
			}
		}
	}

	/// Text nodes are never edited, only replaced.
	fn update_text(&mut self, parent: &D::Node, node: &D::Node, primitive: &Primitive) -> Result<(), D> {
		let text = primitive.to_string();
		if self.dom.kind(node) == NodeKind::Text && self.dom.text(node).as_deref() == Some(text.as_str()) {
			trace!("Text unchanged.");
			return Ok(());
		}

		if cfg!(feature = "dangerous-logging") {
			trace!("Replacing {:?} with text {:?}.", self.dom.text(node), text);
		} else {
			trace!("Replacing node with text.");
		}
		self.forget_subtree(node)?;
		let text_node = self.dom.create_text(&text).map_err(Error::dom)?;
		self.dom.replace_child(parent, &text_node, node).map_err(Error::dom)?;
		self.dom.release(node);
		Ok(())
	}

	#[instrument(skip(self, element))]
	fn update_element(&mut self, node: &D::Node, element: &Element<D>, namespace: Option<&str>, depth_limit: usize) -> Result<(), D> {
		let old_props = self.meta.get_mut(node).and_then(|meta| meta.props.take());
		let suspended = self.dom.suspend_rendering(node);
		let synced = self.sync_properties_inner(node, &element.props, old_props.as_ref());
		if suspended {
			self.dom.resume_rendering(node);
		}
		synced?;

		self.stamp_key(node, element.key.as_ref())?;
		self.transfer_ref(node, element.node_ref.as_ref());

		match (&element.props.inner_html, &element.children) {
			(None, Some(children)) => {
				let namespace = element_namespace(element, namespace);
				self.reconcile_children(node, children, namespace, depth_limit - 1)
			}
			(Some(_), _) => {
				trace!("Raw HTML set. Leaving children alone.");
				Ok(())
			}
			(None, None) => {
				trace!("No child list. Leaving children alone.");
				Ok(())
			}
		}
	}

	/// Replaces `node` with a freshly materialized `vnode`.
	///
	/// Refs in the old subtree are released before the new node is created, so a ref shared by both ends up on the new node.
	fn replace_node(&mut self, parent: &D::Node, node: &D::Node, vnode: &VNode<D>, namespace: Option<&str>, depth_limit: usize) -> Result<(), D> {
		let span = trace_span!("Replacing mismatching node", ?node);
		let _enter = span.enter();
		self.forget_subtree(node)?;
		let fresh = self.materialize_node(vnode, namespace, depth_limit)?;
		self.dom.replace_child(parent, &fresh, node).map_err(Error::dom)?;
		self.dom.release(node);
		Ok(())
	}

	fn remove_node(&mut self, parent: &D::Node, node: &D::Node) -> Result<(), D> {
		self.dom.remove_child(parent, node).map_err(Error::dom)?;
		self.forget_subtree(node)?;
		self.dom.release(node);
		Ok(())
	}

	/// Releases refs, detaches listeners and drops bookkeeping for `root` and everything below it.
	pub(crate) fn forget_subtree(&mut self, root: &D::Node) -> Result<(), D> {
		let mut pending = vec![root.clone()];
		let mut forgotten = 0_usize;
		while let Some(node) = pending.pop() {
			if let Some(meta) = self.meta.remove(&node) {
				forgotten += 1;
				if let Some(node_ref) = &meta.node_ref {
					detach_ref(node_ref, &node);
				}
				for (event, (_, handle)) in meta.listeners {
					self.dom.remove_event_listener(&node, &event, handle).map_err(Error::dom)?;
				}
			}
			pending.extend(self.dom.child_nodes(&node));
		}
		trace!("Forgot {} tracked node(s).", forgotten);
		Ok(())
	}

	/// Stamps or clears the key and its visible marker attribute.
	pub(crate) fn stamp_key(&mut self, node: &D::Node, key: Option<&Key>) -> Result<(), D> {
		let meta = self.meta.entry(node.clone()).or_default();
		match key {
			Some(key) if meta.key.as_ref() == Some(key) => Ok(()),
			Some(key) => {
				meta.key = Some(key.clone());
				self.dom.set_attribute(node, self.options.get_key_attribute(), &key.to_string()).map_err(Error::dom)
			}
			None => match meta.key.take() {
				Some(_) => self.dom.remove_attribute(node, self.options.get_key_attribute()).map_err(Error::dom),
				None => Ok(()),
			},
		}
	}

	/// Points `node_ref` at `node`, releasing a different ref that pointed there before.
	/// Re-assigning the same ref is a no-op.
	pub(crate) fn transfer_ref(&mut self, node: &D::Node, node_ref: Option<&Ref<D::Node>>) {
		let meta = self.meta.entry(node.clone()).or_default();
		if let (Some(current), Some(node_ref)) = (&meta.node_ref, node_ref) {
			if current.ptr_eq(node_ref) {
				trace!("Ref unchanged.");
				return;
			}
		}

		if let Some(previous) = meta.node_ref.take() {
			trace!("Releasing previous ref.");
			detach_ref(&previous, node);
		}
		if let Some(node_ref) = node_ref {
			trace!("Assigning ref.");
			attach_ref(node_ref, node);
			meta.node_ref = Some(node_ref.clone());
		}
	}

	fn key_of(&self, node: &D::Node) -> Option<&Key> {
		self.meta.get(node).and_then(|meta| meta.key.as_ref())
	}

	fn is_claimed(&self, node: &D::Node, wanted: &HashSet<&Key>) -> bool {
		self.key_of(node).map_or(false, |key| wanted.contains(key))
	}
}

/// Splices fragments (recursively) into the surrounding sequence.
fn flatten<'a, D: Dom>(vnodes: &'a [VNode<D>], flat: &mut Vec<&'a VNode<D>>) {
	for vnode in vnodes {
		match vnode {
			VNode::Fragment(children) => flatten(children, flat),
			VNode::Primitive(_) | VNode::Element(_) => flat.push(vnode),
		}
	}
}

/// The namespace children of `parent` inherit. HTML is the default and isn't propagated explicitly.
fn inherited_namespace<D: Dom>(dom: &D, parent: &D::Node) -> Option<String> {
	dom.namespace(parent).filter(|namespace| namespace != HTML_NAMESPACE)
}

/// An explicit `xmlns` prop wins, then the SVG root tag, then whatever was inherited.
pub(crate) fn element_namespace<'a, D: Dom>(element: &'a Element<D>, inherited: Option<&'a str>) -> Option<&'a str> {
	if let Some(xmlns) = element.props.get_str("xmlns") {
		Some(xmlns)
	} else if element.tag.eq_ignore_ascii_case(SVG_ROOT_TAG) {
		Some(SVG_NAMESPACE)
	} else {
		inherited
	}
}
