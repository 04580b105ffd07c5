//! Engine-private per-node bookkeeping and the ref lifecycle.

use crate::{
	dom::Dom,
	vdom::{Key, Listener, Props, Ref},
};
use hashbrown::HashMap;
use tracing::trace;

/// What the reconciler remembers about a live node between passes.
pub(crate) struct NodeMeta<D: Dom> {
	/// The key the node was created or last updated with.
	pub key: Option<Key>,
	/// The property bag last applied, diffed against on the next pass.
	pub props: Option<Props<D>>,
	/// The ref currently pointing at this node.
	pub node_ref: Option<Ref<D::Node>>,
	/// Event name to the currently attached listener.
	pub listeners: HashMap<String, (Listener<D::Event>, D::ListenerHandle)>,
}

impl<D: Dom> Default for NodeMeta<D> {
	fn default() -> Self {
		Self {
			key: None,
			props: None,
			node_ref: None,
			listeners: HashMap::new(),
		}
	}
}

/// Points `node_ref` at `node`.
pub(crate) fn attach_ref<N>(node_ref: &Ref<N>, node: &N)
where
	N: Clone,
{
	match node_ref {
		Ref::Callback(callback) => callback(Some(node)),
		Ref::Box(ref_box) => *ref_box.slot().borrow_mut() = Some(node.clone()),
	}
}

/// Releases `node_ref` from `node`.
///
/// Boxes are only cleared while they still point at `node`, so a box that was already handed to
/// a replacement node keeps that node.
pub(crate) fn detach_ref<N>(node_ref: &Ref<N>, node: &N)
where
	N: PartialEq,
{
	match node_ref {
		Ref::Callback(callback) => callback(None),
		Ref::Box(ref_box) => {
			let mut slot = ref_box.slot().borrow_mut();
			if slot.as_ref() == Some(node) {
				*slot = None;
			} else {
				trace!("Ref box was already reassigned. Leaving it.");
			}
		}
	}
}
