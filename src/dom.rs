//! The host DOM abstraction the reconciler mutates.

use crate::vdom::{Listener, PropValue};
use core::{
	fmt::{Debug, Display},
	hash::Hash,
};

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// The tag that switches a subtree into [`SVG_NAMESPACE`].
pub const SVG_ROOT_TAG: &str = "svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	Element,
	Text,
	/// A non-rendering grouping container. Inserting it splices its children instead.
	Fragment,
	/// Comments, documents and anything else the reconciler never reuses.
	Other,
}

/// A live DOM the reconciler can inspect and mutate.
///
/// All methods take `&self`: listeners, refs and custom element reactions may re-enter the host
/// while a reconciliation pass is running, so implementations use interior mutability where needed.
///
/// Node handles must compare and hash by node identity, since the reconciler keeps its
/// per-node bookkeeping in a side table keyed by them.
pub trait Dom: Sized {
	type Node: Clone + Eq + Hash + Debug;
	type Event;
	/// Keeps an attached event listener alive and identifies it for removal.
	type ListenerHandle;
	type Error: Debug + Display;

	fn create_text(&self, text: &str) -> Result<Self::Node, Self::Error>;
	fn create_fragment(&self) -> Result<Self::Node, Self::Error>;
	/// `namespace: None` creates an HTML element.
	/// `is` names a customized built-in element definition.
	fn create_element(&self, tag: &str, namespace: Option<&str>, is: Option<&str>) -> Result<Self::Node, Self::Error>;

	fn kind(&self, node: &Self::Node) -> NodeKind;
	/// Elements only.
	fn tag_name(&self, node: &Self::Node) -> Option<String>;
	/// Elements only.
	fn namespace(&self, node: &Self::Node) -> Option<String>;
	/// Text nodes only.
	fn text(&self, node: &Self::Node) -> Option<String>;

	fn child_nodes(&self, parent: &Self::Node) -> Vec<Self::Node>;

	fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node> {
		self.child_nodes(parent).into_iter().nth(index)
	}

	fn child_count(&self, parent: &Self::Node) -> usize {
		self.child_nodes(parent).len()
	}

	/// The topmost ancestor of `node`, which is `node` itself if it has no parent.
	/// For anything in the document, that's the document.
	fn root_node(&self, node: &Self::Node) -> Self::Node;

	/// Inserts or moves `child` so that it directly precedes `reference`, or appends it if `reference` is [`None`].
	fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) -> Result<(), Self::Error>;

	fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error> {
		self.insert_before(parent, child, None)
	}

	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;
	fn replace_child(&self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node) -> Result<(), Self::Error>;

	/// In document order.
	fn attributes(&self, element: &Self::Node) -> Vec<(String, String)>;
	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error>;
	fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), Self::Error>;

	/// Capability query: whether `element` exposes `name` as a settable property beyond generic string attributes.
	fn has_property(&self, element: &Self::Node, name: &str) -> bool;
	fn set_property(&self, element: &Self::Node, name: &str, value: &PropValue<Self>) -> Result<(), Self::Error>;
	/// Resets `name` to an unset state.
	fn clear_property(&self, element: &Self::Node, name: &str) -> Result<(), Self::Error>;

	fn add_event_listener(&self, element: &Self::Node, event: &str, listener: &Listener<Self::Event>) -> Result<Self::ListenerHandle, Self::Error>;
	fn remove_event_listener(&self, element: &Self::Node, event: &str, handle: Self::ListenerHandle) -> Result<(), Self::Error>;

	/// Overwrites the element's serialized content. Existing children are discarded.
	fn set_inner_html(&self, element: &Self::Node, html: &str) -> Result<(), Self::Error>;

	fn query_selector(&self, selector: &str) -> Option<Self::Node>;

	/// The reconciler removed `node` from its parent and dropped everything it knew about it and its subtree.
	///
	/// Hosts that own their node storage can reclaim the subtree here.
	fn release(&self, node: &Self::Node) {
		let _ = node;
	}

	/// Asks `element` to defer its own rendering while several properties are assigned.
	///
	/// Returns whether the element supports this, in which case [`resume_rendering`](`Dom::resume_rendering`) must follow.
	fn suspend_rendering(&self, element: &Self::Node) -> bool {
		let _ = element;
		false
	}

	fn resume_rendering(&self, element: &Self::Node) {
		let _ = element;
	}
}
