//! Snapshots of existing DOM content as virtual nodes.
//!
//! Useful to adopt pre-rendered markup: render the loaded forest once and the reconciler
//! takes over the existing nodes instead of recreating them.

use crate::{
	dom::{Dom, NodeKind, HTML_NAMESPACE},
	vdom::{Element, VNode},
};
use tracing::{instrument, trace};

/// Loads `parent`'s children, recursively. Comments and other non-element, non-text nodes are skipped.
///
/// Elements come back with their attributes as string props. Listeners, properties and keys aren't
/// visible in the DOM and so aren't recovered.
#[instrument(skip(dom))]
pub fn load_child_nodes<D: Dom>(dom: &D, parent: &D::Node) -> Vec<VNode<D>> {
	dom.child_nodes(parent)
		.iter()
		.filter_map(|child| match dom.kind(child) {
			NodeKind::Element => load_element(dom, child).map(VNode::Element),
			NodeKind::Text => dom.text(child).map(VNode::text),
			NodeKind::Fragment => Some(VNode::Fragment(load_child_nodes(dom, child))),
			NodeKind::Other => {
				trace!(?child, "Skipping unrecognised node.");
				None
			}
		})
		.collect()
}

/// Loads a single element and its content. [`None`] if `element` isn't one.
pub fn load_element<D: Dom>(dom: &D, element: &D::Node) -> Option<Element<D>> {
	let mut tag = dom.tag_name(element)?;
	if dom.namespace(element).as_deref() == Some(HTML_NAMESPACE) {
		tag.make_ascii_lowercase();
	}
	let loaded = dom.attributes(element).into_iter().fold(Element::new(tag), |loaded, (name, value)| loaded.attr(name, value));
	Some(loaded.children(load_child_nodes(dom, element).into_iter().map(Some)))
}
