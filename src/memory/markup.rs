//! HTML parsing and serialization, both through html5ever.

use super::{Data, ElementData};
use html5ever::{
	parse_document,
	serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope},
	tendril::TendrilSink as _,
	tree_builder::TreeBuilderOpts,
	LocalName, Namespace, ParseOpts, QualName,
};
use indextree::{Arena, Node as ArenaNode, NodeError, NodeId};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::io;
use tracing::{trace, warn};

/// Parses `html` as the content of a `<body>`.
///
/// Anything the tree builder moves into `<head>` (a leading `<title>` or `<style>`, say) is kept, in front of the rest.
pub(super) fn parse(html: &str) -> Vec<Handle> {
	let opts = ParseOpts {
		tree_builder: TreeBuilderOpts {
			scripting_enabled: false,
			..TreeBuilderOpts::default()
		},
		..ParseOpts::default()
	};
	let dom = parse_document(RcDom::default(), opts).one(html);

	let document = dom.document.children.borrow();
	let content: Vec<Handle> = document
		.iter()
		.filter(|child| matches!(child.data, NodeData::Element { .. }))
		.flat_map(|root| root.children.borrow().clone())
		.flat_map(|section| section.children.borrow().clone())
		.collect();
	trace!("Parsed {} top-level node(s).", content.len());
	content
}

/// Copies parsed `handles` into `arena` as children of `parent`.
///
/// `element` creates the data of each element from its name and attributes.
pub(super) fn append_parsed(
	arena: &mut Arena<Data>,
	parent: NodeId,
	handles: &[Handle],
	element: &dyn Fn(&QualName, Vec<(String, String)>) -> ElementData,
) -> Result<(), NodeError> {
	for handle in handles {
		let data = match &handle.data {
			NodeData::Text { contents } => Data::Text(contents.borrow().to_string()),
			NodeData::Comment { contents } => Data::Comment(contents.to_string()),
			NodeData::Element { name, attrs, .. } => {
				let attributes = attrs.borrow().iter().map(|attribute| (attribute.name.local.to_string(), attribute.value.to_string())).collect();
				Data::Element(element(name, attributes))
			}
			_ => continue,
		};
		let node = arena.new_node(data);
		parent.checked_append(node, arena)?;
		append_parsed(arena, node, &handle.children.borrow(), element)?;
	}
	Ok(())
}

/// Serializes `node`, or only its children unless `include_node`.
pub(super) fn to_html(arena: &Arena<Data>, node: NodeId, include_node: bool) -> String {
	let traversal_scope = if include_node {
		TraversalScope::IncludeNode
	} else {
		// The parent's name decides whether raw text elements escape their content.
		TraversalScope::ChildrenOnly(match arena.get(node).map(ArenaNode::get) {
			Some(Data::Element(data)) => Some(data.qualified_name()),
			_ => None,
		})
	};

	let mut html = Vec::new();
	let opts = SerializeOpts {
		traversal_scope,
		..SerializeOpts::default()
	};
	if let Err(error) = serialize(&mut html, &Markup { arena, node }, opts) {
		warn!(%error, "Serialization failed. Output is truncated.");
	}
	String::from_utf8_lossy(&html).into_owned()
}

struct Markup<'a> {
	arena: &'a Arena<Data>,
	node: NodeId,
}

impl Markup<'_> {
	fn serialize_children<S: Serializer>(&self, serializer: &mut S) -> io::Result<()> {
		for child in self.node.children(self.arena) {
			Markup { arena: self.arena, node: child }.serialize(serializer, TraversalScope::IncludeNode)?;
		}
		Ok(())
	}
}

impl Serialize for Markup<'_> {
	fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
	where
		S: Serializer,
	{
		let include_node = matches!(traversal_scope, TraversalScope::IncludeNode);
		match self.arena.get(self.node).map(ArenaNode::get) {
			Some(Data::Element(data)) if include_node => {
				let name = data.qualified_name();
				let attributes: Vec<(QualName, &str)> = data
					.attributes
					.iter()
					.map(|(name, value)| (QualName::new(None, Namespace::from(""), LocalName::from(name.as_str())), value.as_str()))
					.collect();
				serializer.start_elem(name.clone(), attributes.iter().map(|(name, value)| (name, *value)))?;
				self.serialize_children(serializer)?;
				serializer.end_elem(name)
			}
			Some(Data::Text(text)) if include_node => serializer.write_text(text),
			Some(Data::Comment(comment)) if include_node => serializer.write_comment(comment),
			Some(_) => self.serialize_children(serializer),
			None => Ok(()),
		}
	}
}
